//! Domain Model - Logistics records
//!
//! Typed view of the documents stored in the `scp.logistics` collection.
//! Field names match the synced document schema, so records round-trip
//! unchanged through the replication endpoint.

use serde::{Deserialize, Serialize};

/// A single logistics record: one tracked item moving through the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticsRecord {
    /// Stable item identifier; never changed by updates
    pub item_id: String,
    /// Shipment this item belongs to
    pub shipment_id: String,
    /// RFID tag printed on the package
    pub rfid: String,
    /// Where the shipment originated
    pub origin: String,
    /// Final delivery destination
    pub destination: String,
    /// Current status (data-driven, e.g. "pending", "in_transit", "delivered")
    pub status: String,
    /// Role of the last handler (driver, warehouse, customs, ...)
    pub handler_role: String,
    /// Location of the last handoff
    pub handoff_point: String,
    /// Condition recorded at the last scan
    pub package_condition: String,
    /// ISO-8601 timestamp of the last scan
    pub timestamp: String,
}

/// Queryable fields of a logistics record.
///
/// Used for distinct-value lookups that feed the app's filter dropdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogisticsField {
    Status,
    Origin,
    Destination,
    HandlerRole,
    HandoffPoint,
    PackageCondition,
    ShipmentId,
    Rfid,
}

impl LogisticsField {
    /// JSON path of the field inside a stored document body.
    pub fn json_path(&self) -> &'static str {
        match self {
            LogisticsField::Status => "$.status",
            LogisticsField::Origin => "$.origin",
            LogisticsField::Destination => "$.destination",
            LogisticsField::HandlerRole => "$.handler_role",
            LogisticsField::HandoffPoint => "$.handoff_point",
            LogisticsField::PackageCondition => "$.package_condition",
            LogisticsField::ShipmentId => "$.shipment_id",
            LogisticsField::Rfid => "$.rfid",
        }
    }
}

impl std::fmt::Display for LogisticsField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogisticsField::Status => "status",
            LogisticsField::Origin => "origin",
            LogisticsField::Destination => "destination",
            LogisticsField::HandlerRole => "handler_role",
            LogisticsField::HandoffPoint => "handoff_point",
            LogisticsField::PackageCondition => "package_condition",
            LogisticsField::ShipmentId => "shipment_id",
            LogisticsField::Rfid => "rfid",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogisticsRecord {
        LogisticsRecord {
            item_id: "MED-SUPPLY-001".to_string(),
            shipment_id: "SHP-2024-001".to_string(),
            rfid: "RF-0001".to_string(),
            origin: "Port of Gothenburg".to_string(),
            destination: "Stockholm Warehouse".to_string(),
            status: "in_transit".to_string(),
            handler_role: "driver".to_string(),
            handoff_point: "Terminal 3".to_string(),
            package_condition: "good".to_string(),
            timestamp: "2024-05-01T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = sample();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["item_id"], "MED-SUPPLY-001");
        assert_eq!(json["status"], "in_transit");

        let back: LogisticsRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_field_json_path() {
        assert_eq!(LogisticsField::Status.json_path(), "$.status");
        assert_eq!(LogisticsField::HandlerRole.json_path(), "$.handler_role");
        assert_eq!(LogisticsField::Rfid.json_path(), "$.rfid");
    }

    #[test]
    fn test_field_display() {
        assert_eq!(LogisticsField::HandoffPoint.to_string(), "handoff_point");
        assert_eq!(LogisticsField::ShipmentId.to_string(), "shipment_id");
    }
}
