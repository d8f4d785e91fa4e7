//! Health Prober
//!
//! Periodic out-of-band reachability check against the primary endpoint,
//! independent of the replication protocol. Runs only while the secondary
//! is active. Any HTTP response counts as success; the status code is not
//! inspected, because reaching the host at all is the question being asked.
//! Failures are logged and the probe keeps its fixed interval indefinitely:
//! endpoint recovery is polled, not pushed.

use crate::replication::controller::ControllerEvent;
use reqwest::Url;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Periodic primary reachability probe, owned by the failover controller.
pub struct HealthProber {
    task: JoinHandle<()>,
}

impl HealthProber {
    /// Begin probing. The first probe fires after one full interval.
    pub(crate) fn start(
        client: reqwest::Client,
        probe_url: Url,
        interval: Duration,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // interval yields immediately on the first tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match client.get(probe_url.clone()).send().await {
                    Ok(response) => {
                        tracing::info!(
                            "primary endpoint reachable url={} status={}",
                            probe_url,
                            response.status()
                        );
                        if events.send(ControllerEvent::ProbeSucceeded).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("primary still unreachable url={}: {}", probe_url, e);
                    }
                }
            }
        });

        Self { task }
    }

    /// Cancel the probe task. Idempotent.
    pub fn stop(&mut self) {
        self.task.abort();
    }

    /// Whether the probe task is still scheduled.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for HealthProber {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_probe_success_sends_event() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        let _prober =
            HealthProber::start(reqwest::Client::new(), url, Duration::from_millis(20), tx);

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("probe should succeed within the timeout")
            .unwrap();
        assert!(matches!(event, ControllerEvent::ProbeSucceeded));
    }

    #[tokio::test]
    async fn test_probe_success_even_on_error_status() {
        // Any HTTP response counts: a 503 still proves the host is reachable.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        let _prober =
            HealthProber::start(reqwest::Client::new(), url, Duration::from_millis(20), tx);

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("probe should succeed within the timeout")
            .unwrap();
        assert!(matches!(event, ControllerEvent::ProbeSucceeded));
    }

    #[tokio::test]
    async fn test_probe_failure_keeps_running() {
        // Unroutable port: every probe fails, no event, task stays alive.
        let (tx, mut rx) = mpsc::channel(8);
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let prober =
            HealthProber::start(reqwest::Client::new(), url, Duration::from_millis(20), tx);

        let outcome = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(outcome.is_err(), "no event expected from a failing probe");
        assert!(prober.is_active());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (tx, _rx) = mpsc::channel(8);
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let mut prober =
            HealthProber::start(reqwest::Client::new(), url, Duration::from_millis(20), tx);

        prober.stop();
        prober.stop();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!prober.is_active());
    }
}
