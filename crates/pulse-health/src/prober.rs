//! HTTP prober — checks the monitored service and records the outcome.
//!
//! A probe is a plain `GET {path}` over HTTP/1.1. A 2xx response is
//! `good` with no message; any other status is `bad` with
//! `HTTP {code}: {body}`; a connection error or timeout is `bad` with the
//! error text. The timestamp is taken before the request goes out.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use pulse_state::{CheckId, CheckStatus};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::HealthResult;
use crate::recorder::Recorder;

/// Result of a single probe, before it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    pub response_time_ms: u64,
}

/// Probes one target and feeds the recorder.
#[derive(Clone)]
pub struct Prober {
    address: String,
    path: String,
    timeout: Duration,
    recorder: Recorder,
}

impl Prober {
    /// `address` is `host:port`; `path` is the health endpoint, e.g. `/health`.
    pub fn new(
        address: impl Into<String>,
        path: impl Into<String>,
        timeout: Duration,
        recorder: Recorder,
    ) -> Self {
        Self {
            address: address.into(),
            path: path.into(),
            timeout,
            recorder,
        }
    }

    pub fn target(&self) -> String {
        format!("http://{}{}", self.address, self.path)
    }

    /// Probe once and record the result.
    pub async fn probe_once(&self) -> HealthResult<(CheckId, ProbeOutcome)> {
        let timestamp = epoch_millis();
        let outcome = http_probe(&self.address, &self.path, self.timeout).await;
        let id = self.recorder.record_timed(
            outcome.status.as_str(),
            timestamp,
            outcome.message.clone(),
            Some(outcome.response_time_ms),
        )?;
        Ok((id, outcome))
    }

    /// Probe every `interval` until `shutdown` flips.
    ///
    /// A failed write is logged and the next tick proceeds as usual.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(url = %self.target(), ?interval, "prober started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.probe_once().await {
                        Ok((id, outcome)) if outcome.status == CheckStatus::Bad => {
                            warn!(id, detail = outcome.message.as_deref().unwrap_or(""), "probe reported bad");
                        }
                        Ok((id, _)) => debug!(id, "probe ok"),
                        Err(e) => error!(error = %e, "failed to record probe result"),
                    }
                }
                _ = shutdown.changed() => {
                    debug!("prober shutting down");
                    break;
                }
            }
        }
    }
}

/// Perform an HTTP health probe against `address` + `path`.
pub async fn http_probe(address: &str, path: &str, timeout: Duration) -> ProbeOutcome {
    let uri = format!("http://{address}{path}");
    let started = Instant::now();

    let result = tokio::time::timeout(timeout, send_probe(address, &uri)).await;
    let response_time_ms = started.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(Ok((code, _))) if code.is_success() => (CheckStatus::Good, None),
        Ok(Ok((code, body))) => {
            debug!(status = %code, %uri, "health probe non-2xx");
            (CheckStatus::Bad, Some(format!("HTTP {}: {}", code.as_u16(), body)))
        }
        Ok(Err(msg)) => {
            debug!(error = %msg, %uri, "health probe failed");
            (CheckStatus::Bad, Some(msg))
        }
        Err(_) => {
            debug!(%uri, "health probe timed out");
            (
                CheckStatus::Bad,
                Some(format!("timed out after {}ms", timeout.as_millis())),
            )
        }
    };

    ProbeOutcome {
        status,
        message,
        response_time_ms,
    }
}

async fn send_probe(address: &str, uri: &str) -> Result<(http::StatusCode, String), String> {
    let stream = tokio::net::TcpStream::connect(address)
        .await
        .map_err(|e| format!("connect {address}: {e}"))?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| format!("handshake: {e}"))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(uri)
        .header("host", address)
        .header("user-agent", "pulsegrid-prober/0.1")
        .body(Empty::<Bytes>::new())
        .map_err(|e| format!("build request: {e}"))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| format!("request: {e}"))?;
    let code = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| format!("read body: {e}"))?
        .to_bytes();

    Ok((code, String::from_utf8_lossy(&body).into_owned()))
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{HealthLog, MemoryLog};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response per accepted connection.
    async fn canned_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = sock.read(&mut buf).await;
                let resp = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
            }
        });
        addr
    }

    fn prober_for(addr: &str) -> (Prober, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::new());
        let prober = Prober::new(addr, "/health", Duration::from_secs(2), Recorder::new(log.clone()));
        (prober, log)
    }

    #[tokio::test]
    async fn ok_response_is_good() {
        let addr = canned_server("200 OK", "ok").await;
        let outcome = http_probe(&addr, "/health", Duration::from_secs(2)).await;
        assert_eq!(outcome.status, CheckStatus::Good);
        assert_eq!(outcome.message, None);
    }

    #[tokio::test]
    async fn error_response_carries_code_and_body() {
        let addr = canned_server("503 Service Unavailable", "db down").await;
        let outcome = http_probe(&addr, "/health", Duration::from_secs(2)).await;
        assert_eq!(outcome.status, CheckStatus::Bad);
        assert_eq!(outcome.message.as_deref(), Some("HTTP 503: db down"));
    }

    #[tokio::test]
    async fn closed_port_is_bad() {
        let outcome = http_probe("127.0.0.1:1", "/health", Duration::from_millis(200)).await;
        assert_eq!(outcome.status, CheckStatus::Bad);
        assert!(outcome.message.is_some());
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            // Accept and hold the connection without answering.
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let outcome = http_probe(&addr, "/health", Duration::from_millis(100)).await;
        assert_eq!(outcome.status, CheckStatus::Bad);
        assert_eq!(outcome.message.as_deref(), Some("timed out after 100ms"));
    }

    #[tokio::test]
    async fn probe_once_records_outcome() {
        let addr = canned_server("500 Internal Server Error", "boom").await;
        let (prober, log) = prober_for(&addr);

        let before = epoch_millis();
        let (id, outcome) = prober.probe_once().await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Bad);

        let stored = log.recent_descending(1).unwrap();
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].record.message.as_deref(), Some("HTTP 500: boom"));
        assert!(stored[0].record.timestamp >= before);
        assert!(stored[0].record.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn run_loop_records_until_shutdown() {
        let addr = canned_server("200 OK", "ok").await;
        let (prober, log) = prober_for(&addr);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            prober.run(Duration::from_millis(20), rx).await;
        });
        tokio::time::sleep(Duration::from_millis(150)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let recorded = log.recent_descending(100).unwrap();
        assert!(!recorded.is_empty());
        assert!(recorded.iter().all(|c| c.record.status == CheckStatus::Good));
    }

    #[tokio::test]
    async fn run_loop_survives_storage_failure() {
        let addr = canned_server("200 OK", "ok").await;
        let recorder = Recorder::new(Arc::new(crate::log::testing::UnavailableLog));
        let prober = Prober::new(addr, "/health", Duration::from_secs(1), recorder);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            prober.run(Duration::from_millis(20), rx).await;
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        // Still running after several failed writes.
        assert!(!handle.is_finished());
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
