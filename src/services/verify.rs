//! Remote instance verification.
//!
//! The deployment polls a central endpoint on a fixed interval asking
//! whether this instance may serve updates. The pipeline consults the
//! cached answer on every update. Any polling failure flips the gate to
//! "not allowed" (fail closed); there is no backoff beyond the interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::VerifyConfig;

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    allowed: bool,
    #[serde(default)]
    reason: Option<String>,
}

pub struct VerifyGate {
    http: reqwest::Client,
    config: VerifyConfig,
    allowed: AtomicBool,
    last_reason: Mutex<Option<String>>,
}

impl VerifyGate {
    pub fn new(http: reqwest::Client, config: VerifyConfig) -> Self {
        Self {
            http,
            config,
            // Not allowed until the first successful poll.
            allowed: AtomicBool::new(false),
            last_reason: Mutex::new(None),
        }
    }

    /// A gate that is always open, for deployments without a verifier.
    pub fn always_allowed() -> Self {
        let gate = Self::new(
            reqwest::Client::new(),
            VerifyConfig {
                url: String::new(),
                instance_id: None,
                interval_secs: 0,
            },
        );
        gate.allowed.store(true, Ordering::Relaxed);
        gate
    }

    pub fn allowed(&self) -> bool {
        self.allowed.load(Ordering::Relaxed)
    }

    pub fn last_reason(&self) -> Option<String> {
        self.last_reason.lock().clone()
    }

    /// Ask the verifier once and update the cached gate state.
    pub async fn poll_once(&self) -> Result<bool> {
        let body = json!({ "instance_id": self.config.instance_id });
        let response: VerifyResponse = self
            .http
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .context("verification request failed")?
            .error_for_status()?
            .json()
            .await
            .context("verification response malformed")?;

        self.allowed.store(response.allowed, Ordering::Relaxed);
        *self.last_reason.lock() = response.reason;
        Ok(response.allowed)
    }

    /// Poll forever on the configured interval. Failures close the gate.
    pub fn spawn_loop(self: Arc<Self>) {
        if self.config.interval_secs == 0 {
            return;
        }
        let interval = Duration::from_secs(self.config.interval_secs);
        tokio::spawn(async move {
            loop {
                match self.poll_once().await {
                    Ok(true) => info!("Instance verification: allowed"),
                    Ok(false) => warn!(
                        "Instance verification: denied ({})",
                        self.last_reason().unwrap_or_else(|| "no reason".to_string())
                    ),
                    Err(e) => {
                        self.allowed.store(false, Ordering::Relaxed);
                        warn!("Instance verification poll failed, gate closed: {:#}", e);
                    }
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_starts_closed() {
        let gate = VerifyGate::new(
            reqwest::Client::new(),
            VerifyConfig {
                url: "http://localhost/verify".to_string(),
                instance_id: Some("test".to_string()),
                interval_secs: 60,
            },
        );
        assert!(!gate.allowed());
    }

    #[test]
    fn test_always_allowed_gate() {
        assert!(VerifyGate::always_allowed().allowed());
    }

    #[tokio::test]
    async fn test_failed_poll_closes_gate() {
        let gate = VerifyGate::new(
            // Unroutable; the request fails fast enough for a unit test.
            reqwest::Client::builder()
                .timeout(Duration::from_millis(200))
                .build()
                .unwrap(),
            VerifyConfig {
                url: "http://127.0.0.1:1/verify".to_string(),
                instance_id: None,
                interval_secs: 60,
            },
        );
        assert!(gate.poll_once().await.is_err());
        assert!(!gate.allowed());
    }
}
