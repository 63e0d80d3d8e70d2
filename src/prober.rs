//! Liveness probing.
//!
//! The prober does not implement networking. It drives an injected
//! [`NetworkProbe`] collaborator under a hard timeout and maps the outcome
//! onto a [`HealthState`]: success means Alive, failure or timeout means
//! Dead, never Unknown. One attempt per call; callers wanting a retry select
//! again.

use crate::binder::ProxyConfig;
use crate::proxy::HealthState;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

/// External collaborator that attempts a minimal connection or request
/// through the given proxy and reports whether it worked.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn attempt(&self, target: &ProxyConfig, timeout: Duration) -> bool;
}

/// Probe one proxy, bounding the attempt by `timeout`.
pub async fn probe(
    target: &ProxyConfig,
    probe_fn: &dyn NetworkProbe,
    timeout: Duration,
) -> HealthState {
    let verdict = match tokio::time::timeout(timeout, probe_fn.attempt(target, timeout)).await {
        Ok(true) => HealthState::Alive,
        Ok(false) => HealthState::Dead,
        // Timed out: the attempt is abandoned and counted as a failure.
        Err(_) => HealthState::Dead,
    };
    debug!("Probe of {} finished: {:?}", target, verdict);
    verdict
}

/// A [`NetworkProbe`] that issues a GET through the candidate proxy with a
/// dedicated reqwest client and treats any 2xx response as proof of life.
pub struct ReqwestProbe {
    check_url: String,
}

impl ReqwestProbe {
    /// Probe against the given URL, e.g. `https://httpbin.org/ip`.
    pub fn new(check_url: impl Into<String>) -> Self {
        Self {
            check_url: check_url.into(),
        }
    }
}

#[async_trait]
impl NetworkProbe for ReqwestProbe {
    async fn attempt(&self, target: &ProxyConfig, timeout: Duration) -> bool {
        let reqwest_proxy = match target.to_reqwest_proxy() {
            Ok(p) => p,
            Err(_) => return false,
        };
        let client = match reqwest::Client::builder()
            .proxy(reqwest_proxy)
            .timeout(timeout)
            .build()
        {
            Ok(client) => client,
            Err(_) => return false,
        };
        match client.get(&self.check_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
