//! Configuration for the proxy pool.

use std::time::Duration;

/// Configuration for the proxy pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Timeout for a single liveness probe.
    pub probe_timeout: Duration,
    /// How long a Dead verdict is trusted before the record becomes
    /// eligible for re-probing.
    pub dead_retry_window: Duration,
    /// Number of times the middleware retries a request with a different
    /// proxy before giving up.
    pub retry_count: usize,
    /// Maximum requests per second through each individual proxy.
    pub max_requests_per_second: f64,
}

impl PoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfigBuilder::new().build()
    }
}

/// Builder for `PoolConfig`.
pub struct PoolConfigBuilder {
    probe_timeout: Option<Duration>,
    dead_retry_window: Option<Duration>,
    retry_count: Option<usize>,
    max_requests_per_second: Option<f64>,
}

impl PoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            probe_timeout: None,
            dead_retry_window: None,
            retry_count: None,
            max_requests_per_second: None,
        }
    }

    /// Set the timeout for a single liveness probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Set how long a Dead verdict is trusted before re-probing.
    pub fn dead_retry_window(mut self, window: Duration) -> Self {
        self.dead_retry_window = Some(window);
        self
    }

    /// Set the number of times to retry a request with different proxies.
    pub fn retry_count(mut self, count: usize) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Set the maximum requests per second per proxy.
    pub fn max_requests_per_second(mut self, rps: f64) -> Self {
        self.max_requests_per_second = Some(rps);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PoolConfig {
        PoolConfig {
            probe_timeout: self.probe_timeout.unwrap_or(Duration::from_secs(10)),
            dead_retry_window: self.dead_retry_window.unwrap_or(Duration::from_secs(60)),
            retry_count: self.retry_count.unwrap_or(3),
            max_requests_per_second: self.max_requests_per_second.unwrap_or(5.0),
        }
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
