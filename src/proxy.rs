//! Proxy record representation and health state.

use governor::{clock::DefaultClock, middleware::NoOpMiddleware, state::{InMemoryState, NotKeyed}, Quota, RateLimiter};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Proxy protocol scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl Scheme {
    /// Parse a scheme name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            "socks4" => Some(Scheme::Socks4),
            "socks5" => Some(Scheme::Socks5),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Socks4 => "socks4",
            Scheme::Socks5 => "socks5",
        }
    }

    /// Whether this is a SOCKS-family scheme.
    pub fn is_socks(&self) -> bool {
        matches!(self, Scheme::Socks4 | Scheme::Socks5)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username/password pair for an authenticated proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Cached liveness verdict for a proxy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// The proxy has not been probed yet, or a negative verdict has expired.
    Unknown,
    /// The most recent probe succeeded.
    Alive,
    /// The most recent probe failed or timed out.
    Dead,
}

/// A parsed, validated proxy entry held in the pool.
///
/// The identity tuple `(scheme, host, port, credentials)` is immutable once
/// the record is created; only `health` and `last_checked` mutate, and only
/// together via [`ProxyRecord::mark`].
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
    /// The original descriptor string, kept for display and logging.
    pub raw: String,
    /// Cached health verdict.
    pub health: HealthState,
    /// Time of the most recent probe or report, if any.
    pub last_checked: Option<Instant>,
    /// Number of successful requests made through this proxy.
    pub success_count: usize,
    /// Number of failed requests made through this proxy.
    pub failure_count: usize,
    /// Rate limiter to control requests per second through this proxy.
    pub limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl ProxyRecord {
    /// Create a new record with the given identity and per-second rate limit.
    pub fn new(
        scheme: Scheme,
        host: String,
        port: u16,
        credentials: Option<Credentials>,
        raw: String,
        max_rps: f64,
    ) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(max_rps.ceil() as u32).unwrap_or(NonZeroU32::new(1).unwrap()),
        );
        Self {
            scheme,
            host,
            port,
            credentials,
            raw,
            health: HealthState::Unknown,
            last_checked: None,
            success_count: 0,
            failure_count: 0,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// The identity tuple used for deduplication and write-back lookup.
    pub fn key(&self) -> (Scheme, &str, u16, Option<&Credentials>) {
        (self.scheme, &self.host, self.port, self.credentials.as_ref())
    }

    /// Canonical descriptor form: `scheme://host:port[:user:pass]`.
    pub fn descriptor(&self) -> String {
        match &self.credentials {
            Some(c) => format!(
                "{}://{}:{}:{}:{}",
                self.scheme, self.host, self.port, c.username, c.password
            ),
            None => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }

    /// Record a fresh health verdict. `health` and `last_checked` always
    /// change together; there is no way to touch one without the other.
    pub fn mark(&mut self, verdict: HealthState, now: Instant) {
        self.health = verdict;
        self.last_checked = Some(now);
    }

    /// The verdict the selector should act on at `now`.
    ///
    /// A stale `Dead` decays to `Unknown` once `dead_retry_window` has
    /// elapsed, so a transient failure does not exile the proxy forever.
    /// A cached `Alive` is trusted until contradicted by a later probe or
    /// request failure.
    pub fn effective_health(&self, dead_retry_window: Duration, now: Instant) -> HealthState {
        match (self.health, self.last_checked) {
            (HealthState::Dead, Some(checked)) if now.duration_since(checked) >= dead_retry_window => {
                HealthState::Unknown
            }
            (state, _) => state,
        }
    }

    /// Fraction of requests through this proxy that succeeded.
    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            return 0.0;
        }
        self.success_count as f64 / total as f64
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(health: HealthState, checked: Option<Instant>) -> ProxyRecord {
        let mut rec = ProxyRecord::new(
            Scheme::Http,
            "10.0.0.1".to_string(),
            8080,
            None,
            "http://10.0.0.1:8080".to_string(),
            5.0,
        );
        rec.health = health;
        rec.last_checked = checked;
        rec
    }

    #[test]
    fn scheme_parse_is_case_insensitive() {
        assert_eq!(Scheme::parse("SOCKS5"), Some(Scheme::Socks5));
        assert_eq!(Scheme::parse("Http"), Some(Scheme::Http));
        assert_eq!(Scheme::parse("ftp"), None);
    }

    #[test]
    fn mark_updates_health_and_timestamp_together() {
        let mut rec = record(HealthState::Unknown, None);
        let now = Instant::now();
        rec.mark(HealthState::Alive, now);
        assert_eq!(rec.health, HealthState::Alive);
        assert_eq!(rec.last_checked, Some(now));
    }

    #[test]
    fn dead_verdict_decays_to_unknown_after_window() {
        let window = Duration::from_secs(60);
        let checked = Instant::now();
        let rec = record(HealthState::Dead, Some(checked));

        assert_eq!(rec.effective_health(window, checked), HealthState::Dead);
        assert_eq!(
            rec.effective_health(window, checked + Duration::from_secs(61)),
            HealthState::Unknown
        );
    }

    #[test]
    fn alive_verdict_never_decays() {
        let checked = Instant::now();
        let rec = record(HealthState::Alive, Some(checked));
        assert_eq!(
            rec.effective_health(Duration::from_secs(60), checked + Duration::from_secs(3600)),
            HealthState::Alive
        );
    }

    #[test]
    fn descriptor_round_trips_credentials() {
        let rec = ProxyRecord::new(
            Scheme::Socks5,
            "10.0.0.2".to_string(),
            1080,
            Some(Credentials::new("alice", "secret")),
            "socks5://10.0.0.2:1080:alice:secret".to_string(),
            5.0,
        );
        assert_eq!(rec.descriptor(), "socks5://10.0.0.2:1080:alice:secret");
    }

    #[test]
    fn success_rate_handles_zero_requests() {
        let rec = record(HealthState::Unknown, None);
        assert_eq!(rec.success_rate(), 0.0);
    }
}
