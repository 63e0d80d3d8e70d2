//! # rotating-proxy-pool
//!
//! A rotating proxy pool with health-gated round-robin selection.
//!
//! Raw descriptor strings (`scheme://host:port` or
//! `scheme://host:port:user:pass`, over http/https/socks4/socks5) are parsed
//! into validated records; selection walks the pool in strict rotation order,
//! trusting cached Alive verdicts, skipping recently-dead entries, and
//! probing unknown ones through an injected [`NetworkProbe`] collaborator.
//! A [`ProxyPoolMiddleware`] adapter routes reqwest traffic through the pool.

pub mod binder;
pub mod config;
pub mod error;
pub mod middleware;
pub mod parser;
pub mod pool;
pub mod prober;
pub mod proxy;

pub use binder::{bind, ClientCapabilities, ProxyConfig};
pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::{BindError, NoProxyAvailable, ParseError};
pub use middleware::ProxyPoolMiddleware;
pub use parser::parse;
pub use pool::{ProxyPool, RegistrationReport};
pub use prober::{NetworkProbe, ReqwestProbe};
pub use proxy::{Credentials, HealthState, ProxyRecord, Scheme};
