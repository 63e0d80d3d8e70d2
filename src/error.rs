//! Error types for the rotating-proxy-pool crate.

use crate::proxy::Scheme;
use thiserror::Error;

/// Error returned when a raw proxy descriptor fails validation.
///
/// Parse errors are always recoverable and reported per descriptor; a bad
/// entry in a batch never aborts the rest of the batch.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The scheme segment is missing or not one of http/https/socks4/socks5.
    #[error("unknown or missing proxy scheme")]
    UnknownScheme,
    /// The host segment is empty or otherwise unusable.
    #[error("malformed proxy host")]
    MalformedHost,
    /// The port segment is missing, non-numeric, or outside 1..=65535.
    #[error("invalid proxy port")]
    InvalidPort,
    /// Credential segments are present but do not form a username/password pair.
    #[error("incomplete proxy credentials")]
    IncompleteCredentials,
}

/// Error returned when a record cannot be bound to a client configuration.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BindError {
    /// The target client cannot speak the record's scheme.
    #[error("scheme {0} is not supported by the target client")]
    UnsupportedScheme(Scheme),
}

/// Error returned when no usable proxy is available in the pool.
///
/// Only surfaced by the middleware adapter; the core selection API models
/// this as `None` because an exhausted pool is an ordinary outcome.
#[derive(Debug, Error)]
#[error("No proxy available in pool")]
pub struct NoProxyAvailable;
