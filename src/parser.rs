//! Descriptor parsing.
//!
//! Turns a raw proxy descriptor string into a validated [`ProxyRecord`].
//! The accepted grammar is strict:
//!
//! ```text
//! scheme "://" host ":" port [ ":" username ":" password ]
//! ```
//!
//! Ambiguous inputs are rejected rather than guessed at. Parsing is pure and
//! never touches the network.

use crate::error::ParseError;
use crate::proxy::{Credentials, ProxyRecord, Scheme};

/// Parse a single descriptor into a record.
///
/// `max_rps` sets the per-record rate-limiter quota; it has no effect on the
/// grammar. The scheme is matched case-insensitively. The returned record
/// starts in [`HealthState::Unknown`](crate::HealthState::Unknown).
pub fn parse(raw: &str, max_rps: f64) -> Result<ProxyRecord, ParseError> {
    let trimmed = raw.trim();
    let (scheme_part, rest) = trimmed.split_once("://").ok_or(ParseError::UnknownScheme)?;
    let scheme = Scheme::parse(scheme_part).ok_or(ParseError::UnknownScheme)?;

    let segments: Vec<&str> = rest.split(':').collect();

    let host = segments[0];
    if host.is_empty() || host.contains('/') || host.contains('@') {
        return Err(ParseError::MalformedHost);
    }

    if segments.len() < 2 {
        return Err(ParseError::InvalidPort);
    }
    let port: u16 = segments[1].parse().map_err(|_| ParseError::InvalidPort)?;
    if port == 0 {
        return Err(ParseError::InvalidPort);
    }

    let credentials = match segments.len() {
        2 => None,
        4 => {
            let (user, pass) = (segments[2], segments[3]);
            if user.is_empty() || pass.is_empty() {
                return Err(ParseError::IncompleteCredentials);
            }
            Some(Credentials::new(user, pass))
        }
        // Three segments means a lone username; five or more means an
        // unescaped colon inside the password, which the grammar forbids.
        _ => return Err(ParseError::IncompleteCredentials),
    };

    Ok(ProxyRecord::new(
        scheme,
        host.to_string(),
        port,
        credentials,
        trimmed.to_string(),
        max_rps,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RPS: f64 = 5.0;

    fn parse_err(raw: &str) -> ParseError {
        parse(raw, RPS).unwrap_err()
    }

    #[test]
    fn parses_anonymous_descriptor() {
        let rec = parse("http://10.0.0.1:8080", RPS).unwrap();
        assert_eq!(rec.scheme, Scheme::Http);
        assert_eq!(rec.host, "10.0.0.1");
        assert_eq!(rec.port, 8080);
        assert!(rec.credentials.is_none());
        assert_eq!(rec.raw, "http://10.0.0.1:8080");
    }

    #[test]
    fn parses_credentialed_descriptor() {
        let rec = parse("socks5://10.0.0.2:1080:alice:secret", RPS).unwrap();
        assert_eq!(rec.scheme, Scheme::Socks5);
        assert_eq!(rec.host, "10.0.0.2");
        assert_eq!(rec.port, 1080);
        let creds = rec.credentials.unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let rec = parse("SOCKS4://proxy.example.com:1080", RPS).unwrap();
        assert_eq!(rec.scheme, Scheme::Socks4);
    }

    #[test]
    fn parse_then_descriptor_reconstructs_input() {
        for raw in [
            "http://10.0.0.1:8080",
            "https://proxy.example.com:3128",
            "socks5://10.0.0.2:1080:alice:secret",
        ] {
            assert_eq!(parse(raw, RPS).unwrap().descriptor(), raw);
        }
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert_eq!(parse_err("ftp://10.0.0.1:21"), ParseError::UnknownScheme);
        assert_eq!(parse_err("10.0.0.1:8080"), ParseError::UnknownScheme);
    }

    #[test]
    fn rejects_malformed_host() {
        assert_eq!(parse_err("http://:8080"), ParseError::MalformedHost);
        assert_eq!(parse_err("http://user@host:8080"), ParseError::MalformedHost);
    }

    #[test]
    fn rejects_invalid_port() {
        assert_eq!(parse_err("http://10.0.0.1"), ParseError::InvalidPort);
        assert_eq!(parse_err("http://10.0.0.1:abc"), ParseError::InvalidPort);
        assert_eq!(parse_err("http://10.0.0.1:0"), ParseError::InvalidPort);
        assert_eq!(parse_err("http://10.0.0.1:70000"), ParseError::InvalidPort);
    }

    #[test]
    fn rejects_incomplete_credentials() {
        assert_eq!(
            parse_err("http://10.0.0.1:8080:alice"),
            ParseError::IncompleteCredentials
        );
        assert_eq!(
            parse_err("http://10.0.0.1:8080::secret"),
            ParseError::IncompleteCredentials
        );
        assert_eq!(
            parse_err("http://10.0.0.1:8080:alice:se:cret"),
            ParseError::IncompleteCredentials
        );
    }
}
