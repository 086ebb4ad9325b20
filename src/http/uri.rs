//! URI splitting
//!
//! Just enough parsing for API endpoint URLs: scheme, host, and path
//! (which keeps any query string attached). Not a general URI parser.

use super::{Error, Result};

/// A URI split into scheme, host, and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

/// Split a URI into scheme, host, and path.
///
/// The scheme is required and must match the RFC 3986 scheme grammar.
/// Leading slashes after `scheme:` are stripped; the first `/` after the
/// host starts the path. A URI with no path separator at all still parses,
/// with the path defaulting to `/`.
pub fn parse(uri: &str) -> Result<ParsedUri> {
    let colon = uri
        .find(':')
        .ok_or_else(|| Error::InvalidUri(uri.to_string()))?;
    let scheme = &uri[..colon];

    if !is_valid_scheme(scheme) {
        return Err(Error::InvalidUri(uri.to_string()));
    }

    let rest = uri[colon + 1..].trim_start_matches('/');
    let (host, path) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash..]),
        None => (rest, "/"),
    };

    Ok(ParsedUri {
        scheme: scheme.to_string(),
        host: host.to_string(),
        path: path.to_string(),
    })
}

/// Default port for a scheme: 443 for https, 80 for http, no guess
/// for anything else.
pub fn port_for_scheme(scheme: &str) -> Option<u16> {
    match scheme {
        "https" => Some(443),
        "http" => Some(80),
        _ => None,
    }
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_uri() {
        let uri = parse("https://api.example.com/1.1/statuses").unwrap();
        assert_eq!(uri.scheme, "https");
        assert_eq!(uri.host, "api.example.com");
        assert_eq!(uri.path, "/1.1/statuses");
    }

    #[test]
    fn test_parse_no_path_defaults_to_slash() {
        let uri = parse("http://example.com").unwrap();
        assert_eq!(uri.scheme, "http");
        assert_eq!(uri.host, "example.com");
        assert_eq!(uri.path, "/");
    }

    #[test]
    fn test_parse_keeps_query_in_path() {
        let uri = parse("https://api.example.com/oauth/request_token?oauth_nonce=abc").unwrap();
        assert_eq!(uri.path, "/oauth/request_token?oauth_nonce=abc");
    }

    #[test]
    fn test_parse_missing_scheme_fails() {
        assert!(parse("example.com/path").is_err());
        assert!(parse("//example.com/path").is_err());
        assert!(parse("1http://example.com").is_err());
    }

    #[test]
    fn test_port_mapping() {
        assert_eq!(port_for_scheme("https"), Some(443));
        assert_eq!(port_for_scheme("http"), Some(80));
        assert_eq!(port_for_scheme("ftp"), None);
    }
}
