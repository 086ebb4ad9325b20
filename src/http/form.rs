//! Form-encoded request bodies
//!
//! Ordered key/value pairs serialized as `application/x-www-form-urlencoded`.
//! Escaping uses the RFC 3986 unreserved set (spaces become `%20`, not `+`),
//! which is also what OAuth signing requires.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except ALPHA / DIGIT / "-" / "." / "_" / "~" is escaped
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-escape a string per RFC 3986
pub fn percent_escape(s: &str) -> String {
    utf8_percent_encode(s, RFC3986).to_string()
}

/// Ordered form parameter set
#[derive(Debug, Clone, Default)]
pub struct Form {
    fields: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Form { fields: Vec::new() }
    }

    /// Append a field, keeping insertion order
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize the form body. With `escape` off, values are emitted raw -
    /// for callers that pre-escape their parameters.
    pub fn encode(&self, escape: bool) -> String {
        self.fields
            .iter()
            .map(|(name, value)| {
                if escape {
                    format!("{}={}", percent_escape(name), percent_escape(value))
                } else {
                    format!("{}={}", name, value)
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
