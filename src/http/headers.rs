//! Response header dictionary
//!
//! Lookups are case-sensitive and a repeated header name overwrites the
//! earlier value (last write wins). That matches what the rest of this
//! crate needs from API responses; it is deliberately not a general
//! multi-value header map.

use super::MAX_HEADERS;
use std::fmt;

/// Header dictionary, insertion-ordered
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Headers {
            entries: Vec::new(),
        }
    }

    /// Insert a header; an existing entry with the same name is replaced
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
            return;
        }

        if self.entries.len() >= MAX_HEADERS {
            return;
        }
        self.entries.push((name, value));
    }

    /// Look up a header value by exact name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a header is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all headers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Match one `name: value` line. `None` means the line does not look
    /// like a header, which terminates header parsing.
    pub fn parse_line(line: &str) -> Option<(String, String)> {
        let colon = line.find(':')?;
        let name = line[..colon].trim();
        if name.is_empty() {
            return None;
        }
        let value = line[colon + 1..].trim();
        Some((name.to_string(), value.to_string()))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("Content-Length", "11");

        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("Content-Length"), Some("11"));
        assert_eq!(headers.get("Missing"), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), None);
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_duplicate_name_last_write_wins() {
        let mut headers = Headers::new();
        headers.insert("X-Custom", "first");
        headers.insert("X-Custom", "second");

        assert_eq!(headers.get("X-Custom"), Some("second"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_parse_line() {
        let (name, value) = Headers::parse_line("Content-Type: text/html").unwrap();
        assert_eq!(name, "Content-Type");
        assert_eq!(value, "text/html");

        let (name, value) = Headers::parse_line("X-Custom:  padded  ").unwrap();
        assert_eq!(name, "X-Custom");
        assert_eq!(value, "padded");

        assert!(Headers::parse_line("").is_none());
        assert!(Headers::parse_line("no colon here").is_none());
        assert!(Headers::parse_line(": empty name").is_none());
    }

    #[test]
    fn test_max_headers_cap() {
        let mut headers = Headers::new();
        for i in 0..MAX_HEADERS + 10 {
            headers.insert(format!("Header-{}", i), "value");
        }
        assert_eq!(headers.len(), MAX_HEADERS);
    }
}
