//! Response buffer parsing
//!
//! A response is the complete byte stream the server sent, parsed in
//! place: the status line fixes the status code, then headers are scanned
//! line-by-line until the first non-header line, which fixes the offset
//! where the body starts. Parsing is tolerant of servers that end lines
//! with bare `\n` instead of `\r\n`.

use super::{chunked, headers::Headers, Error, Result};
use bytes::Bytes;

/// A fully received, parsed HTTP response
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Headers,
    raw: Bytes,
    header_offset: usize,
}

impl Response {
    /// Parse a complete response buffer.
    ///
    /// Fails with `BadStatusLine` unless the buffer starts with
    /// `HTTP/1.0` or `HTTP/1.1` followed by a numeric status code; headers
    /// and body are never exposed for an unparsed response.
    pub fn parse(raw: impl Into<Bytes>) -> Result<Self> {
        let raw = raw.into();
        let status = parse_status_line(&raw)?;
        let (headers, header_offset) = parse_headers(&raw);

        Ok(Response {
            status,
            headers,
            raw,
            header_offset,
        })
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Parsed header dictionary
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Byte position in the raw buffer where the body starts
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    /// The full raw buffer, status line included
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Error unless the buffer holds the full body the `Content-Length`
    /// header promised. A reply without the header always passes; its body
    /// is delimited by the connection instead.
    pub fn require_complete(&self) -> Result<()> {
        if let Some(expected) = self
            .headers
            .get("Content-Length")
            .and_then(|v| v.parse::<usize>().ok())
        {
            let received = self.raw.len() - self.header_offset;
            if received < expected {
                return Err(Error::TruncatedBody { expected, received });
            }
        }
        Ok(())
    }

    /// Body length: `Content-Length` when present and numeric, otherwise
    /// whatever remains after the headers.
    pub fn content_length(&self) -> usize {
        let remaining = self.raw.len() - self.header_offset;
        self.headers
            .get("Content-Length")
            .and_then(|v| v.parse::<usize>().ok())
            .map(|len| len.min(remaining))
            .unwrap_or(remaining)
    }

    /// The response body, with chunked transfer-encoding decoded when the
    /// server used it.
    pub fn body(&self) -> Result<Vec<u8>> {
        let tail = &self.raw[self.header_offset..];

        if let Some(encoding) = self.headers.get("Transfer-Encoding") {
            if encoding.eq_ignore_ascii_case("chunked") {
                return chunked::decode(tail);
            }
        }

        Ok(tail[..self.content_length()].to_vec())
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.body()?).into_owned())
    }
}

fn parse_status_line(raw: &[u8]) -> Result<u16> {
    let line_end = raw
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(raw.len());
    let line = String::from_utf8_lossy(&raw[..line_end]);
    let line = line.trim_end_matches('\r');

    let rest = line
        .strip_prefix("HTTP/1.1 ")
        .or_else(|| line.strip_prefix("HTTP/1.0 "))
        .ok_or(Error::BadStatusLine)?;

    rest.split_whitespace()
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(Error::BadStatusLine)
}

/// Scan headers after the status line. Splits on `\n` and strips a
/// trailing `\r` per line; a blank line is consumed as the separator and
/// the body starts after it. A non-blank line that is not `name: value`
/// also ends the headers, but is left in place as the first body byte.
fn parse_headers(raw: &[u8]) -> (Headers, usize) {
    let mut headers = Headers::new();

    // Skip the status line
    let mut pos = match raw.iter().position(|&b| b == b'\n') {
        Some(i) => i + 1,
        None => return (headers, raw.len()),
    };

    while pos < raw.len() {
        let line_end = raw[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i)
            .unwrap_or(raw.len());

        let line = String::from_utf8_lossy(&raw[pos..line_end]);
        let line = line.trim_end_matches('\r');

        let next = if line_end < raw.len() {
            line_end + 1
        } else {
            raw.len()
        };

        match Headers::parse_line(line) {
            Some((name, value)) => {
                headers.insert(name, value);
                pos = next;
            }
            None => {
                if line.is_empty() {
                    // Separator line, consumed; body starts after it
                    pos = next;
                }
                break;
            }
        }
    }

    (headers, pos)
}
