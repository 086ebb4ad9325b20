//! Minimal blocking HTTP/1.1 client
//!
//! Each `get`/`post` call is one isolated connect-send-receive-close cycle
//! over a fresh connection: no keep-alive, no pipelining, no redirect
//! following. The response is read to end-of-stream into one buffer and
//! parsed in place (status line, header dictionary, header/body offset),
//! with chunked transfer-encoding decoded on demand.

pub mod chunked;
pub mod client;
pub mod form;
pub mod headers;
pub mod response;
pub mod uri;

pub use client::{ClientConfig, Connector, HttpClient, NetConnector};
pub use form::Form;
pub use headers::Headers;
pub use response::Response;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Net(#[from] crate::net::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("no default port for scheme: {0}")]
    UnknownScheme(String),

    #[error("malformed or missing HTTP status line")]
    BadStatusLine,

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("malformed chunked body: {0}")]
    Chunk(&'static str),

    #[error("connection closed before a response was received")]
    ConnectionClosed,

    #[error("body truncated: received {received} of {expected} bytes")]
    TruncatedBody { expected: usize, received: usize },
}

/// Read buffer size for response reception
pub const READ_CHUNK: usize = 8192;

/// Maximum number of headers per response
pub const MAX_HEADERS: usize = 64;

/// CRLF line ending
pub const CRLF: &str = "\r\n";
