//! Transport layer
//!
//! Duplex byte transports over plain TCP or TLS. Each HTTP exchange opens
//! one transport, uses it for a single request/response cycle, and closes
//! it; there is no pooling or reuse.

pub mod retry;
pub mod tls;
pub mod transport;

pub use retry::CancelToken;
pub use tls::{TlsConnector, TlsTransport};
pub use transport::{TcpTransport, Transport};

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },

    #[error("no usable address for {0}")]
    NoAddress(String),

    #[error("connect to {host} failed: {source}")]
    Connect {
        host: String,
        source: std::io::Error,
    },

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("TLS handshake failed: {0}")]
    Handshake(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("operation cancelled")]
    Cancelled,
}
