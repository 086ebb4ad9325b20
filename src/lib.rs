//! Networking core for a desktop Twitter client
//!
//! This crate provides the transport and protocol stack used to talk to the
//! Twitter API: a plain-TCP/TLS transport layer, a minimal blocking HTTP/1.1
//! client, and the three-legged OAuth 1.0a PIN flow layered on top of it.
//!
//! # Architecture
//!
//! The layers depend strictly downward:
//!
//! - `net` — duplex byte transports: `TcpTransport` and `TlsTransport`
//!   behind the `Transport` trait, plus the want-read/want-write retry
//!   driver and cancellation token for TLS I/O.
//! - `http` — one-shot blocking HTTP/1.1 exchanges: URI parsing, request
//!   formatting, response/header parsing, chunked-transfer decoding.
//! - `oauth` — the PIN-based OAuth 1.0a flow (request token, authorization
//!   URL, access-token exchange) built on the HTTP client.
//!
//! Every HTTP call is an isolated connect-send-receive-close cycle; there
//! is no connection reuse and no internal concurrency. Callers that need
//! parallel requests run calls on their own threads.

pub mod http;
pub mod net;
pub mod oauth;
