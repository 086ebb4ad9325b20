//! HTTP client
//!
//! One client is bound to a single (host, port, tls) triple. Every call
//! opens a fresh connection, sends the request in one write, reads the
//! reply to end-of-stream, parses it, and closes - success or failure.

use super::{form::Form, response::Response, Error, Result, CRLF, READ_CHUNK};
use crate::net::{CancelToken, TcpTransport, TlsConnector, Transport};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::BytesMut;
use std::io;
use std::time::Duration;

/// Default per-socket timeout for connect, read, and write
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable per-client configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub user_agent: String,
    pub authorization: Option<String>,
    pub auto_escape: bool,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            tls,
            user_agent: concat!("tanager/", env!("CARGO_PKG_VERSION")).to_string(),
            authorization: None,
            auto_escape: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Caller-supplied `Authorization` header value (e.g. a signed OAuth
    /// header)
    pub fn authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// HTTP Basic authorization from a username and password
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        let credentials = BASE64.encode(format!("{}:{}", username, password));
        self.authorization = Some(format!("Basic {}", credentials));
        self
    }

    /// Disable percent-escaping of form fields; values are sent raw
    pub fn raw_form_fields(mut self) -> Self {
        self.auto_escape = false;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Connection factory: the seam between the client's request cycle and
/// the transport layer
pub trait Connector {
    fn connect(&self, config: &ClientConfig) -> Result<Box<dyn Transport>>;
}

/// Real connector: TCP, plus a TLS handshake when the config asks for it
pub struct NetConnector;

impl Connector for NetConnector {
    fn connect(&self, config: &ClientConfig) -> Result<Box<dyn Transport>> {
        let tcp = TcpTransport::connect(&config.host, config.port, config.timeout)?;

        if config.tls {
            let connector = TlsConnector::new().map_err(Error::Net)?;
            let tls = connector.handshake(tcp, &config.host, &CancelToken::new())?;
            Ok(Box::new(tls))
        } else {
            Ok(Box::new(tcp))
        }
    }
}

/// Blocking one-shot HTTP/1.1 client
pub struct HttpClient {
    config: ClientConfig,
    connector: Box<dyn Connector>,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        HttpClient {
            config,
            connector: Box::new(NetConnector),
        }
    }

    /// Build a client with a custom connection factory (used by tests to
    /// substitute a transport double)
    pub fn with_connector(config: ClientConfig, connector: Box<dyn Connector>) -> Self {
        HttpClient { config, connector }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue a GET request for `path` (query string included, if any)
    pub fn get(&self, path: &str) -> Result<Response> {
        self.exchange("GET", path, None)
    }

    /// Issue a POST request with a form-encoded body
    pub fn post(&self, path: &str, form: &Form) -> Result<Response> {
        self.exchange("POST", path, Some(form))
    }

    fn exchange(&self, method: &str, path: &str, form: Option<&Form>) -> Result<Response> {
        let mut conn = self.connector.connect(&self.config)?;
        let result = self.run(conn.as_mut(), method, path, form);
        // Close unconditionally; a close error never masks the exchange result
        let _ = conn.close();
        result
    }

    fn run(
        &self,
        conn: &mut dyn Transport,
        method: &str,
        path: &str,
        form: Option<&Form>,
    ) -> Result<Response> {
        let request = self.format_request(method, path, form);
        write_all(conn, request.as_bytes())?;

        let raw = read_to_end(conn)?;
        let response = Response::parse(raw.freeze())?;
        // A stalled or early-closing server must not pass off a partial
        // body as a complete reply
        response.require_complete()?;
        Ok(response)
    }

    fn format_request(&self, method: &str, path: &str, form: Option<&Form>) -> String {
        let mut text = String::with_capacity(256);

        text.push_str(&format!("{} {} HTTP/1.1{}", method, path, CRLF));
        text.push_str(&format!("User-Agent: {}{}", self.config.user_agent, CRLF));
        text.push_str(&format!("Host: {}{}", self.config.host, CRLF));
        text.push_str(&format!("Accept: */*{}", CRLF));

        if let Some(auth) = &self.config.authorization {
            text.push_str(&format!("Authorization: {}{}", auth, CRLF));
        }

        match form {
            Some(form) => {
                let body = form.encode(self.config.auto_escape);
                text.push_str(&format!(
                    "Content-Type: application/x-www-form-urlencoded{}",
                    CRLF
                ));
                text.push_str(&format!("Content-Length: {}{}", body.len(), CRLF));
                text.push_str(CRLF);
                text.push_str(&body);
            }
            None => text.push_str(CRLF),
        }

        text
    }
}

fn write_all(conn: &mut dyn Transport, mut bytes: &[u8]) -> Result<()> {
    while !bytes.is_empty() {
        let n = conn.write(bytes)?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        bytes = &bytes[n..];
    }
    Ok(())
}

/// Read the full reply until end-of-stream in fixed-size chunks. A socket
/// timeout after some data arrived is treated as the server holding the
/// connection open past the reply.
fn read_to_end(conn: &mut dyn Transport) -> Result<BytesMut> {
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    let mut temp = [0u8; READ_CHUNK];

    loop {
        match conn.read(&mut temp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&temp[..n]),
            Err(crate::net::Error::Io(e))
                if !buf.is_empty()
                    && matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if buf.is_empty() {
        return Err(Error::ConnectionClosed);
    }
    Ok(buf)
}
