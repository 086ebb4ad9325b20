//! TLS transport over OpenSSL
//!
//! Client-mode TLS with an explicitly driven handshake: `connect()` is
//! looped on `WANT_READ`/`WANT_WRITE` until it completes or fails for
//! real, waiting for socket readiness between turns. Read and write go
//! through the same retry driver, so renegotiation never surfaces as a
//! spurious failure to the HTTP layer.

use super::retry::{self, Attempt, CancelToken, Want};
use super::transport::{TcpTransport, Transport};
use super::{Error, Result};
use openssl::ssl::{
    ErrorCode, Ssl, SslContext, SslContextBuilder, SslMethod, SslMode, SslStream, SslVerifyMode,
};
use std::io;
use std::net::{Shutdown, TcpStream};
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

/// Process-wide OpenSSL library initialization. Idempotent.
pub fn init() {
    INIT.call_once(openssl::init);
}

/// Client-mode TLS connector holding one `SslContext`
pub struct TlsConnector {
    ctx: SslContext,
}

impl TlsConnector {
    pub fn new() -> Result<Self> {
        init();

        let mut builder = SslContextBuilder::new(SslMethod::tls_client())?;
        builder.set_mode(SslMode::AUTO_RETRY);
        // The API endpoints are fixed and requests carry signed credentials;
        // peer verification is not part of this client's trust model.
        builder.set_verify(SslVerifyMode::NONE);

        Ok(TlsConnector {
            ctx: builder.build(),
        })
    }

    /// Run the client handshake over an already-connected TCP transport.
    ///
    /// An unsuccessful handshake is fatal for this connection attempt;
    /// there is no retry across fresh connections at this layer.
    pub fn handshake(
        &self,
        tcp: TcpTransport,
        host: &str,
        cancel: &CancelToken,
    ) -> Result<TlsTransport> {
        let stream = tcp.into_stream();
        let timeout = stream.read_timeout().ok().flatten();
        let fd = stream.as_raw_fd();

        let mut ssl = Ssl::new(&self.ctx)?;
        ssl.set_hostname(host)?;

        let mut ssl_stream = SslStream::new(ssl, stream)?;

        retry::drive(
            cancel,
            || match ssl_stream.connect() {
                Ok(()) => Ok(Attempt::Done(())),
                Err(e) => match e.code() {
                    ErrorCode::WANT_READ => Ok(Attempt::WantRead),
                    ErrorCode::WANT_WRITE => Ok(Attempt::WantWrite),
                    ErrorCode::ZERO_RETURN => {
                        Err(Error::Handshake("connection closed by peer".to_string()))
                    }
                    ErrorCode::SYSCALL => Err(Error::Handshake(
                        e.io_error()
                            .map(|io| io.to_string())
                            .unwrap_or_else(|| "unexpected end of stream".to_string()),
                    )),
                    _ => Err(Error::Handshake(reason(&e))),
                },
            },
            |want| wait_ready(fd, want, timeout),
        )?;

        Ok(TlsTransport {
            stream: ssl_stream,
            cancel: cancel.clone(),
            timeout,
        })
    }
}

/// TLS-wrapped transport with handshake already completed
pub struct TlsTransport {
    stream: SslStream<TcpStream>,
    cancel: CancelToken,
    timeout: Option<Duration>,
}

impl TlsTransport {
    /// Negotiated protocol version, e.g. "TLSv1.3"
    pub fn version(&self) -> &'static str {
        self.stream.ssl().version_str()
    }
}

impl Transport for TlsTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let fd = self.stream.get_ref().as_raw_fd();
        let timeout = self.timeout;
        let cancel = self.cancel.clone();
        let stream = &mut self.stream;

        retry::drive(
            &cancel,
            || match stream.ssl_read(&mut *buf) {
                Ok(n) => Ok(Attempt::Done(n)),
                Err(e) => match e.code() {
                    ErrorCode::WANT_READ => Ok(Attempt::WantRead),
                    ErrorCode::WANT_WRITE => Ok(Attempt::WantWrite),
                    // Clean close_notify
                    ErrorCode::ZERO_RETURN => Ok(Attempt::Done(0)),
                    // Unclean EOF; the response body is delimited by the
                    // connection anyway, so treat it as end of stream
                    ErrorCode::SYSCALL if e.io_error().is_none() => Ok(Attempt::Done(0)),
                    _ => Err(Error::Tls(reason(&e))),
                },
            },
            |want| wait_ready(fd, want, timeout),
        )
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let fd = self.stream.get_ref().as_raw_fd();
        let timeout = self.timeout;
        let cancel = self.cancel.clone();
        let stream = &mut self.stream;

        retry::drive(
            &cancel,
            || match stream.ssl_write(buf) {
                Ok(n) => Ok(Attempt::Done(n)),
                Err(e) => match e.code() {
                    ErrorCode::WANT_READ => Ok(Attempt::WantRead),
                    ErrorCode::WANT_WRITE => Ok(Attempt::WantWrite),
                    _ => Err(Error::Tls(reason(&e))),
                },
            },
            |want| wait_ready(fd, want, timeout),
        )
    }

    fn close(&mut self) -> Result<()> {
        // close_notify, best effort
        let _ = self.stream.shutdown();

        let tcp = self.stream.get_mut();
        let _ = tcp.shutdown(Shutdown::Write);
        match tcp.shutdown(Shutdown::Read) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Descriptive failure text: library reason string first, then the OS
/// error string, then a generic message.
fn reason(err: &openssl::ssl::Error) -> String {
    if let Some(stack) = err.ssl_error() {
        if let Some(first) = stack.errors().first() {
            if let Some(r) = first.reason() {
                return r.to_string();
            }
        }
    }
    if let Some(io_err) = err.io_error() {
        return io_err.to_string();
    }
    "unexpected TLS error".to_string()
}

/// Wait for the socket to become ready in the wanted direction
fn wait_ready(fd: RawFd, want: Want, timeout: Option<Duration>) -> Result<()> {
    use libc::{poll, pollfd, POLLIN, POLLOUT};

    let mut pfd = pollfd {
        fd,
        events: match want {
            Want::Read => POLLIN,
            Want::Write => POLLOUT,
        },
        revents: 0,
    };

    let timeout_ms = timeout.map(|d| d.as_millis() as i32).unwrap_or(-1);

    let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };

    if result < 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    if result == 0 {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            "timed out waiting for socket readiness",
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey::{PKey, Private};
    use openssl::rsa::Rsa;
    use openssl::x509::{X509, X509Builder, X509NameBuilder};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn self_signed_cert() -> (X509, PKey<Private>) {
        let rsa = Rsa::generate(2048).unwrap();
        let key = PKey::from_rsa(rsa).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, "localhost").unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder
            .set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        builder.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        (builder.build(), key)
    }

    fn spawn_tls_echo(listener: TcpListener) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let (cert, key) = self_signed_cert();
            let mut ctx = SslContextBuilder::new(SslMethod::tls_server()).unwrap();
            ctx.set_certificate(&cert).unwrap();
            ctx.set_private_key(&key).unwrap();
            let ctx = ctx.build();

            let (tcp, _) = listener.accept().unwrap();
            let ssl = Ssl::new(&ctx).unwrap();
            let mut stream = ssl.accept(tcp).unwrap();

            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
        })
    }

    #[test]
    fn test_handshake_and_echo() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = spawn_tls_echo(listener);

        let tcp =
            TcpTransport::connect("127.0.0.1", addr.port(), Duration::from_secs(5)).unwrap();
        let connector = TlsConnector::new().unwrap();
        let cancel = CancelToken::new();
        let mut tls = connector.handshake(tcp, "localhost", &cancel).unwrap();

        assert!(tls.version().starts_with("TLS"));

        let written = tls.write(b"Hello").unwrap();
        assert_eq!(written, 5);

        let mut buf = [0u8; 5];
        let mut got = 0;
        while got < 5 {
            let n = tls.read(&mut buf[got..]).unwrap();
            assert!(n > 0);
            got += n;
        }
        assert_eq!(&buf, b"Hello");

        tls.close().unwrap();
        server.join().unwrap();
    }

    #[test]
    fn test_handshake_against_non_tls_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut tcp, _) = listener.accept().unwrap();
            // Not a TLS server: reply with garbage and hang up
            let mut buf = [0u8; 64];
            let _ = tcp.read(&mut buf);
            let _ = tcp.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n");
        });

        let tcp =
            TcpTransport::connect("127.0.0.1", addr.port(), Duration::from_secs(5)).unwrap();
        let connector = TlsConnector::new().unwrap();
        let result = connector.handshake(tcp, "localhost", &CancelToken::new());

        assert!(matches!(result, Err(Error::Handshake(_))));
        server.join().unwrap();
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
