//! Plain TCP transport
//!
//! `Transport` is the seam between the HTTP layer and the wire: the same
//! request/response code runs over a plain socket or a TLS session without
//! knowing which one it has.

use super::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Duplex byte transport over one open connection
pub trait Transport {
    /// Read available bytes into `buf`, returning 0 at end of stream
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write bytes from `buf`, returning the number written
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Shut the connection down
    fn close(&mut self) -> Result<()>;
}

/// Plain TCP transport
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to `host:port`.
    ///
    /// Resolver candidates are tried sequentially; the first successful
    /// connect wins. The socket gets keep-alive and read/write timeouts
    /// before connecting. Failures here are fatal for the attempt - no
    /// retry happens at this layer.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addrs = (host, port).to_socket_addrs().map_err(|e| Error::Resolve {
            host: host.to_string(),
            source: e,
        })?;

        let mut last_err = None;
        for addr in addrs {
            match Self::connect_addr(addr, timeout) {
                Ok(stream) => return Ok(TcpTransport { stream }),
                Err(e) => last_err = Some(e),
            }
        }

        match last_err {
            Some(source) => Err(Error::Connect {
                host: host.to_string(),
                source,
            }),
            None => Err(Error::NoAddress(host.to_string())),
        }
    }

    fn connect_addr(addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_keepalive(true)?;
        socket.set_read_timeout(Some(timeout))?;
        socket.set_write_timeout(Some(timeout))?;
        socket.connect_timeout(&addr.into(), timeout)?;
        // connect_timeout leaves the socket non-blocking
        socket.set_nonblocking(false)?;
        Ok(socket.into())
    }

    /// Wrap an already-connected stream
    pub fn from_stream(stream: TcpStream) -> Self {
        TcpTransport { stream }
    }

    /// Get a reference to the underlying stream
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Consume the transport and return the underlying stream
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        // Output side first, best effort
        let _ = self.stream.shutdown(Shutdown::Write);
        match self.stream.shutdown(Shutdown::Read) {
            Ok(()) => Ok(()),
            // Peer already hung up; the socket closes on drop regardless
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_connect_and_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"Hello").unwrap();
        });

        let mut transport =
            TcpTransport::connect("127.0.0.1", addr.port(), Duration::from_secs(2)).unwrap();

        let mut buf = [0u8; 5];
        let n = transport.read(&mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"Hello");

        transport.close().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port that is very likely closed
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = TcpTransport::connect("127.0.0.1", port, Duration::from_millis(500));
        assert!(matches!(result, Err(Error::Connect { .. })));
    }

    #[test]
    fn test_resolve_failure() {
        let result = TcpTransport::connect(
            "no-such-host.invalid",
            80,
            Duration::from_millis(500),
        );
        assert!(matches!(result, Err(Error::Resolve { .. })));
    }

    #[test]
    fn test_close_after_peer_hangup() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut transport =
            TcpTransport::connect("127.0.0.1", addr.port(), Duration::from_secs(2)).unwrap();
        handle.join().unwrap();

        let mut buf = [0u8; 8];
        while transport.read(&mut buf).unwrap_or(0) > 0 {}

        // Must not surface the peer's hangup as a close error
        assert!(transport.close().is_ok());
    }
}
