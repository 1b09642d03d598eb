//! UNIX-domain socket transport.
//!
//! Identical wire protocol to TCP - a [`HttpConnection`](super::connection::HttpConnection)
//! driven by a [`UnixStream`](tokio::net::UnixStream) parses and replies exactly like one
//! driven by a [`TcpStream`](tokio::net::TcpStream). The only wrinkle is addressing: a local
//! socket peer has no IP/port, so [`ConnectionFilter`](super::connection::ConnectionFilter)
//! callbacks receive a fixed placeholder [`SocketAddr`] instead.

use super::transport::{Acceptor, Transport};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};
use tokio::net::{UnixListener, UnixStream};

/// Stand-in peer address reported for every connection accepted over a
/// local socket, since `SocketAddr` has no representation for a filesystem
/// path. `0.0.0.0:0` is chosen so it sorts and logs distinctly from any
/// real TCP peer.
pub const LOCAL_PEER_ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

impl Transport for UnixStream {}

/// Acceptor for a UNIX-domain socket listener.
pub struct LocalAcceptor(UnixListener);

impl LocalAcceptor {
    /// Wraps an already-bound [`UnixListener`].
    #[inline]
    pub fn new(listener: UnixListener) -> Self {
        Self(listener)
    }
}

impl Acceptor for LocalAcceptor {
    type Stream = UnixStream;

    #[inline]
    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)> {
        let (stream, _addr) = self.0.accept().await?;
        Ok((stream, LOCAL_PEER_ADDR))
    }

    #[inline]
    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(LOCAL_PEER_ADDR)
    }
}
