//! Abstraction over the byte stream a [`HttpConnection`](super::connection::HttpConnection)
//! is driven by, and over the listener that produces one.
//!
//! The parsing and response-writing code only ever needs "something
//! readable and writable" - it never needs to know whether that's a raw
//! TCP socket, a TLS session, or a Unix-domain socket. [`Transport`] is that
//! seam; [`Acceptor`] is the matching seam on the listening side, so
//! [`Server`](super::server_impl::Server) can be generic over which kind of
//! listener produced the stream.

use rustls::pki_types::CertificateDer;
use std::{future::Future, io, net::SocketAddr};
use tokio::io::{AsyncRead, AsyncWrite};

/// A connected, bidirectional byte stream a [`HttpConnection`](super::connection::HttpConnection)
/// can read a request from and write a response to.
///
/// Implemented for `TcpStream`, the TLS-wrapped stream in [`tls`](super::tls),
/// and `UnixStream` in [`local`](super::local). [`peer_certificate`](Self::peer_certificate)
/// only ever returns `Some` for a TLS stream whose peer presented a
/// certificate - plain TCP and local sockets always answer `None`.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {
    /// The verified client certificate, if this transport is TLS and the
    /// peer presented one (see `peer_verify_mode` in [`TlsCredentials`](super::tls::TlsCredentials)).
    #[inline]
    fn peer_certificate(&self) -> Option<&CertificateDer<'static>> {
        None
    }
}

impl Transport for tokio::net::TcpStream {}

/// A listener that produces [`Transport`] streams, paired with the peer
/// address each one came from.
///
/// TCP, TLS, and local (Unix-domain) listeners all implement this the same
/// way: accept the next connection, report where it came from. TLS's
/// handshake happens inside `accept` - a client that fails the handshake
/// never produces a stream, so it's indistinguishable from a connection
/// that was never accepted.
pub trait Acceptor: Send + Sync + 'static {
    /// The stream type this acceptor produces once a connection completes.
    type Stream: Transport;

    /// Accepts the next incoming connection.
    fn accept(&self) -> impl Future<Output = io::Result<(Self::Stream, SocketAddr)>> + Send;

    /// The address this acceptor is bound to, reported to [`ConnectionFilter`
    /// ](super::connection::ConnectionFilter) and [`Request`](crate::Request) as
    /// `server_addr`. Local (Unix-domain) acceptors report a placeholder, since a
    /// filesystem path has no `SocketAddr` representation.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Plain TCP acceptor - the default, always-available transport.
pub struct TcpAcceptor(pub(crate) tokio::net::TcpListener);

impl TcpAcceptor {
    /// Wraps an already-bound [`TcpListener`](tokio::net::TcpListener).
    #[inline]
    pub fn new(listener: tokio::net::TcpListener) -> Self {
        Self(listener)
    }
}

impl Acceptor for TcpAcceptor {
    type Stream = tokio::net::TcpStream;

    #[inline]
    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)> {
        self.0.accept().await
    }

    #[inline]
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.0.local_addr()
    }
}
