//! Server-side TLS transport, built on `rustls`/`tokio-rustls`.
//!
//! Wraps a plain [`TcpAcceptor`](super::transport::TcpAcceptor) so that every
//! accepted socket completes a TLS handshake before a [`HttpConnection`
//! ](super::connection::HttpConnection) is ever created for it - a peer that
//! fails the handshake never produces a Session.

use super::transport::{Acceptor, Transport};
use crate::errors::ConfigError;
use rustls::pki_types::CertificateDer;
use std::{io, net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor as RustlsAcceptor;

/// How strictly the server verifies a client's TLS certificate.
///
/// `rustls` enforces a TLS 1.2 floor unconditionally - it does not
/// implement negotiating anything lower - so there is no separate "minimum
/// version" knob here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeerVerifyMode {
    /// Do not request or verify a client certificate. Default.
    #[default]
    None,
    /// Require a client certificate, verified against `ca_certs`.
    Required,
    /// Accept a client certificate if offered and verify it against
    /// `ca_certs`; proceed without one if the client presents none.
    Optional,
}

/// Server certificate, private key, and optional client-verification material.
///
/// Certificates and the private key are PEM-encoded; `ca_certs` entries may
/// be PEM or DER (detected by content).
#[derive(Debug, Clone)]
pub struct TlsCredentials {
    /// PEM-encoded server certificate chain, leaf first.
    pub cert_chain: Vec<u8>,
    /// PEM-encoded private key matching `cert_chain`'s leaf certificate.
    pub private_key: Vec<u8>,
    /// Trusted CA certificates used to verify client certificates.
    /// Ignored when `peer_verify_mode` is `None`.
    pub ca_certs: Vec<Vec<u8>>,
    /// How strictly client certificates are checked.
    pub peer_verify_mode: PeerVerifyMode,
}

impl TlsCredentials {
    fn build_server_config(&self) -> Result<rustls::ServerConfig, ConfigError> {
        // Idempotent: only the first call in a process actually installs anything.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let certs = parse_cert_chain(&self.cert_chain)?;
        let key = parse_private_key(&self.private_key)?;

        let builder = rustls::ServerConfig::builder();

        let config = match self.peer_verify_mode {
            PeerVerifyMode::None => builder
                .with_no_client_auth()
                .with_single_cert(certs, key)
                .map_err(|e| ConfigError::InvalidTlsCredentials(e.to_string()))?,
            PeerVerifyMode::Required | PeerVerifyMode::Optional => {
                let mut roots = rustls::RootCertStore::empty();
                for ca in &self.ca_certs {
                    for cert in parse_cert_chain(ca)? {
                        roots.add(cert).map_err(|e| {
                            ConfigError::InvalidTlsCredentials(format!("invalid CA cert: {e}"))
                        })?;
                    }
                }

                let mut verifier_builder =
                    rustls::server::WebPkiClientVerifier::builder(Arc::new(roots));
                if self.peer_verify_mode == PeerVerifyMode::Optional {
                    verifier_builder = verifier_builder.allow_unauthenticated();
                }
                let verifier = verifier_builder
                    .build()
                    .map_err(|e| ConfigError::InvalidTlsCredentials(e.to_string()))?;

                builder
                    .with_client_cert_verifier(verifier)
                    .with_single_cert(certs, key)
                    .map_err(|e| ConfigError::InvalidTlsCredentials(e.to_string()))?
            }
        };

        Ok(config)
    }
}

fn parse_cert_chain(pem_or_der: &[u8]) -> Result<Vec<CertificateDer<'static>>, ConfigError> {
    if pem_or_der.starts_with(b"-----BEGIN") {
        rustls_pemfile::certs(&mut io::Cursor::new(pem_or_der))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidTlsCredentials(e.to_string()))
    } else {
        Ok(vec![CertificateDer::from(pem_or_der.to_vec())])
    }
}

fn parse_private_key(
    pem_or_der: &[u8],
) -> Result<rustls::pki_types::PrivateKeyDer<'static>, ConfigError> {
    if pem_or_der.starts_with(b"-----BEGIN") {
        rustls_pemfile::private_key(&mut io::Cursor::new(pem_or_der))
            .map_err(|e| ConfigError::InvalidTlsCredentials(e.to_string()))?
            .ok_or_else(|| {
                ConfigError::InvalidTlsCredentials("no private key found in PEM".into())
            })
    } else {
        Ok(rustls::pki_types::PrivateKeyDer::Pkcs8(
            rustls::pki_types::PrivatePkcs8KeyDer::from(pem_or_der.to_vec()),
        ))
    }
}

/// A TLS stream wrapping an accepted TCP socket.
pub struct TlsStream(pub(crate) tokio_rustls::server::TlsStream<TcpStream>);

impl tokio::io::AsyncRead for TlsStream {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::pin::Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl tokio::io::AsyncWrite for TlsStream {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<io::Result<usize>> {
        std::pin::Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::pin::Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<io::Result<()>> {
        std::pin::Pin::new(&mut self.0).poll_shutdown(cx)
    }
}

impl Transport for TlsStream {
    #[inline]
    fn peer_certificate(&self) -> Option<&CertificateDer<'static>> {
        self.0.get_ref().1.peer_certificates()?.first()
    }
}

/// Acceptor that TLS-wraps every TCP connection before handing it back.
///
/// A client that fails the handshake never surfaces from [`accept`
/// ](Acceptor::accept) - the caller's accept loop simply waits for the
/// next connection, matching the transport-agnostic `AcceptLoop` behavior.
pub struct TlsAcceptor {
    listener: TcpListener,
    acceptor: RustlsAcceptor,
}

impl TlsAcceptor {
    /// Builds the `rustls` server configuration from `credentials` and pairs
    /// it with `listener`.
    pub fn new(listener: TcpListener, credentials: &TlsCredentials) -> Result<Self, ConfigError> {
        let config = credentials.build_server_config()?;
        Ok(Self {
            listener,
            acceptor: RustlsAcceptor::from(Arc::new(config)),
        })
    }
}

impl Acceptor for TlsAcceptor {
    type Stream = TlsStream;

    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        let tls_stream = self.acceptor.accept(stream).await?;
        Ok((TlsStream(tls_stream), addr))
    }

    #[inline]
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
