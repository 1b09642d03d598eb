//! rpc_web - an embeddable HTTP/1.1 server with a lightweight RPC routing layer
//!
//! A performance-oriented HTTP server with comprehensive configuration for
//! memory management, connection handling, and transport selection, plus a
//! [`router`] that dispatches requests to typed handlers by method and path
//! without pulling in a full web framework. Designed for internal services
//! and microservices that want fine-grained control over resources and a
//! small, auditable dependency surface.
//!
//! # Protocol & Transport
//!
//! - **HTTP/1.1** request parsing and response writing. Every response is
//!   sent with `connection: close` - there is no keep-alive and no pipelining.
//!   Each accepted connection serves exactly one request.
//! - **Transport-generic**: the same parser and handler dispatch run over
//!   plain TCP ([`TcpAcceptor`]), TLS ([`TlsAcceptor`], via `rustls`), or a
//!   local UNIX-domain socket (`LocalAcceptor`), selected by which [`Acceptor`]
//!   is handed to the builder.
//!
//! # Features
//!
//! ## 🔒 Security & Protection
//! - **Built-in DoS/DDoS protection** - enabled by default, with no performance penalty.
//! - **Fully configurable limits and timeouts** for requests, responses, and connections.
//! - **Custom connection filtering** - implement the [`ConnectionFilter`] trait to
//!   reject unwanted connections before a request is ever parsed.
//! - **Optional mutual TLS** - verify client certificates via [`PeerVerifyMode`].
//!
//! ## 🚀 Performance & Memory
//! - **Zero-allocation steady state** - no memory allocations after server startup.
//! - **Pre-allocated memory for each connection** - linear and transparent scaling.
//!
//! ## 🧭 Routing
//! - **Typed request shapes** - handlers declare whether they expect no body,
//!   a JSON list, a JSON object, or a list of objects; mismatches are rejected
//!   before the handler runs.
//! - **Snake/camel-case tolerant matching** - a route registered as
//!   `get_user` also matches a request path using `getUser`.
//! - **Built-ins** - `/ping`, `/favicon.ico`, and `OPTIONS *` preflight are
//!   answered without any handler code.
//!
//! ## 🏭 Production Ready
//! - **Graceful performance degradation** - automatic 503 responses when overloaded.
//! - [**Custom error format**
//!   ](https://docs.rs/rpc_web/latest/rpc_web/limits/struct.ServerLimits.html#structfield.json_errors) -
//!   structured JSON (with codes/descriptions) or a plain HTTP response.
//! - **Resource protection** - automatic closure of connections exceeding set limits.
//!
//! # Quick Start
//!
//! ## 1. Installation
//!
//! ```toml
//! [dependencies]
//! rpc_web = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## 2. Usage example
//! ```no_run
//! use rpc_web::{Server, TcpAcceptor, Handler, Request, Response, Handled, StatusCode};
//! use tokio::net::TcpListener;
//!
//! struct MyHandler;
//!
//! impl Handler for MyHandler {
//!     async fn handle(&self, _: &mut (), _: &Request, resp: &mut Response) -> Handled {
//!         resp.status(StatusCode::Ok).body("Hello World!")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::builder()
//!         .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
//!         .handler(MyHandler)
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```
//!
//! For routing multiple endpoints through one handler, see [`router`].
//!
//! # Use Cases
//!
//! - **Internal RPC-style APIs** - security-conscious defaults, small surface area
//! - **Resource-constrained environments** - predictable memory usage
//! - **Performance-critical applications** - zero-allocation steady state
pub(crate) mod http {
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod local;
    pub(crate) mod server_impl;
    pub(crate) mod tls;
    pub(crate) mod transport;
}
pub(crate) mod errors;
pub mod limits;
pub mod router;

pub use crate::{
    errors::ConfigError,
    http::{
        query,
        request::Request,
        response::{
            write::{BodyWriter, WriteBuffer},
            Handled, Response,
        },
        types::{Method, StatusCode, Url, Version},
    },
    server::{
        connection::{ConnectionData, ConnectionFilter},
        local::LocalAcceptor,
        server_impl::{Handler, Server, ServerBuilder, ServerHandle},
        tls::{PeerVerifyMode, TlsAcceptor, TlsCredentials},
        transport::{Acceptor, TcpAcceptor, Transport},
    },
};

#[doc(hidden)]
pub fn run_test<F: FnOnce(&Request, &mut Response) -> Handled>(f: F) {
    f(
        &Request::new(&crate::limits::ReqLimits::default()),
        &mut Response::new(&crate::limits::RespLimits::default()),
    );
}

#[doc(hidden)]
#[macro_export]
macro_rules! impt_default_handler {
    ($name:ident) => {
        use rpc_web::{Handled, Handler, Request, Response, StatusCode};
        struct $name;

        // `<()>` to check functionality
        impl Handler<()> for $name {
            async fn handle(&self, _: &mut (), _: &Request, resp: &mut Response) -> Handled {
                resp.status(StatusCode::Ok).body("Hello world!")
            }
        }
    };
}
