use crate::{
    errors::ErrorKind,
    http::{
        request::Request,
        response::{Handled, Response},
    },
    limits::{ConnLimits, ReqLimits, RespLimits, ServerLimits, WaitStrategy},
    server::connection::{ConnectionData, HttpConnection},
    server::transport::Acceptor,
    ConnectionFilter, Version,
};
use crossbeam::queue::SegQueue;
use std::{
    future::Future,
    marker::{PhantomData, Send, Sync},
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::{
    sync::{watch, Notify},
    task::{yield_now, JoinHandle},
    time::sleep as tokio_sleep,
};

/// A trait for handling HTTP requests and generating responses.
///
/// You can use:
/// - `&self` for shared immutable data (e.g. database connection pool, router configuration)
/// - `&mut S` for connection-specific mutable state (e.g. authentication tokens, session data)
///
/// # Examples
///
/// Basic Request Handler
/// ```
/// use rpc_web::{Handler, Request, Response, Handled, StatusCode};
///
/// struct MyHandler;
///
/// impl Handler for MyHandler {
///     async fn handle(&self, _: &mut (), req: &Request, resp: &mut Response) -> Handled {
///         // Simple echo handler
///         if req.url().target() == b"/echo" {
///             resp.status(StatusCode::Ok).body("Echo response")
///         } else {
///             resp.status(StatusCode::NotFound).body("Not found :(")
///         }
///     }
/// }
/// ```
/// Handler with [`ConnectionData`]
/// ```
/// use rpc_web::{Handler, ConnectionData, Request, Response, Handled, StatusCode};
///
/// struct CountingHandler;
///
/// impl Handler<State> for CountingHandler {
///     async fn handle(&self, data: &mut State, req: &Request, resp: &mut Response) -> Handled {
///         data.request_count += 1;
///
///         resp.status(StatusCode::Ok)
///             .body(format!("Request #{}", data.request_count))
///     }
/// }
///
/// struct State {
///     request_count: usize,
/// }
///
/// impl ConnectionData for State {
///     fn new() -> Self {
///         Self { request_count: 0 }
///     }
///     
///     fn reset(&mut self) {
///         self.request_count = 0;
///     }
/// }
/// ```
pub trait Handler<S = ()>
where
    Self: Sync + Send + 'static,
    S: ConnectionData,
{
    /// Processes an HTTP request and generates a response.
    ///
    /// # Parameters
    ///
    /// - `connection_data`: Mutable reference to connection-specific state
    /// - `req`: Immutable reference to the parsed HTTP request
    /// - `resp`: Mutable response builder for constructing the response
    ///
    /// # Returns
    ///
    /// `Handled` indicating whether the request was fully processed or
    /// requires further handling by other middleware.
    ///
    /// # Errors
    ///
    /// Implementations should handle errors internally and set appropriate
    /// HTTP status codes on the response. Panics will terminate the connection.
    fn handle(
        &self,
        connection_data: &mut S,
        request: &Request,
        response: &mut Response,
    ) -> impl Future<Output = Handled> + Send;
}

/// An HTTP server that processes incoming connections and requests.
///
/// The server uses a pre-allocated connection pool for maximum performance
/// and implements graceful connection handling with configurable limits.
///
/// # Examples
///
/// ```no_run
/// use rpc_web::{Server, TcpAcceptor, Handler, Request, Response, Handled, StatusCode};
/// use tokio::net::TcpListener;
///
/// struct MyHandler;
///
/// impl Handler for MyHandler {
///     async fn handle(&self, _: &mut (), _: &Request, resp: &mut Response) -> Handled {
///         resp.status(StatusCode::Ok).body("Hello world!")
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     Server::builder()
///         .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
///         .handler(MyHandler)
///         .build()
///         .launch()
///         .await
/// }
/// ```
///
/// # Shutdown
///
/// [`launch`](Self::launch) consumes the server and runs until closed. Grab a
/// [`ServerHandle`] via [`handle`](Self::handle) before calling `launch` if
/// another task needs to stop it later:
///
/// ```no_run
/// # rpc_web::impt_default_handler!{ MyStruct }
/// # #[tokio::main]
/// # async fn main() {
/// use tokio::net::TcpListener;
/// use rpc_web::{Server, TcpAcceptor};
///
/// let server = Server::builder()
///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
///     .handler(MyStruct)
///     .build();
///
/// let handle = server.handle();
/// let launched = tokio::spawn(server.launch());
///
/// // ... later, from anywhere holding a clone of `handle` ...
/// handle.close().await;
/// let _ = launched.await;
/// # }
/// ```
pub struct Server<A: Acceptor> {
    acceptor: A,
    stream_queue: StreamQueue<A>,
    error_queue: StreamQueue<A>,
    server_limits: ServerLimits,
    shutdown_rx: watch::Receiver<bool>,
    shared: Arc<Shared>,
}

struct Shared {
    shutdown_tx: watch::Sender<bool>,
    launch_done: Notify,
    launch_finished: AtomicBool,
    closed: AtomicBool,
    workers: tokio::sync::Mutex<Option<Vec<JoinHandle<()>>>>,
}

/// A cloneable handle used to gracefully shut a running [`Server`] down.
///
/// Obtained from [`Server::handle`] before [`Server::launch`] is called -
/// `launch` consumes the `Server`, so the handle is the only way left to
/// signal it from another task.
#[derive(Clone)]
pub struct ServerHandle {
    shared: Arc<Shared>,
}

impl ServerHandle {
    /// Stops the accept loop, waits for it to return (dropping the listener
    /// and unbinding the socket), then waits for every pre-spawned worker
    /// task to finish its current connection and exit.
    ///
    /// Idempotent: calling `close` again, whether concurrently or after it
    /// has already returned, is a no-op.
    pub async fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let _ = self.shared.shutdown_tx.send(true);

        let done = self.shared.launch_done.notified();
        if !self.shared.launch_finished.load(Ordering::Acquire) {
            done.await;
        }

        let handles = self.shared.workers.lock().await.take().unwrap_or_default();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl<A: Acceptor> Server<A> {
    /// Creates a new builder for configuring the server instance.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use tokio::net::TcpListener;
    /// use rpc_web::{Server, TcpAcceptor};
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .build();
    /// # }
    /// ```
    #[inline]
    pub fn builder<H, S>() -> ServerBuilder<A, H, S, ()>
    where
        H: Handler<S>,
        S: ConnectionData,
    {
        ServerBuilder {
            acceptor: None,
            handler: None,
            connection_filter: Arc::new(()),
            _marker: PhantomData,

            server_limits: None,
            request_limits: None,
            response_limits: None,
            connection_limits: None,
        }
    }

    /// Starts the server and begins accepting incoming connections.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use rpc_web::{Server, TcpAcceptor};
    /// use tokio::net::TcpListener;
    ///
    /// Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .build()
    ///     .launch()
    ///     .await
    /// # }
    /// ```
    #[inline]
    pub async fn launch(mut self) {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => break,

                accepted = self.acceptor.accept() => {
                    let Ok(value) = accepted else {
                        continue;
                    };

                    match self.stream_queue.len() < self.server_limits.max_pending_connections {
                        true => self.stream_queue.push(value),
                        false => self.error_queue.push(value),
                    }
                }
            }
        }

        // Dropping `self` below (with it, `self.acceptor`) unbinds the listener.
        self.shared.launch_finished.store(true, Ordering::Release);
        self.shared.launch_done.notify_waiters();
    }

    /// Returns a cloneable handle that can later be used to gracefully shut
    /// this server down. See [Shutdown](#shutdown) on the type docs.
    #[inline]
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shared: self.shared.clone(),
        }
    }

    #[inline]
    async fn get_stream(queue: &StreamQueue<A>, wait: &WaitStrategy) -> (A::Stream, SocketAddr) {
        loop {
            if let Some(value) = queue.pop() {
                return value;
            }

            match wait {
                WaitStrategy::Yield => yield_now().await,
                WaitStrategy::Sleep(time) => tokio_sleep(*time).await,
            }
        }
    }
}

//

/// Builder for configuring and creating [`Server`] instances.
///
/// # Transport
///
/// Generic over [`Acceptor`] - pass a [`TcpAcceptor`](crate::TcpAcceptor),
/// [`TlsAcceptor`](crate::TlsAcceptor), or [`LocalAcceptor`](crate::LocalAcceptor)
/// to [`listener`](Self::listener) depending on which transport the server should speak.
pub struct ServerBuilder<A, H, S = (), F = ()>
where
    A: Acceptor,
    H: Handler<S>,
    S: ConnectionData,
    F: ConnectionFilter,
{
    acceptor: Option<A>,
    handler: Option<Arc<H>>,
    connection_filter: Arc<F>,
    _marker: PhantomData<S>,

    server_limits: Option<ServerLimits>,
    request_limits: Option<ReqLimits>,
    response_limits: Option<RespLimits>,
    connection_limits: Option<ConnLimits>,
}

impl<A, H, S, F> ServerBuilder<A, H, S, F>
where
    A: Acceptor,
    H: Handler<S>,
    S: ConnectionData,
    F: ConnectionFilter,
{
    /// Sets the acceptor (TCP, TLS, or local) that the server will use to accept connections.
    ///
    /// **This is a required component.**
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use tokio::net::TcpListener;
    /// use rpc_web::{Server, TcpAcceptor};
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn listener(mut self, acceptor: A) -> Self {
        self.acceptor = Some(acceptor);
        self
    }

    /// Sets the request handler that will process incoming requests.
    ///
    /// **This is a required component.**
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rpc_web::{Server, TcpAcceptor, Handler, Request, Response, Handled, StatusCode};
    /// use tokio::net::TcpListener;
    ///
    /// struct MyStruct;
    ///
    /// impl Handler for MyStruct {
    ///     async fn handle(&self, _: &mut (), _: &Request, resp: &mut Response) -> Handled {
    ///         resp.status(StatusCode::Ok).body("Hello World!")
    ///     }
    /// }
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct)
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Installs a connection filter to check incoming TCP connections
    /// before using it.
    ///
    /// Allows early rejection of unwanted IP addresses (before the
    /// first read). Can be used for DDoS protection, geobanning, etc.
    ///
    /// For more information, see [ConnectionFilter](crate::ConnectionFilter)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// use tokio::net::TcpListener;
    /// use std::net::SocketAddr;
    /// use rpc_web::{ConnectionFilter, Server, TcpAcceptor};
    ///
    /// struct MyConnFilter {
    ///     blacklist: Vec<SocketAddr>
    /// }
    ///
    /// impl ConnectionFilter for MyConnFilter {
    ///     fn filter(
    ///         &self, client_addr: SocketAddr, _: SocketAddr, err_resp: &mut Response
    ///     ) -> Result<(), Handled> {
    ///         if self.blacklist.contains(&client_addr) {
    ///             Err(err_resp
    ///                 .status(StatusCode::Forbidden)
    ///                 .body(b"Your IP is permanently banned"))
    ///         } else {
    ///             Ok(())
    ///         }
    ///     }
    /// }
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let filter = MyConnFilter {
    ///     blacklist: vec![
    ///         "192.0.2.1".parse().unwrap(),
    ///         "198.51.100.1".parse().unwrap(),
    ///         "203.0.113.1".parse().unwrap(),
    ///         "10.0.0.1".parse().unwrap(),
    ///     ]
    /// };
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .conn_filter(filter)
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn conn_filter<NewF>(self, filter: NewF) -> ServerBuilder<A, H, S, NewF>
    where
        NewF: ConnectionFilter,
    {
        ServerBuilder {
            acceptor: self.acceptor,
            handler: self.handler,
            connection_filter: Arc::new(filter),
            _marker: self._marker,
            server_limits: self.server_limits,
            request_limits: self.request_limits,
            response_limits: self.response_limits,
            connection_limits: self.connection_limits,
        }
    }

    /// Configures request parsing and processing limits.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use rpc_web::{Server, TcpAcceptor, limits::ServerLimits};
    /// use tokio::net::TcpListener;
    /// use std::time::Duration;
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .server_limits(ServerLimits {
    ///         // Your changes
    ///         max_connections: 2500,
    ///         max_pending_connections: 10000,
    ///         ..ServerLimits::default() // Required line
    ///     })
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    /// Configures request parsing and processing limits.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use rpc_web::{Server, TcpAcceptor, limits::ConnLimits};
    /// use tokio::net::TcpListener;
    /// use std::time::Duration;
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .connection_limits(ConnLimits {
    ///         // Your changes
    ///         socket_read_timeout: Duration::from_secs(5),
    ///         socket_write_timeout: Duration::from_secs(2),
    ///         idle_close_timeout: Duration::from_secs(60),
    ///         ..ConnLimits::default() // Required line
    ///     })
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Configures request parsing and processing limits.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use rpc_web::{Server, TcpAcceptor, limits::ReqLimits};
    /// use tokio::net::TcpListener;
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .request_limits(ReqLimits {
    ///         // Your changes
    ///         url_size: 1024,
    ///         url_query_parts: 32,
    ///         url_parts: 20,
    ///         ..ReqLimits::default() // Required line
    ///     })
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Configures response processing limits.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use rpc_web::{Server, TcpAcceptor, limits::RespLimits};
    /// use tokio::net::TcpListener;
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .response_limits(RespLimits {
    ///         // Your changes
    ///         default_capacity: 1024,
    ///         max_capacity: 4096,
    ///         ..RespLimits::default() // Required line
    ///     })
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn response_limits(mut self, limits: RespLimits) -> Self {
        self.response_limits = Some(limits);
        self
    }

    /// Finalizes the builder and constructs a [`Server`] instance.
    ///
    /// # Panics
    ///
    /// Error messages:
    /// - ``The `listener` method must be called to create``
    /// - ``The `handler` method must be called to create``
    ///
    /// Panics when:
    /// - The `listener` method was not called.
    /// - The `handler` method was not called.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # rpc_web::impt_default_handler!{ MyStruct }
    /// # #[tokio::main]
    /// # async fn main() {
    /// use tokio::net::TcpListener;
    /// use rpc_web::{Server, TcpAcceptor};
    ///
    /// let server = Server::builder()
    ///     .listener(TcpAcceptor::new(TcpListener::bind("127.0.0.1:8080").await.unwrap()))
    ///     .handler(MyStruct) // structure with Handler implementation
    ///     .build();
    ///
    /// // Yes, 3 identical examples, for you, in case you suddenly get lost :)
    /// #
    /// # // No, really. Documentation can be difficult for beginners.
    /// # }
    /// ```
    #[inline]
    #[track_caller]
    pub fn build(self) -> Server<A> {
        let (acceptor, handler, filter, limits) = self.get_all_parts();
        let server_addr = acceptor.local_addr().ok();

        let stream_queue = Arc::new(SegQueue::new());
        let error_queue = Arc::new(SegQueue::new());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut worker_handles = Vec::with_capacity(limits.0.max_connections + 1);
        for _ in 0..limits.0.max_connections {
            worker_handles.push(Self::spawn_worker(
                &stream_queue,
                &limits,
                &filter,
                &handler,
                server_addr,
                &shutdown_rx,
            ));
        }
        if limits.0.count_503_handlers != 0 {
            for _ in 0..limits.0.count_503_handlers {
                worker_handles.push(Self::spawn_alarmist(&error_queue, &limits, &shutdown_rx));
            }
        } else {
            worker_handles.push(Self::spawn_quiet_alarmist(&error_queue, &limits, &shutdown_rx));
        }

        let shared = Arc::new(Shared {
            shutdown_tx,
            launch_done: Notify::new(),
            launch_finished: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            workers: tokio::sync::Mutex::new(Some(worker_handles)),
        });

        Server {
            acceptor,
            stream_queue,
            error_queue,
            server_limits: limits.0,
            shutdown_rx,
            shared,
        }
    }

    #[inline]
    fn spawn_worker(
        queue: &StreamQueue<A>,
        limits: &AllLimits,
        filter: &Arc<F>,
        handler: &Arc<H>,
        server_addr: Option<SocketAddr>,
        shutdown_rx: &watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let queue = queue.clone();
        let filter = filter.clone();
        let mut conn = HttpConnection::<H, S, A::Stream>::new(handler.clone(), limits.clone());
        let server_addr = server_addr.unwrap_or_else(|| "0.0.0.0:0".parse().unwrap());
        let mut shutdown_rx = shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                let (mut stream, client_addr) = tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => break,

                    value = Server::<A>::get_stream(&queue, &conn.server_limits.wait_strategy) => value,
                };

                if filter
                    .filter(client_addr, server_addr, &mut conn.response)
                    .is_err()
                    || filter
                        .filter_async(client_addr, server_addr, &mut conn.response)
                        .await
                        .is_err()
                {
                    let _ = conn
                        .conn_limits
                        .write_bytes(&mut stream, conn.response.buffer())
                        .await;

                    conn.response.reset(&conn.resp_limits);
                    continue;
                }

                let _ = conn.run(&mut stream, client_addr, server_addr).await;
            }
        })
    }

    #[inline]
    fn spawn_alarmist(
        queue: &StreamQueue<A>,
        limits: &AllLimits,
        shutdown_rx: &watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let queue = queue.clone();
        let (server_limits, conn_limits, ..) = limits.clone();
        let mut shutdown_rx = shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => break,

                    value = Server::<A>::get_stream(&queue, &server_limits.wait_strategy) => value,
                };

                let _ = conn_limits
                    .send_error(
                        &mut stream,
                        ErrorKind::ServiceUnavailable,
                        Version::Http11,
                        server_limits.json_errors,
                    )
                    .await;
            }
        })
    }

    #[inline]
    fn spawn_quiet_alarmist(
        queue: &StreamQueue<A>,
        limits: &AllLimits,
        shutdown_rx: &watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let queue = queue.clone();
        let (server_limits, ..) = limits.clone();
        let mut shutdown_rx = shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => break,

                    value = Server::<A>::get_stream(&queue, &server_limits.wait_strategy) => value,
                };

                drop(stream);
            }
        })
    }

    #[inline]
    #[track_caller]
    fn get_all_parts(self) -> (A, Arc<H>, Arc<F>, AllLimits) {
        (
            self.acceptor
                .expect("The `listener` method must be called to create"),
            self.handler
                .expect("The `handler` method must be called to create"),
            self.connection_filter,
            (
                self.server_limits.clone().unwrap_or_default(),
                self.connection_limits.clone().unwrap_or_default(),
                self.request_limits
                    .clone()
                    .unwrap_or_default()
                    .precalculate(),
                self.response_limits.clone().unwrap_or_default(),
            ),
        )
    }
}

type StreamQueue<A> = Arc<SegQueue<(<A as Acceptor>::Stream, SocketAddr)>>;
pub(crate) type AllLimits = (ServerLimits, ConnLimits, ReqLimits, RespLimits);

#[cfg(test)]
mod shutdown {
    use super::*;
    use crate::{server::transport::TcpAcceptor, StatusCode};
    use std::time::Duration;
    use tokio::net::TcpListener;

    struct Echo;

    impl Handler for Echo {
        async fn handle(&self, _: &mut (), _: &Request, resp: &mut Response) -> Handled {
            resp.status(StatusCode::Ok).body("ok")
        }
    }

    async fn spawn_test_server() -> (SocketAddr, ServerHandle, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = Server::builder()
            .listener(TcpAcceptor::new(listener))
            .handler(Echo)
            .build();

        let handle = server.handle();
        let launched = tokio::spawn(server.launch());

        (addr, handle, launched)
    }

    #[tokio::test]
    async fn close_unbinds_listener_and_drains_workers() {
        let (addr, handle, launched) = spawn_test_server().await;

        // The listener is live: a second bind to the same address must fail.
        assert!(TcpListener::bind(addr).await.is_err());

        handle.close().await;
        launched.await.unwrap();

        // After close() returns, the address is free again - nothing is
        // listening on it anymore.
        let rebound = TcpListener::bind(addr).await.unwrap();
        drop(rebound);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (_, handle, launched) = spawn_test_server().await;

        let other = handle.clone();
        tokio::join!(handle.close(), other.close());
        handle.close().await;

        launched.await.unwrap();
    }

    #[tokio::test]
    async fn close_times_out_never() {
        let (_, handle, launched) = spawn_test_server().await;

        tokio::time::timeout(Duration::from_secs(5), handle.close())
            .await
            .expect("close() must return promptly once signalled");

        launched.await.unwrap();
    }
}
