//! A lightweight RPC-style router layered on top of [`Handler`](crate::Handler).
//!
//! [`Router`] dispatches `METHOD /path` to an explicitly registered handler,
//! coerces the JSON request body into the shape the handler declared, and
//! answers with a uniform `{isSucceed, message, data}` envelope. It also
//! serves three built-ins without any handler code: `GET /ping`,
//! `GET /favicon.ico`, and `OPTIONS *`.
//!
//! Handlers are registered explicitly - there is no reflection over method
//! names. [`RouterBuilder::register`] is the primitive; [`RouterBuilder::register_named`]
//! is a thin convenience that derives the `/apiName` and `/ApiName` forms
//! from a Rust-style snake_case name.

mod case;
mod favicon;

use crate::{
    http::response::{Handled, Response},
    http::types::{Method, StatusCode},
    server::connection::ConnectionData,
    Request,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Arc,
};

/// The body shape a registered handler expects, used to validate and parse
/// the request body before the handler ever runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// No body is parsed; the handler is invoked directly.
    None,
    /// The body must be a JSON array.
    List,
    /// The body must be a JSON object.
    Map,
    /// The body must be a JSON array; non-object elements are dropped.
    ListOfMap,
}

/// The parsed request body, handed to the handler after shape validation.
#[derive(Debug, Clone)]
pub enum Input {
    /// Matches [`InputShape::None`].
    None,
    /// Matches [`InputShape::List`].
    List(Vec<Value>),
    /// Matches [`InputShape::Map`].
    Map(Map<String, Value>),
    /// Matches [`InputShape::ListOfMap`].
    ListOfMap(Vec<Map<String, Value>>),
}

type RouteFuture<'a> = Pin<Box<dyn Future<Output = Handled> + Send + 'a>>;

/// A boxed, type-erased route handler.
///
/// Registered via a closure that `Box::pin`s an `async move` block - the
/// same pattern used by most trait-object-based async routers, since a
/// generic `Fn(...) -> impl Future` cannot be stored behind a `dyn Fn` when
/// the future borrows from the call's own arguments.
type RouteFn<S> = Arc<dyn for<'a> Fn(&'a mut S, &'a Request, Input, &'a mut Response) -> RouteFuture<'a> + Send + Sync>;

type CertificateVerifier = Arc<dyn Fn(&Request, &mut Response) -> Option<Handled> + Send + Sync>;

/// Builds a [`Router`] by registering routes, then configuring the
/// snake/camel fallback and an optional certificate-verification hook.
///
/// # Examples
/// ```
/// use rpc_web::{router::{RouterBuilder, InputShape}, Method, StatusCode};
///
/// let _router = RouterBuilder::<()>::new()
///     .register(Method::Get, "/hello", InputShape::None, |_, _, _, resp| {
///         Box::pin(async move { resp.reply_text("hello", StatusCode::Ok) })
///     })
///     .build();
/// ```
pub struct RouterBuilder<S: ConnectionData = ()> {
    routes: HashMap<(Method, String), (InputShape, RouteFn<S>)>,
    prefix_routes: Vec<(String, RouteFn<S>)>,
    api_path_prefix: String,
    snake_camel_fallback: bool,
    certificate_verifier: Option<CertificateVerifier>,
}

impl<S: ConnectionData> Default for RouterBuilder<S> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            prefix_routes: Vec::new(),
            api_path_prefix: String::new(),
            snake_camel_fallback: true,
            certificate_verifier: None,
        }
    }
}

impl<S: ConnectionData> RouterBuilder<S> {
    /// Creates an empty builder. Snake/camel fallback is enabled by default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `(method, path)`, expecting a body matching `shape`.
    ///
    /// This is the explicit primitive every other registration helper goes
    /// through. `path` must start with `/`.
    ///
    /// # Panics
    /// Panics in `debug` mode if `(method, path)` is already registered.
    #[inline]
    #[track_caller]
    pub fn register<F>(mut self, method: Method, path: impl Into<String>, shape: InputShape, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut S, &'a Request, Input, &'a mut Response) -> RouteFuture<'a> + Send + Sync + 'static,
    {
        let path = path.into();
        debug_assert!(path.starts_with('/'), "route path must start with '/'");

        let key = (method, path);
        debug_assert!(
            !self.routes.contains_key(&key),
            "route already registered for this method and path"
        );

        self.routes.insert(key, (shape, Arc::new(handler)));
        self
    }

    /// Registers `handler` under both the camelCase and PascalCase forms of
    /// `name` (e.g. `"get_user"` registers `/getUser` and `/GetUser`),
    /// optionally prefixed by [`api_path_prefix`](Self::api_path_prefix).
    ///
    /// Mirrors the convenience a `<method><ApiName>`-named method would have
    /// given via reflection, without any actual reflection: the caller still
    /// names the handler explicitly.
    #[inline]
    pub fn register_named<F>(mut self, method: Method, name: &str, shape: InputShape, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut S, &'a Request, Input, &'a mut Response) -> RouteFuture<'a> + Send + Sync + 'static,
    {
        let camel = case::to_camel(name.as_bytes());
        let pascal = case::to_pascal(&camel);
        let handler: RouteFn<S> = Arc::new(handler);

        let camel_path = format!("{}/{}", self.api_path_prefix, String::from_utf8_lossy(&camel));
        let pascal_path = format!("{}/{}", self.api_path_prefix, String::from_utf8_lossy(&pascal));

        self.routes.insert((method, camel_path), (shape, handler.clone()));
        self.routes.insert((method, pascal_path), (shape, handler));
        self
    }

    /// Sets the path prefix prepended to every subsequent [`register_named`
    /// ](Self::register_named) call (e.g. `"/api"` turns `get_user` into
    /// `/api/getUser`). Does not affect routes already registered.
    #[inline(always)]
    pub fn api_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_path_prefix = prefix.into();
        self
    }

    /// Installs a sub-router: every request whose path starts with `prefix`
    /// is sent to `handler` (with [`Input::None`], unconditionally) instead
    /// of the exact-match table, before the built-ins and before the
    /// snake/camel fallback are tried.
    ///
    /// Mirrors a handler named `session_accepted` in the reflective original.
    #[inline]
    pub fn register_prefix<F>(mut self, prefix: impl Into<String>, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut S, &'a Request, Input, &'a mut Response) -> RouteFuture<'a> + Send + Sync + 'static,
    {
        self.prefix_routes.push((prefix.into(), Arc::new(handler)));
        self
    }

    /// Enables or disables the snake_case -> camelCase fallback lookup
    /// (enabled by default). When enabled, a request path containing `_`
    /// that finds no exact match is retried once, camelCased.
    #[inline(always)]
    pub fn snake_camel_fallback(mut self, enabled: bool) -> Self {
        self.snake_camel_fallback = enabled;
        self
    }

    /// Installs a hook run before routing on every request. If it returns
    /// `Some(Handled)`, that reply is sent and no route is looked up -
    /// intended for TLS peer-certificate verification, but given only
    /// `Request`/`Response` since the crate's `Handler` surface is
    /// transport-agnostic and does not expose the peer certificate to it.
    #[inline]
    pub fn certificate_verifier<F>(mut self, verifier: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> Option<Handled> + Send + Sync + 'static,
    {
        self.certificate_verifier = Some(Arc::new(verifier));
        self
    }

    /// Finalizes the router, pre-rendering the synthetic favicon once.
    #[inline]
    pub fn build(self) -> Router<S> {
        Router {
            routes: self.routes,
            prefix_routes: self.prefix_routes,
            snake_camel_fallback: self.snake_camel_fallback,
            certificate_verifier: self.certificate_verifier,
            favicon: Arc::from(favicon::generate()),
        }
    }
}

/// Dispatches requests to explicitly registered routes by method and path.
///
/// Construct with [`RouterBuilder`], then pass to [`ServerBuilder::handler`
/// ](crate::ServerBuilder::handler) like any other [`Handler`](crate::Handler).
pub struct Router<S: ConnectionData = ()> {
    routes: HashMap<(Method, String), (InputShape, RouteFn<S>)>,
    prefix_routes: Vec<(String, RouteFn<S>)>,
    snake_camel_fallback: bool,
    certificate_verifier: Option<CertificateVerifier>,
    favicon: Arc<[u8]>,
}

impl<S: ConnectionData> Router<S> {
    async fn try_exact(&self, path: &[u8], data: &mut S, request: &Request, response: &mut Response) -> Option<Handled> {
        let key = (request.method(), String::from_utf8_lossy(path).into_owned());
        let (shape, handler) = self.routes.get(&key)?;

        Some(match coerce(*shape, request) {
            Some(input) => handler(data, request, input, response).await,
            None => reply(response, None::<&()>, false, "data error", StatusCode::NotFound),
        })
    }

    fn reply_ping(&self, response: &mut Response) -> Handled {
        let server_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        reply(response, Some(&json!({ "serverTime": server_time })), true, "", StatusCode::Ok)
    }
}

impl<S: ConnectionData> crate::Handler<S> for Router<S> {
    async fn handle(&self, data: &mut S, request: &Request, response: &mut Response) -> Handled {
        if let Some(verifier) = &self.certificate_verifier {
            if let Some(handled) = verifier(request, response) {
                return handled;
            }
        }

        if request.method() == Method::Options {
            return response.reply_options();
        }

        let path = request.url().path();

        if request.method() == Method::Get {
            match path {
                b"/ping" => return self.reply_ping(response),
                b"/favicon.ico" => {
                    return response.reply_image(self.favicon.clone(), "png", StatusCode::Ok)
                }
                _ => {}
            }
        }

        for (prefix, handler) in &self.prefix_routes {
            if path.starts_with(prefix.as_bytes()) {
                return handler(data, request, Input::None, response).await;
            }
        }

        if let Some(handled) = self.try_exact(path, data, request, response).await {
            return handled;
        }

        if self.snake_camel_fallback {
            if let Some(camel) = case::camelize_path(path) {
                if let Some(handled) = self.try_exact(&camel, data, request, response).await {
                    return handled;
                }
            }
        }

        reply(response, None::<&()>, false, "API not found", StatusCode::NotFound)
    }
}

fn coerce(shape: InputShape, request: &Request) -> Option<Input> {
    match shape {
        InputShape::None => Some(Input::None),
        InputShape::List => match serde_json::from_slice(request.body().unwrap_or(b"[]")) {
            Ok(Value::Array(items)) => Some(Input::List(items)),
            _ => None,
        },
        InputShape::Map => match serde_json::from_slice(request.body().unwrap_or(b"{}")) {
            Ok(Value::Object(map)) => Some(Input::Map(map)),
            _ => None,
        },
        InputShape::ListOfMap => match serde_json::from_slice(request.body().unwrap_or(b"[]")) {
            Ok(Value::Array(items)) => Some(Input::ListOfMap(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::Object(m) => Some(m),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => None,
        },
    }
}

/// Serializes `{isSucceed, message, data?}` and sends it as the response body.
///
/// The uniform reply surface a router handler uses to answer a request;
/// `data` is omitted from the JSON entirely when `None`.
pub fn reply<T: Serialize>(
    response: &mut Response,
    data: Option<&T>,
    is_succeed: bool,
    message: impl AsRef<str>,
    code: StatusCode,
) -> Handled {
    #[derive(Serialize)]
    struct Envelope<'a, T> {
        #[serde(rename = "isSucceed")]
        is_succeed: bool,
        message: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<&'a T>,
    }

    response.reply_json_object(
        &Envelope {
            is_succeed,
            message: message.as_ref(),
            data,
        },
        code,
    )
}
