//! Response rule types.

use axum::extract::Request;
use axum::response::Response;
use futures_util::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Caller-supplied request handler.
///
/// Receives the live request and fully controls the reply. Cloning is cheap,
/// all clones share the same closure.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>);

impl Handler {
    /// Wrap an async closure as a handler.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self(Arc::new(move |req| f(req).boxed()))
    }

    /// Run the handler against a request.
    pub async fn call(&self, req: Request) -> Response {
        (self.0)(req).await
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Canned response written by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticResponse {
    /// HTTP status code, `0` leaves the server default (200)
    pub status: u16,
    /// Value of the `Content-Type` header, written even when empty
    pub content_type: String,
    /// Response payload
    pub body: String,
    /// Extra response headers; only the first value of each is sent.
    /// Names differing only in case collide, the lexicographically last one wins.
    pub headers: HashMap<String, Vec<String>>,
}

/// How a matched rule produces its reply.
#[derive(Debug, Clone)]
pub enum Responder {
    Static(StaticResponse),
    Delegated(Handler),
}

/// Mock response rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Uppercase HTTP method, matched exactly
    pub method: String,
    /// URL path, matched exactly
    pub path: String,
    /// Raw query string; empty matches any query
    pub query: String,
    /// Reply produced when the rule matches
    pub response: Responder,
}

impl Rule {
    /// Rule answering `method path` with an empty default response.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: String::new(),
            response: Responder::Static(StaticResponse::default()),
        }
    }

    /// Restrict the rule to an exact raw query string.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn status(self, status: u16) -> Self {
        self.with_static(|resp| resp.status = status)
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.with_static(|resp| resp.content_type = content_type)
    }

    pub fn body(self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.with_static(|resp| resp.body = body)
    }

    /// Append a value for a response header.
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.with_static(|resp| resp.headers.entry(name).or_default().push(value))
    }

    /// Delegate the whole reply to `handler`.
    ///
    /// Static fields set before are discarded, those set after are ignored.
    pub fn handler(mut self, handler: Handler) -> Self {
        self.response = Responder::Delegated(handler);
        self
    }

    /// Static response of this rule, if it has one.
    pub fn static_response(&self) -> Option<&StaticResponse> {
        match &self.response {
            Responder::Static(resp) => Some(resp),
            Responder::Delegated(_) => None,
        }
    }

    // Static setters are ignored once the rule is delegated.
    fn with_static(mut self, f: impl FnOnce(&mut StaticResponse)) -> Self {
        if let Responder::Static(resp) = &mut self.response {
            f(resp);
        }
        self
    }
}
