//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;

use crate::method::Method;

/// An incoming HTTP request with its body fully buffered.
///
/// The server collects the body before routing, so handlers see a plain byte
/// slice and never touch the hyper body stream.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Builds a request without path parameters. The router fills those in
    /// when it matches a route, which is what lets tests drive a
    /// [`Router`](crate::Router) in-process.
    pub fn new(method: Method, path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.into(),
            body: body.into(),
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Returns a named path parameter.
    ///
    /// For a route `/api/students/{id}`, `req.param("id")` on
    /// `/api/students/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
