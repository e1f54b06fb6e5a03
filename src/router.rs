//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A path that exists under
//! some other method answers 405, anything else 404, both as error envelopes.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::envelope;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

pub(crate) enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed,
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting route. Routes are fixed at startup,
    /// so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Routes one request and runs its handler.
    ///
    /// This is the whole per-request path minus socket I/O, which is why tests
    /// call it directly.
    pub async fn handle(&self, mut req: Request) -> Response {
        match self.lookup(req.method, &req.path) {
            Lookup::Found(handler, params) => {
                req.params = params;
                handler.call(req).await
            }
            Lookup::MethodNotAllowed => envelope::error(
                Status::MethodNotAllowed,
                format!("method {} not allowed on {}", req.method, req.path),
            ),
            Lookup::NotFound => {
                envelope::error(Status::NotFound, format!("no route for {}", req.path))
            }
        }
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Lookup {
        if let Some(matched) = self.routes.get(&method).and_then(|tree| tree.at(path).ok()) {
            let handler = Arc::clone(matched.value);
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(handler, params);
        }

        let elsewhere = self.routes.iter()
            .any(|(m, tree)| *m != method && tree.at(path).is_ok());
        if elsewhere { Lookup::MethodNotAllowed } else { Lookup::NotFound }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or("none").to_owned())
    }

    fn router() -> Router {
        Router::new()
            .on(Method::Get, "/api/students/{id}", echo_id)
            .on(Method::Get, "/api/students", |_req: Request| async { "list" })
    }

    #[tokio::test]
    async fn captures_path_params() {
        let res = router().handle(Request::new(Method::Get, "/api/students/42", "")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn static_and_param_routes_coexist() {
        let res = router().handle(Request::new(Method::Get, "/api/students", "")).await;
        assert_eq!(res.body(), b"list");
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let res = router().handle(Request::new(Method::Patch, "/api/students/1", "")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let res = router().handle(Request::new(Method::Get, "/nope", "")).await;
        assert_eq!(res.status_code(), 404);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = router().on(Method::Get, "/api/students/{other}", echo_id);
    }
}
