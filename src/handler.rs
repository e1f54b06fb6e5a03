//! What the router accepts as a route target.
//!
//! A handler is any `Fn(Request) -> impl Future<Output = impl IntoResponse>`.
//! The router only ever hands a handler the [`Request`], so anything else an
//! endpoint needs has to be captured by the closure itself. The student
//! endpoints take `(Arc<AppState>, Request)`, and `api::with_state` closes
//! over one `Arc<AppState>` to turn each of them into a handler:
//!
//! ```text
//! api::create(state, req)                        async fn, two arguments
//!     with_state(&state, api::create)
//! move |req| api::create(Arc::clone(&state), req)  one argument, a Handler
//!     Router::on(Method::Post, "/api/students", ..)
//! Arc<dyn ErasedHandler>                         stored in the method's tree
//! ```
//!
//! Each request clones the `Arc` once; the store and the validator are never
//! copied. Handlers that need no state, like `health::liveness`, are passed
//! to the router as plain `async fn` items.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The future a stored handler returns, already converted to a [`Response`].
pub(crate) type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe form of [`Handler`] that the router's trees hold.
///
/// Public only because it shows up in [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> ResponseFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// A route target. Sealed; the blanket impl covers closures and `async fn`s.
pub trait Handler: sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod sealed {
    pub trait Sealed {}
}

impl<F, Fut, R> sealed::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Endpoint(self))
    }
}

/// A concrete handler plus the `into_response` step.
struct Endpoint<F>(F);

impl<F, Fut, R> ErasedHandler for Endpoint<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> ResponseFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
