//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C (or a caller-supplied shutdown future) the server:
//! 1. Stops calling `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to finish its in-flight request and close.
//! 3. Waits up to the grace period (5 s by default) for them, then aborts
//!    whatever is still running and returns from [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::envelope;
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::router::Router;
use crate::status::Status;

/// How long in-flight connections get to finish after a shutdown signal.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Largest request body the server buffers. Student payloads are tiny.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    grace: Duration,
    max_body: usize,
}

impl Server {
    /// Binds to `addr` (`host:port`, host names are resolved).
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), students_api::Error> {
    /// use students_api::Server;
    /// let server = Server::bind("localhost:8082").await?;
    /// # Ok(()) }
    /// ```
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self::from_listener(TcpListener::bind(addr).await?))
    }

    /// Serves on an already bound listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listener, grace: DEFAULT_GRACE_PERIOD, max_body: DEFAULT_MAX_BODY_BYTES }
    }

    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Bodies longer than `bytes` are answered with a 400 envelope and never
    /// reach a handler.
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns after SIGTERM or Ctrl-C once connections have drained or the
    /// grace period ran out.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let Server { listener, grace, max_body } = self;
        let addr = listener.local_addr()?;
        let router = Arc::new(router);

        info!(%addr, "server listening");

        // Flipped once on shutdown; every connection task holds a receiver.
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let stop = stop_rx.clone();
                    tasks.spawn(serve_connection(TokioIo::new(stream), peer, router, max_body, stop));
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        // Receivers only go away with their tasks; a send error just means
        // there are none left.
        let _ = stop_tx.send(true);

        let drained = tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = tasks.len(),
                grace_secs = grace.as_secs_f64(),
                "grace period elapsed, aborting open connections"
            );
            tasks.shutdown().await;
        }

        info!("server stopped");
        Ok(())
    }
}

// ── Connections ───────────────────────────────────────────────────────────────

async fn serve_connection(
    io: TokioIo<tokio::net::TcpStream>,
    peer: SocketAddr,
    router: Arc<Router>,
    max_body: usize,
    mut stop: watch::Receiver<bool>,
) {
    // Called once per request on the connection.
    let svc = service_fn(move |req| {
        let router = Arc::clone(&router);
        async move { dispatch(router, req, peer, max_body).await }
    });

    // HTTP/1.1 or HTTP/2, whatever the client negotiates.
    let builder = ConnBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(io, svc);
    tokio::pin!(conn);

    let mut stopping = false;
    loop {
        tokio::select! {
            res = conn.as_mut() => {
                if let Err(e) = res {
                    error!(%peer, "connection error: {e}");
                }
                break;
            }
            _ = stop.changed(), if !stopping => {
                stopping = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers the body up to `max_body` bytes, routes, and writes one access-log line.
///
/// Never fails: every problem becomes an error envelope, so hyper never sees
/// an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
    max_body: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();

    let response = match parts.method.as_str().parse::<Method>() {
        Ok(method) => match Limited::new(body, max_body).collect().await {
            Ok(collected) => {
                router.handle(Request::new(method, path.clone(), collected.to_bytes())).await
            }
            Err(e) if e.is::<LengthLimitError>() => {
                warn!(%peer, max_body, "request body too large");
                envelope::error(
                    Status::BadRequest,
                    format!("request body exceeds {max_body} bytes"),
                )
            }
            Err(e) => {
                warn!(%peer, "failed to read request body: {e}");
                envelope::error(Status::BadRequest, "failed to read request body")
            }
        },
        Err(()) => envelope::error(
            Status::MethodNotAllowed,
            format!("method {} not allowed", parts.method),
        ),
    };

    info!(
        %peer,
        method = %parts.method,
        path = %path,
        status = response.status_code(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "request"
    );

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C
/// is available. A handler that cannot be installed is logged and ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
