//! Middleware pipeline: ordered decoration around the route handlers.
//!
//! The gateway's pipeline is short (access logging, then CORS, then the
//! router) but the machinery is general:
//!
//! - [`Middleware`]: trait implemented by each layer.
//! - [`Next`]: cursor into the remaining chain; call [`Next::run`] to
//!   advance to the next layer.
//! - [`MiddlewareHandler`]: type-erased, cheaply-cloneable layer function.
//! - [`from_middleware`]: converts a [`Middleware`] into a
//!   [`MiddlewareHandler`].
//! - [`AccessLog`]: built-in request/response logger.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::time::Instant;

use crate::context::Context;
use crate::http::{Response, StatusCode};

/// A type-erased, reference-counted middleware function.
///
/// Every entry in the middleware stack is stored as a `MiddlewareHandler`.
/// The [`Arc`] wrapper makes handlers cheap to clone so that [`Next`] can
/// advance through the chain without copying closures.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use menugate::context::Context;
/// use menugate::middleware::{MiddlewareHandler, Next};
///
/// let handler: MiddlewareHandler = Arc::new(|ctx: Context, next: Next| {
///     Box::pin(async move { next.run(ctx).await })
/// });
/// ```
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// A cursor into the remaining middleware chain for a single request.
///
/// `Next` is consumed by [`run`](Self::run), so a layer can forward the
/// request at most once; a layer that never calls `run` short-circuits the
/// chain with its own response.
pub struct Next {
    middlewares: Vec<MiddlewareHandler>,
    // Which handler to invoke on the next `run` call.
    index: usize,
}

impl Next {
    /// Creates a `Next` positioned at the start of the given stack.
    pub fn new(middlewares: Vec<MiddlewareHandler>) -> Self {
        Self {
            middlewares,
            index: 0,
        }
    }

    /// Invokes the next layer in the chain and returns its response.
    ///
    /// If the chain is exhausted without any layer producing a response, a
    /// `500` is returned as a safe fallback; a correctly assembled pipeline
    /// ends in a terminal handler, so this only fires on wiring mistakes.
    pub async fn run(mut self, ctx: Context) -> Response {
        if self.index < self.middlewares.len() {
            let handler = self.middlewares[self.index].clone();
            self.index += 1;
            handler(ctx, self).await
        } else {
            Response::new(StatusCode::InternalServerError)
                .body("No response generated by middleware pipeline")
        }
    }
}

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// The trait each pipeline layer implements.
///
/// Implementations receive a [`Context`] and a [`Next`] cursor. They may
/// pass through (`next.run(ctx).await`), short-circuit by returning a
/// [`Response`] without calling `next`, or decorate the downstream response
/// before returning it.
///
/// Layers are shared across tokio tasks, so implementations must be
/// `Send + Sync` and `handle` must return a `Send` future.
///
/// ```rust,no_run
/// use std::pin::Pin;
/// use menugate::context::Context;
/// use menugate::http::Response;
/// use menugate::middleware::{Middleware, Next};
///
/// struct PassThrough;
///
/// impl Middleware for PassThrough {
///     fn handle(
///         &self,
///         ctx: Context,
///         next: Next,
///     ) -> Pin<Box<dyn std::future::Future<Output = Response> + Send>> {
///         Box::pin(async move { next.run(ctx).await })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Handle the request and optionally delegate to the next layer.
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// Logs one line per request after the downstream layers complete.
///
/// Server errors log at `warn` so a failing upstream stands out in an
/// otherwise `info`-level feed; everything else (including 404s, which are
/// routine probe traffic at the edge) logs at `info`.
pub struct AccessLog;

impl Middleware for AccessLog {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().as_str().to_owned();
            let path = ctx.request().path().to_owned();
            let peer = ctx.peer();

            let response = next.run(ctx).await;

            let status = response.status();
            let elapsed_ms = start.elapsed().as_millis() as u64;
            if status.is_server_error() {
                tracing::warn!(
                    method = %method,
                    path = %path,
                    peer = %peer,
                    status = status.as_u16(),
                    elapsed_ms,
                    "request failed"
                );
            } else {
                tracing::info!(
                    method = %method,
                    path = %path,
                    peer = %peer,
                    status = status.as_u16(),
                    elapsed_ms,
                    "request handled"
                );
            }

            response
        })
    }
}
