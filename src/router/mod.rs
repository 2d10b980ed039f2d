//! Request routing: map paths and methods to handler functions.
//!
//! The gateway serves a fixed, flat surface (`/menu`, `/healthz`), so routes
//! are exact path strings; there are no captures or wildcards to compile.
//! Trailing slashes are normalized on both sides, `/menu/` and `/menu` hit
//! the same route, and the query string never participates in matching.
//!
//! Routes are evaluated in registration order. A path that exists but was
//! asked for with the wrong verb yields `405` with an `Allow` header rather
//! than a generic `404`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::http::{Method, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Context`]
/// and returns a [`Response`].
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so they can be cloned and
/// shared across tasks without copying the underlying closure. In practice
/// you never construct this type directly; register closures through
/// [`Router::get`].
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this automatically via the blanket
/// impl, so route registration accepts plain async closures.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

// A single registered route binding a method + path to a handler.
struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// Exact-path HTTP router.
///
/// # Examples
///
/// ```rust,no_run
/// use menugate::http::{Response, StatusCode};
/// use menugate::router::Router;
///
/// let mut router = Router::new();
/// router.get("/healthz", |_ctx| async {
///     Response::new(StatusCode::Ok).json(&serde_json::json!({ "status": "ok" }))
/// });
/// ```
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for `GET` requests to `path`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    // Erase the concrete handler type and store it as a `Handler` trait object.
    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
            handler,
        });
    }

    /// Return the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch a request to the first route matching its method and path.
    ///
    /// When the path matches at least one route but none with the request's
    /// method, the response is `405` and `Allow` lists the usable verbs.
    /// A path with no routes at all yields `404`. Both error bodies are
    /// JSON, like everything else this service emits.
    pub async fn dispatch(&self, ctx: Context) -> Response {
        let path = normalize(ctx.request().path()).to_owned();
        let method = ctx.request().method().clone();

        let mut path_matched = false;
        let mut allowed: Vec<&str> = Vec::new();

        for route in &self.routes {
            if route.path != path {
                continue;
            }
            if route.method == method {
                return (route.handler)(ctx).await;
            }
            path_matched = true;
            let verb = route.method.as_str();
            if !allowed.contains(&verb) {
                allowed.push(verb);
            }
        }

        if path_matched {
            Response::new(StatusCode::MethodNotAllowed)
                .header("Allow", allowed.join(", "))
                .json(&serde_json::json!({ "error": "method not allowed" }))
        } else {
            Response::new(StatusCode::NotFound)
                .json(&serde_json::json!({ "error": "not found" }))
        }
    }
}

// Strips a trailing slash from everything but the root path.
fn normalize(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}
