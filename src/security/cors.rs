//! CORS for a single known frontend origin.
//!
//! The menu is consumed by one static site, so there is no allow-list to
//! match against: every response carries the same fixed
//! `Access-Control-Allow-Origin`, and every `OPTIONS` request is answered
//! here as a preflight, without touching the router or the cache.

use std::future::Future;
use std::pin::Pin;

use crate::context::Context;
use crate::http::{Method, Response, StatusCode};
use crate::middleware::{Middleware, Next};

/// The only verbs the gateway serves.
const ALLOW_METHODS: &str = "GET, OPTIONS";

/// The only request header the frontend sends that needs clearing.
const ALLOW_HEADERS: &str = "Content-Type";

/// How long browsers may reuse a preflight answer.
const MAX_AGE_SECS: &str = "3600";

/// Middleware that stamps the fixed cross-origin headers and answers
/// preflights.
///
/// # Examples
///
/// ```rust
/// use menugate::security::Cors;
///
/// let cors = Cors::new("https://menu.example.com");
/// ```
pub struct Cors {
    allow_origin: String,
}

impl Cors {
    /// Creates the middleware for the given frontend origin.
    pub fn new(allow_origin: impl Into<String>) -> Self {
        Self {
            allow_origin: allow_origin.into(),
        }
    }

    fn stamp(response: &mut Response, origin: &str) {
        response.add_header("Access-Control-Allow-Origin", origin);
        response.add_header("Access-Control-Allow-Methods", ALLOW_METHODS);
        response.add_header("Access-Control-Allow-Headers", ALLOW_HEADERS);
    }
}

impl Middleware for Cors {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        let origin = self.allow_origin.clone();

        Box::pin(async move {
            if ctx.request().method() == &Method::Options {
                let mut response = Response::new(StatusCode::NoContent)
                    .header("Access-Control-Max-Age", MAX_AGE_SECS);
                Self::stamp(&mut response, &origin);
                return response;
            }

            let mut response = next.run(ctx).await;
            Self::stamp(&mut response, &origin);
            response
        })
    }
}
