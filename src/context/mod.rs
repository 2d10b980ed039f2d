//! Per-request context handed from the server through the middleware chain
//! to the route handlers.

use std::net::SocketAddr;

use crate::http::Request;

/// A parsed request plus the connection facts handlers and middleware need.
pub struct Context {
    request: Request,
    peer: SocketAddr,
}

impl Context {
    /// Builds a context for one request on a connection from `peer`.
    pub fn new(request: Request, peer: SocketAddr) -> Self {
        Self { request, peer }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Remote address of the connection that carried this request.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}
