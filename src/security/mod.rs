//! Request security. For this gateway that means exactly one thing:
//! cross-origin policy for the single browser frontend.

pub mod cors;

pub use cors::Cors;
