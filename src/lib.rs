//! # menugate
//!
//! An edge-style reverse-proxy cache that fronts the Google Drive v3 file
//! listing API and serves a lunch/dinner menu payload to a single browser
//! origin, with stale-while-revalidate semantics:
//!
//! - entries younger than 60 seconds are served straight from cache,
//! - entries younger than an hour are served from cache while a detached
//!   background refresh runs,
//! - anything older (or missing) blocks on a synchronous upstream fetch.
//!
//! The decision core lives in [`gateway`]; [`upstream`] fetches listings,
//! [`cache`] stores them, and [`background`] carries the fire-and-forget
//! refresh contract. Everything above that ([`server`], [`router`],
//! [`middleware`], [`security`]) is the HTTP/1.1 surface.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use menugate::app::App;
//! use menugate::background::TokioSpawner;
//! use menugate::cache::MemoryStore;
//! use menugate::gateway::Gateway;
//! use menugate::server::Server;
//! use menugate::upstream::{DriveClient, DriveSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = DriveSettings {
//!         api_key: "api-key".into(),
//!         lunch_folder: "lunch-folder-id".into(),
//!         dinner_folder: "dinner-folder-id".into(),
//!         referer: "https://gateway.example.com".into(),
//!         timeout: std::time::Duration::from_secs(10),
//!     };
//!     let gateway = Gateway::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(DriveClient::new(settings)?),
//!         Arc::new(TokioSpawner),
//!     );
//!     let app = Arc::new(App::new(gateway, "https://menu.example.com"));
//!
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     server
//!         .run(move |ctx| {
//!             let app = Arc::clone(&app);
//!             async move { app.handle(ctx).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod background;
pub mod cache;
pub mod config;
pub mod context;
pub mod gateway;
pub mod http;
pub mod menu;
pub mod middleware;
pub mod router;
pub mod security;
pub mod server;
pub mod upstream;

pub use cache::{CacheEntry, CacheStore, MemoryStore};
pub use gateway::{Freshness, FreshnessPolicy, Gateway};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use menu::MenuKind;
pub use server::{Server, ServerError};
