//! Application assembly: the middleware pipeline and route table, wired
//! into a single handler the server can run.
//!
//! The pipeline is access log → CORS → router. CORS sits inside the log so
//! preflights show up in the access log; the router is the terminal layer.

use std::sync::Arc;

use crate::context::Context;
use crate::gateway::Gateway;
use crate::http::{Response, StatusCode};
use crate::menu::MenuKind;
use crate::middleware::{AccessLog, MiddlewareHandler, Next, from_middleware};
use crate::router::Router;
use crate::security::Cors;

/// The fully assembled request pipeline.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use menugate::app::App;
/// use menugate::background::TokioSpawner;
/// use menugate::cache::MemoryStore;
/// use menugate::gateway::Gateway;
/// use menugate::server::Server;
/// use menugate::upstream::{DriveClient, DriveSettings};
///
/// # async fn run(settings: DriveSettings) -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(DriveClient::new(settings)?),
///     Arc::new(TokioSpawner),
/// );
/// let app = Arc::new(App::new(gateway, "https://menu.example.com"));
///
/// let server = Server::bind("127.0.0.1:8080").await?;
/// server
///     .run(move |ctx| {
///         let app = Arc::clone(&app);
///         async move { app.handle(ctx).await }
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct App {
    chain: Vec<MiddlewareHandler>,
}

impl App {
    /// Builds the pipeline around a gateway, admitting `allowed_origin`
    /// cross-origin.
    pub fn new(gateway: Gateway, allowed_origin: impl Into<String>) -> Self {
        let router = Arc::new(build_router(gateway));
        let terminal: MiddlewareHandler = Arc::new(move |ctx: Context, _next: Next| {
            let router = Arc::clone(&router);
            Box::pin(async move { router.dispatch(ctx).await })
        });

        let chain = vec![
            from_middleware(Arc::new(AccessLog)),
            from_middleware(Arc::new(Cors::new(allowed_origin))),
            terminal,
        ];

        Self { chain }
    }

    /// Runs one request through the pipeline.
    pub async fn handle(&self, ctx: Context) -> Response {
        Next::new(self.chain.clone()).run(ctx).await
    }
}

fn build_router(gateway: Gateway) -> Router {
    let mut router = Router::new();

    router.get("/menu", move |ctx: Context| {
        let gateway = gateway.clone();
        async move {
            let kind = MenuKind::from_type_param(ctx.request().query_param("type"));
            gateway.serve(kind).await
        }
    });

    router.get("/healthz", |_ctx: Context| async {
        Response::new(StatusCode::Ok).json(&serde_json::json!({ "status": "ok" }))
    });

    router
}
