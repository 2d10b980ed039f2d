use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use menugate::app::App;
use menugate::background::TokioSpawner;
use menugate::cache::MemoryStore;
use menugate::config::Config;
use menugate::gateway::Gateway;
use menugate::server::Server;
use menugate::upstream::{DriveClient, DriveSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let drive = DriveClient::new(DriveSettings {
        api_key: config.google_api_key.clone(),
        lunch_folder: config.lunch_folder_id.clone(),
        dinner_folder: config.dinner_folder_id.clone(),
        referer: config.public_origin.clone(),
        timeout: config.upstream_timeout,
    })?;

    let gateway = Gateway::new(
        Arc::new(MemoryStore::new()),
        Arc::new(drive),
        Arc::new(TokioSpawner),
    );
    let app = Arc::new(App::new(gateway, config.allowed_origin.clone()));

    let server = Server::bind(&config.listen_addr).await?;
    server
        .run(move |ctx| {
            let app = Arc::clone(&app);
            async move { app.handle(ctx).await }
        })
        .await?;

    Ok(())
}
