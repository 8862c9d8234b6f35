use tracing::{error, info};

use cloudportal::auth::HashCost;
use cloudportal::{open_blob_store, Config, Database, PortalService, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = cloudportal::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        cloudportal::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> cloudportal::Result<()> {
    config.validate()?;

    info!("{}", config.portal.name);

    let db = Database::open(&config.database.path).await?;
    info!("Database opened at {}", config.database.path);

    let blobs = open_blob_store(&config.storage)?;
    info!(backend = ?config.storage.backend, "Blob store ready");

    let service = PortalService::new(db, blobs)
        .with_hash_cost(HashCost::from(&config.security))
        .with_max_file_size(config.storage.max_upload_bytes())
        .with_list_limit(config.storage.list_limit);

    info!(
        "Web server configured on {}:{}",
        config.web.host, config.web.port
    );
    WebServer::new(&config, service)?.run().await
}
