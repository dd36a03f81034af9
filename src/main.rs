use std::path::PathBuf;

use tracing::{error, info, warn};

use pinpin::{ensure_founder, Config, Database, WebServer};

/// Config path from the first argument, or `config.toml`.
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn load_config() -> Config {
    let path = config_path();
    match Config::load_with_env(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    }
}

/// Create the first founder from `PINPIN_FOUNDER_USERNAME` and
/// `PINPIN_FOUNDER_PASSWORD` when the database has none.
async fn bootstrap_founder(db: &Database, config: &Config) {
    let (Ok(username), Ok(password)) = (
        std::env::var("PINPIN_FOUNDER_USERNAME"),
        std::env::var("PINPIN_FOUNDER_PASSWORD"),
    ) else {
        return;
    };

    match ensure_founder(
        db.pool(),
        &username,
        &password,
        config.plans.free_storage_bytes(),
    )
    .await
    {
        Ok(Some(_)) => {}
        Ok(None) => info!("Founder already present, skipping bootstrap"),
        Err(e) => warn!("Failed to create founder account: {}", e),
    }
}

#[tokio::main]
async fn main() {
    let config = load_config();

    // Initialize logging
    if let Err(e) = pinpin::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        pinpin::logging::init_console_only(&config.logging.level);
    }

    info!("PinPin Cloud");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    bootstrap_founder(&db, &config).await;

    let server = match WebServer::new(&config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start web server: {}", e);
            std::process::exit(1);
        }
    };
    info!("Server configured on {}", server.addr());

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
