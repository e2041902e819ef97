//! Kicklist - REST API for a personal bucket list

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use kicklist::{
    config::Args,
    db::{
        AccountStore, KickStore, MemoryAccountStore, MemoryKickStore, MongoAccountStore,
        MongoClient, MongoKickStore,
    },
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("kicklist={},info", args.log_level).into());
    let fmt_layer = if args.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Kicklist v{}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!("Kick read scope: {:?}", args.kick_read_scope);
    info!("Description required: {}", args.require_description);
    info!(
        "Token lifetime: {}",
        match args.jwt_expiry_seconds {
            0 => "no expiry".to_string(),
            s => format!("{}s", s),
        }
    );
    info!("======================================");

    let (accounts, kicks) = open_stores(&args).await?;
    let state = Arc::new(AppState::new(args, accounts, kicks)?);

    server::run(state).await?;
    Ok(())
}

/// Connect to MongoDB, falling back to memory in dev mode
async fn open_stores(args: &Args) -> anyhow::Result<(Arc<dyn AccountStore>, Arc<dyn KickStore>)> {
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => client,
        Err(e) if args.dev_mode => {
            warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
            return Ok((
                Arc::new(MemoryAccountStore::new()),
                Arc::new(MemoryKickStore::new()),
            ));
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            return Err(e.into());
        }
    };
    info!("MongoDB connected successfully (db: {})", mongo.db_name());

    let accounts = MongoAccountStore::new(&mongo).await?;
    let kicks = MongoKickStore::new(&mongo).await?;
    Ok((Arc::new(accounts), Arc::new(kicks)))
}
