use std::sync::Arc;

use clap::Parser;
use localboost_core::config::StorageBackend;
use localboost_core::{LocalBoostConfig, Providers};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use localboost_server::http::{self, HttpState};
use localboost_server::CampaignService;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "localboost.toml")]
    config: String,

    /// Probe the identity provider (and Postgres, if selected) and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match LocalBoostConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let providers = Providers::from_config(&config)?;

    if args.health {
        return run_health_checks(&config, &providers.identity).await;
    }

    if config.identity.url.is_empty() || config.identity.api_key.is_empty() {
        tracing::warn!("SUPABASE_URL or SUPABASE_KEY is not set; auth and storage calls will fail");
    }
    if config.storage.backend == StorageBackend::Postgres && config.storage.database_url.is_empty() {
        tracing::warn!("DATABASE_URL is not set; campaign storage calls will fail");
    }
    if config.generation.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; campaign generation will fail");
    }

    tracing::info!(
        storage = providers.store.name(),
        generation = providers.generation.name(),
        model = %config.generation.model,
        "Providers ready"
    );

    let service = CampaignService::new(providers.identity, providers.store, providers.generation);
    let state = Arc::new(HttpState { service });

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let addr = format!("{}:{}", config.http.host, config.http.port);
    http::start_http_server(state, &addr, tx.subscribe()).await?;

    Ok(())
}

async fn run_health_checks(
    config: &LocalBoostConfig,
    identity: &localboost_core::SupabaseAuthClient,
) -> anyhow::Result<()> {
    match identity.health().await {
        Ok(v) => println!(
            "✅ Identity provider reachable: {}",
            v["version"].as_str().unwrap_or("unknown version")
        ),
        Err(e) => {
            println!("❌ Identity provider check failed: {}", e);
            std::process::exit(1);
        }
    }

    if config.storage.backend == StorageBackend::Postgres {
        let pool = match localboost_core::db::create_pool(&config.storage).await {
            Ok(p) => p,
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        };
        match localboost_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL check failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!("✅ LocalBoost health check passed");
    Ok(())
}
