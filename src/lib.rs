pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use cli::{Cli, Commands};
pub use config::Config;
use db::Store;
use services::{SqlUserService, UserService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Loads config from an explicit path, or from the default search path.
/// Also returns the file that was read, if any.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let mut config = Config::load_from_path(path)?;
            config.apply_env_overrides()?;
            Ok((config, Some(path.to_path_buf())))
        }
        None => Config::load(),
    }
}

/// Writes a default config file for the `init` command. Runs before any
/// config is loaded, so the target may not exist yet.
pub fn init_config(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(Config::default_config_path, Path::to_path_buf);

    if Config::create_default_if_missing(&path)? {
        println!("Config file created at {}. Edit it and run again.", path.display());
    } else {
        println!("Config file already exists at {}", path.display());
    }

    Ok(())
}

pub async fn run(cli: Cli, config: Config, config_source: Option<PathBuf>) -> anyhow::Result<()> {
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match &config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, prometheus_handle).await,
        Commands::Migrate => cmd_migrate(&config).await,
        Commands::Init => init_config(cli.config.as_deref()),
        Commands::CheckUsername {
            username,
            first,
            last,
        } => cmd_check_username(&config, &username, first.as_deref(), last.as_deref()).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.general.log_format == "json";
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "usrman")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
    .context("Failed to open database")
}

async fn serve(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("usrman v{} starting...", env!("CARGO_PKG_VERSION"));

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);

    let state = api::create_app_state(config, prometheus_handle).await?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    connect(config).await?;
    println!("Migrations applied to {}", config.general.database_url);
    Ok(())
}

async fn cmd_check_username(
    config: &Config,
    username: &str,
    first: Option<&str>,
    last: Option<&str>,
) -> anyhow::Result<()> {
    let store = connect(config).await?;
    let users = SqlUserService::new(Arc::new(store));

    if !users.username_exists(username).await? {
        println!("'{username}' is available");
        return Ok(());
    }

    println!("'{username}' is already taken");

    if let (Some(first), Some(last)) = (first, last) {
        let suggestions = users.suggest_usernames(first, last).await?;
        if suggestions.is_empty() {
            println!("No free suggestions for {first} {last}");
        } else {
            println!("Suggestions:");
            for suggestion in suggestions {
                println!("  {suggestion}");
            }
        }
    }

    Ok(())
}
