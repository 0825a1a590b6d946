use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use warmpool::api::{start_api_server, ApiState};
use warmpool::config::{Config, LoggingConfig};
use warmpool::session::MockSessionFactory;
use warmpool::telemetry::TelemetryHistory;
use warmpool::{ResourcePool, Result, WarmPoolError};

#[derive(Parser, Debug)]
#[command(name = "warmpool")]
#[command(about = "Pre-warmed session pool with a status API", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Number of sessions kept warm (overrides config)
    #[arg(long, env = "SESSION_POOL_SIZE")]
    pool_size: Option<usize>,

    /// Releases before a session is recycled (overrides config)
    #[arg(long, env = "SESSION_MAX_EXECUTIONS")]
    max_executions: Option<u64>,

    /// Session age limit in minutes (overrides config)
    #[arg(long, env = "SESSION_MAX_AGE_MINUTES")]
    max_age_minutes: Option<u64>,

    /// Generate example configuration file
    #[arg(long, value_name = "FILE")]
    generate_config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(config_path) = args.generate_config {
        println!("Generating example configuration file: {:?}", config_path);
        Config::create_example(&config_path)?;
        println!("Example configuration file created successfully!");
        println!("Edit the file and run: warmpool --config {:?}", config_path);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(bind) = args.bind {
        config.api.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.api.bind_port = port;
    }
    if let Some(size) = args.pool_size {
        config.pool.size = size;
    }
    if let Some(max_executions) = args.max_executions {
        config.pool.max_executions = max_executions;
    }
    if let Some(max_age) = args.max_age_minutes {
        config.pool.max_age_minutes = max_age;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_logging(&config.logging)?;

    info!("Warmpool v{} starting", env!("CARGO_PKG_VERSION"));
    match &args.config {
        Some(path) => info!("Loaded configuration from: {:?}", path),
        None => info!("No configuration file specified, using defaults"),
    }

    let telemetry = TelemetryHistory::new(
        config.telemetry.max_events,
        config.telemetry.retention_hours,
    );
    let pool = Arc::new(ResourcePool::with_telemetry(
        config.pool.to_pool_config(),
        Arc::new(MockSessionFactory::new()),
        telemetry,
    ));

    pool.start().await?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
        signal_token.cancel();
    });

    let result = start_api_server(&config.api, ApiState::new(Arc::clone(&pool)), shutdown).await;
    if let Err(e) = &result {
        error!("API server error: {}", e);
    }

    pool.stop().await;
    info!("Shutdown complete");

    result
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&logging.level)
        .map_err(|e| WarmPoolError::Config(format!("Invalid log level: {}", e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    Ok(())
}
