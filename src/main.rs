use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use bidoof_bot::application::errors::{BotError, ConfigError};
use bidoof_bot::application::messaging::UpdateDispatcher;
use bidoof_bot::application::services::{ChatGateway, CommandService, RpcService};
use bidoof_bot::application::supervisor::TaskSupervisor;
use bidoof_bot::domain::traits::{Bot, ChatStore};
use bidoof_bot::infrastructure::adapters::TelegramAdapter;
use bidoof_bot::infrastructure::config::{Config, ConfigSource};
use bidoof_bot::infrastructure::database::SqliteChatStore;
use bidoof_bot::infrastructure::{grpc, logging};

/// Capacity of the update channel between the poller and the dispatcher
const UPDATE_BUFFER: usize = 128;

#[derive(Parser)]
#[command(name = "bidoof-bot")]
#[command(about = "Grand Lord Bidoof: Telegram bot and gRPC controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (long-polls Telegram)
    Run,
    /// Start the gRPC controller
    Serve,
    /// Show version
    Version,
    /// Write the default config to --config
    InitConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("bidoof-bot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => match init_config(&cli.config) {
            Ok(()) => {
                println!("Wrote default config to {}", cli.config);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("init-config failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Run | Commands::Serve => start(cli),
    }
}

fn start(cli: Cli) -> ExitCode {
    let (config, source) = match Config::load_or_default(&cli.config) {
        Ok((config, source)) => (Arc::new(config), source),
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // dropping the guard flushes the log file
    let _guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if source == ConfigSource::Defaults {
        tracing::warn!(path = %cli.config, "Config file not found, using defaults");
    }

    if !config.grpc.is_production() {
        tracing::debug!(config = ?config, "Effective config");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Serve => run_rpc(config).await,
            _ => run_bot(config).await,
        }
    });

    match result {
        Ok(()) => {
            tracing::info!("SHUTTING-DOWN");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "FATAL");
            ExitCode::FAILURE
        }
    }
}

fn init_config(path: &str) -> Result<(), ConfigError> {
    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml)
        .map_err(|e| ConfigError::InvalidValue(format!("Failed to write {}: {}", path, e)))
}

/// Collaborators shared by both entry points, opened once at startup.
async fn connect(config: &Config) -> Result<(Arc<TelegramAdapter>, Arc<dyn ChatStore>), BotError> {
    let token = config.telegram.resolve_token()?;

    let store: Arc<dyn ChatStore> = Arc::new(SqliteChatStore::open(&config.database.path)?);
    tracing::info!(path = %config.database.path.display(), "Database initialized");

    let adapter = Arc::new(TelegramAdapter::new(token, &config.telegram)?);
    let info = adapter.get_me().await?;
    tracing::info!(username = %info.username, "Bot authorized: @{}", info.username);

    Ok((adapter, store))
}

fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::warn!("CANCELED");
        shutdown.cancel();
    });
}

async fn run_bot(config: Arc<Config>) -> Result<(), BotError> {
    tracing::info!(name = %config.bot.name, "START");
    let (adapter, store) = connect(&config).await?;

    let mut commands = CommandService::new();
    commands
        .register_defaults()
        .map_err(|e| BotError::Internal(e.to_string()))?;
    let registry = Arc::new(commands.into_registry());
    registry.publish(&*adapter).await?;

    let supervisor = TaskSupervisor::new(CancellationToken::new());
    cancel_on_ctrl_c(supervisor.shutdown_token().clone());

    let bot: Arc<dyn Bot> = adapter.clone();
    let dispatcher = Arc::new(UpdateDispatcher::new(
        registry,
        ChatGateway::new(bot),
        store,
        supervisor.clone(),
        Arc::clone(&config),
    ));

    let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
    let dispatching = tokio::spawn(dispatcher.serve(rx));

    adapter
        .poll_updates(
            tx,
            supervisor.shutdown_token().clone(),
            config.bot.poll_timeout_seconds,
        )
        .await;

    dispatching
        .await
        .map_err(|e| BotError::Internal(format!("dispatcher crashed: {}", e)))
}

async fn run_rpc(config: Arc<Config>) -> Result<(), BotError> {
    let addr: SocketAddr = config.grpc.listener.parse().map_err(|_| {
        ConfigError::InvalidValue(format!("grpc.listener {:?}", config.grpc.listener))
    })?;
    let (adapter, store) = connect(&config).await?;

    let root = TaskSupervisor::new(CancellationToken::new());
    cancel_on_ctrl_c(root.shutdown_token().clone());

    let bot: Arc<dyn Bot> = adapter;
    let service = RpcService::new(bot, store, root.child(), config.grpc.timeout());
    if !config.grpc.is_production() {
        tracing::info!(service = grpc::SERVICE_NAME, "Registered gRPC service");
    }

    grpc::serve(addr, grpc::GrpcApi::new(service), root.shutdown_token().clone())
        .await
        .map_err(|e| BotError::Network(e.to_string()))
}
