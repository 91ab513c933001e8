//! # Watchbell
//!
//! Scheduled monitor-and-notify daemon. Polls a JSON status endpoint and
//! tells Telegram subscribers when the rendered status changes; optionally
//! captures a timelapse frame on a fixed interval and sends yesterday's
//! frames as an animated GIF shortly after midnight.
//!
//! Usage:
//!   watchbell                          # Run with ~/.watchbell/config.toml
//!   watchbell --config ./bell.toml     # Custom config file
//!   watchbell --init-config            # Write a default config and exit
//!   watchbell --log-file /var/log/bell # Also log to a daily-rotated file

mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use watchbell_channels::{
    CommandCamera, HomeAssistantLight, HttpStatusSource, TelegramChannel, TemplateFormatter,
};
use watchbell_core::WatchbellConfig;
use watchbell_core::config::{LoggingConfig, expand_path};
use watchbell_core::traits::{SystemClock, Transport};
use watchbell_scheduler::{
    ActuationGate, ArtifactStore, BotState, BucketDirectory, CaptureJob, CommandHandler,
    GifCompiler, Notifier, Scheduler, SharedState, StatusJob, SubscriberRegistry,
};

const TOKEN_ENV: &str = "WATCHBELL_TELEGRAM_TOKEN";

#[derive(Parser)]
#[command(
    name = "watchbell",
    version,
    about = "🔔 Watchbell: status change and timelapse notifications over Telegram"
)]
struct Cli {
    /// Config file (default: ~/.watchbell/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory for a daily-rotated log file (overrides logging.directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(WatchbellConfig::default_path);

    // --init-config: write defaults and exit
    if cli.init_config {
        if config_path.exists() {
            println!("⚠️  Config already exists at {}", config_path.display());
        } else {
            WatchbellConfig::default().save_to(&config_path)?;
            println!("✅ Default config written to {}", config_path.display());
            println!("   Set telegram.bot_token (or {TOKEN_ENV}) before starting.");
        }
        return Ok(());
    }

    let mut config = if config_path.exists() {
        WatchbellConfig::load_from(&config_path)?
    } else {
        WatchbellConfig::default()
    };

    let _log_guard = init_logging(&cli, &config.logging);

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        config.telegram.bot_token = token;
    }
    config.validate()?;

    tracing::info!("🔔 Watchbell v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("   📄 Config: {}", config_path.display());

    run(config).await
}

/// Stderr logging plus an optional daily-rotated file. The returned guard
/// must be held until exit so buffered file output is flushed.
fn init_logging(
    cli: &Cli,
    logging: &LoggingConfig,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = if cli.verbose {
        "info,watchbell=debug,watchbell_core=debug,watchbell_scheduler=debug,watchbell_channels=debug"
            .to_string()
    } else {
        logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let directory = cli
        .log_file
        .clone()
        .or_else(|| logging.directory.as_deref().map(expand_path));

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "watchbell.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

async fn run(config: WatchbellConfig) -> Result<()> {
    let data_dir = config.storage.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;

    let state = BotState::new(
        SubscriberRegistry::open(&config.storage.subscribers_path()),
        ArtifactStore::open(&config.storage.message_path()),
    )
    .into_shared();

    let telegram = TelegramChannel::new(config.telegram.clone());
    let bot_username = match telegram.get_me().await {
        Ok(me) => {
            tracing::info!(
                "🤖 Telegram bot: @{}",
                me.username.as_deref().unwrap_or(&me.first_name)
            );
            me.username
        }
        Err(e) => {
            tracing::warn!("⚠️  Telegram getMe failed, accepting /cmd@any: {e}");
            None
        }
    };

    let transport: Arc<dyn Transport> = Arc::new(telegram.clone());
    let notifier = Notifier::new(transport.clone());
    let scheduler = build_scheduler(&config, &notifier, &state);
    tracing::info!("⏰ {} job(s) scheduled", scheduler.job_count());

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler.run(async move {
        let _ = shutdown_rx.changed().await;
    }));

    // Command loop runs until a termination signal arrives.
    let mut handler = CommandHandler::new(state.clone());
    if let Some(username) = bot_username {
        handler = handler.with_bot_username(username);
    }
    let mut updates = telegram.start_polling();
    let shutdown = signals::wait_for_shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    tracing::error!("Signal handler failed: {e}");
                }
                tracing::info!("🛑 Shutdown requested");
                break;
            }
            message = updates.next() => {
                let Some(message) = message else {
                    tracing::warn!("⚠️  Telegram update stream ended");
                    break;
                };
                for reply in handler.handle(&message).await {
                    if let Err(e) = transport.send_text(message.chat_id, &reply).await {
                        tracing::warn!("Reply to {} failed: {e}", message.chat_id);
                    }
                }
            }
        }
    }

    drop(updates);
    let _ = shutdown_tx.send(true);
    match scheduler_handle.await {
        Ok(stats) => tracing::info!(
            "📊 Scheduler stopped: {} firing(s), {} failure(s)",
            stats.firings,
            stats.failures
        ),
        Err(e) => tracing::error!("Scheduler task failed: {e}"),
    }

    persist_on_exit(&state).await;
    tracing::info!("👋 Watchbell stopped");
    Ok(())
}

fn build_scheduler(config: &WatchbellConfig, notifier: &Notifier, state: &SharedState) -> Scheduler {
    let mut scheduler = Scheduler::new();

    if config.status.enabled {
        let job = StatusJob::new(
            Arc::new(HttpStatusSource::from_config(&config.status)),
            Arc::new(TemplateFormatter::new(config.status.template.clone())),
            notifier.clone(),
            state.clone(),
        );
        scheduler.schedule(
            job,
            Duration::from_secs(config.status.interval_secs),
            Duration::from_secs(config.status.initial_delay_secs),
        );
        tracing::info!("   📡 Status: {} every {}s", config.status.url, config.status.interval_secs);
    }

    let timelapse = &config.timelapse;
    if timelapse.enabled {
        let picture_dir = timelapse.picture_dir();
        // validate() keeps the window within one day.
        let window = timelapse.compile_window_secs.min(86_400) as i64;
        let mut job = CaptureJob::new(
            BucketDirectory::new(&picture_dir, &timelapse.frame_extension),
            GifCompiler::new(timelapse.frame_delay_ms, &timelapse.frame_extension),
            Arc::new(CommandCamera::from_config(timelapse)),
            Arc::new(SystemClock),
            notifier.clone(),
            state.clone(),
        )
        .with_compile_window(chrono::Duration::seconds(window));

        if let Some(actuation) = &config.actuation {
            job = job.with_gate(ActuationGate::new(Arc::new(HomeAssistantLight::new(actuation))));
            tracing::info!("   💡 Light: {}", actuation.entity_id);
        }

        scheduler.schedule(
            job,
            Duration::from_secs(timelapse.interval_secs),
            Duration::from_secs(timelapse.initial_delay_secs),
        );
        tracing::info!(
            "   📷 Timelapse: {} every {}s",
            picture_dir.display(),
            timelapse.interval_secs
        );
    }

    scheduler
}

/// Final write of both persisted artifacts; failures are only logged.
async fn persist_on_exit(state: &SharedState) {
    let mut state = state.lock().await;
    if let Err(e) = state.subscribers.save() {
        tracing::error!("Failed to save subscribers: {e}");
    }
    if let Err(e) = state.status.flush() {
        tracing::error!("Failed to save status: {e}");
    }
}
