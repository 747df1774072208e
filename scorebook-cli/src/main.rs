mod cli;
mod commands;
mod player;
mod view;

use crate::cli::Args;
use crate::player::Player;
use clap::Parser;
use scorebook_core::{
    CoreError, LayoutMetrics, LrcFile, LyricDocument, PlaybackClock, Result, ScoreBookConfig,
    ScoreBookDriver, Session,
};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let args = Args::parse();

    // Check config for logging.enabled before full config load
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(ScoreBookConfig::config_path);
    init_tracing(check_file_logging_enabled(&config_path));

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                "Created a config template at {}, using defaults",
                path.display()
            );
            ScoreBookConfig::default()
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            error!(
                "Config file {} has a syntax error: {parse_error}",
                config_path.display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let document = match load_document(&args.lrc_file) {
        Ok(document) => document,
        Err(e) => {
            error!("Failed to load {}: {e}", args.lrc_file.display());
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let result = runtime.block_on(run(&args, &config, document, cancel_token));

    // A pending stdin read would otherwise block runtime shutdown
    runtime.shutdown_background();

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ScoreBookConfig> {
    path.map_or_else(ScoreBookConfig::load_or_create, ScoreBookConfig::load_from)
}

fn load_document(path: &Path) -> Result<(LyricDocument, Option<Duration>)> {
    let content = std::fs::read_to_string(path)?;
    let lrc = LrcFile::parse(&content)?;

    match (&lrc.metadata.artist, &lrc.metadata.title) {
        (Some(artist), Some(title)) => info!("Now playing: {artist} - {title}"),
        (None, Some(title)) => info!("Now playing: {title}"),
        _ => {}
    }

    let document = LyricDocument::from_lrc(&lrc);
    let length = lrc
        .metadata
        .length
        .or_else(|| document.lines().last().map(|line| line.end_time));
    Ok((document, length))
}

async fn run(
    args: &Args,
    config: &ScoreBookConfig,
    (document, length): (LyricDocument, Option<Duration>),
    cancel_token: CancellationToken,
) -> Result<()> {
    let speed = args.speed.unwrap_or(config.playback.speed);
    if !(speed.is_finite() && speed > 0.0) {
        return Err(CoreError::ConfigInvalid {
            message: "--speed must be a positive number".to_string(),
        });
    }

    let mut metrics = LayoutMetrics::from_config(&config.layout);
    if let Some(line_height) = args.line_height {
        metrics.line_height = line_height;
    }
    let window_height = args.height.unwrap_or(config.layout.window_height);

    let mut clock = PlaybackClock::new(speed);
    if let Some(length) = length {
        clock = clock.with_duration(length);
    }
    clock.seek(Duration::from_millis(args.start_ms), Instant::now());

    let handle = ScoreBookDriver::spawn(
        Session::new(&config.scorebook),
        &config.scorebook,
        Some(cancel_token.clone()),
    );

    let mut player = Player::new(
        handle,
        Arc::new(document),
        clock,
        metrics,
        window_height,
        config,
    );
    player.start(!args.paused).await?;

    let session = player.run(cancel_token).await?;
    let state = session.snapshot();
    info!(
        "Stopped on page {} of {}",
        state.current_page + 1,
        state.total_pages
    );
    Ok(())
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled(config_path: &Path) -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing on stderr, keeping stdout for the page view, with
/// optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = scorebook_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
