use anyhow::{Context, Result};
use clap::Parser;
use llama_tray::app::systemd::SystemRunner;
use llama_tray::config::{DEFAULT_UNIT, Scope, Settings};
use llama_tray::{App, logging};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    about,
    author,
    name = env!("CARGO_BIN_NAME"),
    version,
)]
pub struct Args {
    /// systemd instance that owns the unit
    #[arg(long, value_enum, default_value_t = Scope::System, env = "LLAMA_TRAY_SCOPE")]
    scope: Scope,

    /// Unit to supervise
    #[arg(long, default_value = DEFAULT_UNIT, env = "LLAMA_TRAY_UNIT")]
    unit: String,

    /// Status poll interval in milliseconds
    #[arg(long, default_value_t = 5000, env = "LLAMA_TRAY_INTERVAL_MS")]
    interval_ms: u64,

    /// Service configuration file
    #[arg(long, env = "LLAMA_TRAY_CONFIG")]
    config: Option<PathBuf>,

    /// Sample copied into place when the configuration file is missing
    #[arg(long, env = "LLAMA_TRAY_SAMPLE")]
    sample: Option<PathBuf>,

    /// Privilege elevation helper (pkexec, qt-sudo, ...)
    #[arg(long, default_value = "pkexec", env = "LLAMA_TRAY_HELPER")]
    helper: String,

    /// Open the configuration in this editor via `<helper> -d <editor>`
    /// instead of the built-in one
    #[arg(long, env = "LLAMA_TRAY_EDITOR")]
    editor: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_settings(self) -> Result<Settings> {
        let mut settings = Settings::for_scope(self.scope)?;
        settings.unit = self.unit;
        settings.poll_interval = Duration::from_millis(self.interval_ms.max(1));
        if let Some(config) = self.config {
            settings.config_path = config;
        }
        if let Some(sample) = self.sample {
            settings.sample_path = sample;
        }
        settings.tools.helper = self.helper;
        settings.tools.editor = self.editor;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging("llama-tray", args.verbose)?;
    let settings = args.into_settings().context("Failed to build settings")?;
    tracing::info!(unit = %settings.unit, scope = ?settings.scope, "starting tray");

    let mut app = App::new(settings, SystemRunner);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!("tray exited with error: {e:#}");
    }
    result
}
