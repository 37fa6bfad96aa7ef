//! Standalone editor for a single configuration file.
//!
//! Usage: `llama-config-edit <file-path>`. Exits with status 1 when the argument
//! is missing, repeated, or not a regular file.

use anyhow::Result;
use clap::Parser;
use llama_tray::app::systemd::SystemRunner;
use llama_tray::config::{Scope, Settings};
use llama_tray::{App, logging};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"), version, about)]
struct EditArgs {
    /// File to edit
    file_path: PathBuf,

    /// Privilege elevation helper used when the file is not writable
    #[arg(long, default_value = "pkexec", env = "LLAMA_TRAY_HELPER")]
    helper: String,
}

fn main() -> Result<ExitCode> {
    let args = match EditArgs::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            eprintln!("Usage: {} <file-path>", env!("CARGO_BIN_NAME"));
            return Ok(ExitCode::from(1));
        }
        Err(e) => {
            // --help / --version
            e.print()?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    if !args.file_path.is_file() {
        eprintln!("Error: {} is not a valid file.", args.file_path.display());
        return Ok(ExitCode::from(1));
    }

    logging::init_logging("llama-config-edit", false)?;

    let autostart_dir = dirs::config_dir().unwrap_or_default().join("autostart");
    let mut settings = Settings::with_autostart_dir(Scope::System, autostart_dir);
    settings.tools.helper = args.helper;

    let mut app = App::editor_only(settings, SystemRunner, args.file_path);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    result.map(|()| ExitCode::SUCCESS)
}
