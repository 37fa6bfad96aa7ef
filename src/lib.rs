//! Terminal tray panel for one systemd-managed llama.cpp server: status polling,
//! start/stop, live journal, login autostart, and a privileged config editor.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::App;
pub use config::{Scope, Settings};
pub use error::{Error, Result};
