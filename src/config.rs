// Immutable runtime settings shared by every component.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_UNIT: &str = "llama.cpp.service";
pub const APP_NAME: &str = "llama_tray_service";
pub const TOOLTIP: &str = "Llama.cpp Service Control";
pub const CONFIG_FILE: &str = "/etc/llama.cpp-service/llama-server.conf";
pub const CONFIG_SAMPLE: &str = "/etc/llama.cpp-service/llama-server.conf.sample";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const LOG_BACKLOG: u32 = 50;

/// Which systemd instance the unit lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scope {
    User,
    System,
}

impl Scope {
    /// Extra flag passed to `systemctl` and `journalctl`.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Scope::User => Some("--user"),
            Scope::System => None,
        }
    }
}

/// External programs the tray shells out to.
#[derive(Debug, Clone)]
pub struct Tools {
    pub systemctl: String,
    pub journalctl: String,
    /// Privilege elevation helper, e.g. `pkexec` or `qt-sudo`.
    pub helper: String,
    /// When set, "Configure" launches `<helper> -d <editor> <config>` instead of
    /// the built-in editor.
    pub editor: Option<String>,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            systemctl: "systemctl".to_string(),
            journalctl: "journalctl".to_string(),
            helper: "pkexec".to_string(),
            editor: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub unit: String,
    pub scope: Scope,
    pub poll_interval: Duration,
    pub log_backlog: u32,
    pub config_path: PathBuf,
    pub sample_path: PathBuf,
    pub autostart_path: PathBuf,
    pub app_name: String,
    pub tooltip: String,
    /// Command line written to the autostart descriptor's `Exec=` field.
    pub exec: String,
    pub tools: Tools,
}

impl Settings {
    /// Default profile for `scope`, with the autostart descriptor under the
    /// user's XDG config directory.
    pub fn for_scope(scope: Scope) -> Result<Self> {
        let autostart_dir = dirs::config_dir()
            .ok_or(Error::NoConfigDir)?
            .join("autostart");
        Ok(Self::with_autostart_dir(scope, autostart_dir))
    }

    pub fn with_autostart_dir(scope: Scope, autostart_dir: PathBuf) -> Self {
        Self {
            unit: DEFAULT_UNIT.to_string(),
            scope,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_backlog: LOG_BACKLOG,
            config_path: PathBuf::from(CONFIG_FILE),
            sample_path: PathBuf::from(CONFIG_SAMPLE),
            autostart_path: autostart_dir.join(format!("{APP_NAME}.desktop")),
            app_name: APP_NAME.to_string(),
            tooltip: TOOLTIP.to_string(),
            exec: current_invocation(),
            tools: Tools::default(),
        }
    }

    /// Arguments for `systemctl [--user] <verb> <unit>`.
    pub fn systemctl_args(&self, verb: &str) -> Vec<String> {
        let mut args: Vec<String> = self.scope.flag().map(String::from).into_iter().collect();
        args.push(verb.to_string());
        args.push(self.unit.clone());
        args
    }

    /// Arguments for `journalctl [--user] -u <unit> -f -n <backlog>`.
    pub fn journalctl_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.scope.flag().map(String::from).into_iter().collect();
        args.extend([
            "-u".to_string(),
            self.unit.clone(),
            "-f".to_string(),
            "-n".to_string(),
            self.log_backlog.to_string(),
        ]);
        args
    }
}

/// The executable plus the arguments this process was started with, quoted for
/// a desktop entry `Exec=` line.
fn current_invocation() -> String {
    let exe = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| std::env::args().next().unwrap_or_default());

    std::iter::once(exe)
        .chain(std::env::args().skip(1))
        .map(|arg| exec_arg(&arg))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Characters that force an `Exec=` argument into double quotes.
const EXEC_RESERVED: &[char] = &[
    '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(', ')', '`',
];

/// Quotes one argument by the desktop entry rules: reserved characters put the
/// argument in double quotes with `"`, `` ` ``, `$` and `\` backslash-escaped,
/// `%` doubles to `%%`, and the string-level escape then doubles every backslash.
pub(crate) fn exec_arg(arg: &str) -> String {
    let needs_quotes =
        arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains(EXEC_RESERVED);
    let quoted = if needs_quotes {
        let mut out = String::with_capacity(arg.len() + 2);
        out.push('"');
        for c in arg.chars() {
            if matches!(c, '"' | '`' | '$' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        out
    } else {
        arg.to_string()
    };
    quoted.replace('%', "%%").replace('\\', "\\\\")
}
