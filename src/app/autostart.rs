//! Login autostart through an XDG `.desktop` descriptor.
//!
//! The descriptor's existence is the whole state: present means enabled.

use crate::config::Settings;
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub exec: String,
    pub name: String,
    pub comment: String,
}

impl DesktopEntry {
    pub fn render(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Exec={}\n\
             Hidden=false\n\
             NoDisplay=false\n\
             X-GNOME-Autostart-enabled=true\n\
             Name={}\n\
             Comment={}\n",
            self.exec, self.name, self.comment
        )
    }
}

#[derive(Debug, Clone)]
pub struct Autostart {
    path: PathBuf,
    entry: DesktopEntry,
}

impl Autostart {
    pub fn new(settings: &Settings) -> Self {
        Self {
            path: settings.autostart_path.clone(),
            entry: DesktopEntry {
                exec: settings.exec.clone(),
                name: settings.app_name.clone(),
                comment: format!("Tray application for {}", settings.unit),
            },
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.path.exists()
    }

    /// Writes the descriptor, creating the autostart directory if needed.
    pub fn enable(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;
        }
        fs::write(&self.path, self.entry.render()).map_err(|e| Error::io("write", &self.path, e))?;
        info!("Autostart enabled: {}", self.path.display());
        Ok(())
    }

    pub fn disable(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Autostart disabled: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io("remove", &self.path, e)),
        }
    }

    pub fn set(&self, enabled: bool) -> Result<()> {
        if enabled { self.enable() } else { self.disable() }
    }
}
