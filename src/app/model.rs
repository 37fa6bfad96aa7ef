// Defines the core data structures for the application.

use std::time::{Duration, Instant};

pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// What the status indicator shows. Recomputed from scratch on every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
}

impl From<bool> for ServiceState {
    fn from(running: bool) -> Self {
        if running {
            ServiceState::Running
        } else {
            ServiceState::Stopped
        }
    }
}

impl ServiceState {
    pub fn label(self) -> &'static str {
        match self {
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Stop,
    ToggleAutostart,
    Configure,
    ShowLog,
    Quit,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Start => "Start Service",
            MenuAction::Stop => "Stop Service",
            MenuAction::ToggleAutostart => "Auto-Run at Startup",
            MenuAction::Configure => "Configure",
            MenuAction::ShowLog => "Show Log",
            MenuAction::Quit => "Quit",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            MenuAction::Start => 's',
            MenuAction::Stop => 'x',
            MenuAction::ToggleAutostart => 'a',
            MenuAction::Configure => 'c',
            MenuAction::ShowLog => 'l',
            MenuAction::Quit => 'q',
        }
    }

    pub fn from_hotkey(c: char) -> Option<Self> {
        MENU.iter()
            .filter_map(|entry| match entry {
                MenuEntry::Action(action) => Some(*action),
                MenuEntry::Separator => None,
            })
            .find(|action| action.hotkey() == c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Action(MenuAction),
    Separator,
}

pub const MENU: &[MenuEntry] = &[
    MenuEntry::Action(MenuAction::Start),
    MenuEntry::Action(MenuAction::Stop),
    MenuEntry::Separator,
    MenuEntry::Action(MenuAction::ToggleAutostart),
    MenuEntry::Action(MenuAction::Configure),
    MenuEntry::Separator,
    MenuEntry::Action(MenuAction::ShowLog),
    MenuEntry::Separator,
    MenuEntry::Action(MenuAction::Quit),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// Modal question or message. While one is open it receives every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Message {
        level: Level,
        title: String,
        body: String,
    },
    /// Quit while the service is still running.
    ConfirmQuit,
    /// Close the editor with a dirty buffer.
    UnsavedChanges,
}

impl Dialog {
    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Dialog::Message {
            level: Level::Error,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Dialog::Message {
            level: Level::Info,
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    Save,
    Discard,
    Cancel,
}

/// Short-lived notice drawn along the bottom of the editor.
#[derive(Debug, Clone)]
pub struct Toast {
    pub level: Level,
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= TOAST_DURATION
    }
}
