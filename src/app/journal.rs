// Follows the unit's journal in a child process and buffers its output for display.

use super::systemd::command_line;
use crate::config::Settings;
use crate::error::{Error, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Oldest lines are dropped past this many.
pub const MAX_LOG_LINES: usize = 10_000;

/// How long a child gets to exit after SIGTERM before it is killed.
const TERM_GRACE: Duration = Duration::from_millis(500);

/// A running `journalctl -f`. stdout and stderr are merged into one channel.
/// Dropping the stream terminates and reaps the child.
pub struct LogStream {
    child: Child,
    rx: Receiver<String>,
    finished: bool,
}

impl LogStream {
    pub fn spawn(settings: &Settings) -> Result<Self> {
        Self::spawn_command(&settings.tools.journalctl, &settings.journalctl_args())
    }

    pub(crate) fn spawn_command(program: &str, args: &[String]) -> Result<Self> {
        let command = command_line(program, args);
        info!("following log: {command}");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::spawn(program, command, e))?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        }

        Ok(Self {
            child,
            rx,
            finished: false,
        })
    }

    /// Everything received since the last call, without blocking.
    pub fn drain(&self) -> Vec<String> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    pub fn is_running(&mut self) -> bool {
        !self.finished && matches!(self.child.try_wait(), Ok(None))
    }

    /// Sends SIGTERM if the child is still alive and reaps it, escalating to
    /// SIGKILL after [`TERM_GRACE`]. Idempotent.
    pub fn terminate(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        if let Ok(None) = self.child.try_wait() {
            let pid = Pid::from_raw(self.child.id() as i32);
            if let Err(e) = kill(pid, Signal::SIGTERM) {
                warn!("failed to signal log process {pid}: {e}");
            }
            let deadline = Instant::now() + TERM_GRACE;
            while matches!(self.child.try_wait(), Ok(None)) && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if let Ok(None) = self.child.try_wait() {
                warn!("log process {pid} ignored SIGTERM, killing it");
                let _ = self.child.kill();
            }
        }
        match self.child.wait() {
            Ok(status) => debug!("log process exited: {status}"),
            Err(e) => warn!("failed to reap log process: {e}"),
        }
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn forward_lines<S: Read + Send + 'static>(source: S, tx: Sender<String>) {
    thread::spawn(move || {
        for chunk in BufReader::new(source).split(b'\n') {
            let Ok(bytes) = chunk else { break };
            if tx.send(String::from_utf8_lossy(&bytes).into_owned()).is_err() {
                break;
            }
        }
    });
}

/// The log popup: one stream plus the text it has produced so far.
pub struct LogView {
    pub title: String,
    stream: LogStream,
    pub lines: Vec<String>,
    pub scroll: u16,
    pub stick_to_bottom: bool,
    /// Visible rows at the last render, used to pick a scroll origin when
    /// auto-scroll is switched off.
    pub page: u16,
}

impl LogView {
    pub fn open(settings: &Settings) -> Result<Self> {
        Ok(Self::with_stream(
            format!("Logs: {}", settings.unit),
            LogStream::spawn(settings)?,
        ))
    }

    pub(crate) fn with_stream(title: String, stream: LogStream) -> Self {
        Self {
            title,
            stream,
            lines: Vec::new(),
            scroll: 0,
            stick_to_bottom: true,
            page: 0,
        }
    }

    /// Appends whatever the stream produced. Returns true if anything arrived.
    pub fn pump(&mut self) -> bool {
        let new = self.stream.drain();
        if new.is_empty() {
            return false;
        }
        self.lines.extend(new);
        if self.lines.len() > MAX_LOG_LINES {
            let excess = self.lines.len() - MAX_LOG_LINES;
            self.lines.drain(..excess);
            self.scroll = self.scroll.saturating_sub(excess.min(u16::MAX as usize) as u16);
        }
        true
    }

    pub fn bottom(&self) -> u16 {
        let bottom = self.lines.len().saturating_sub(self.page as usize);
        bottom.min(u16::MAX as usize) as u16
    }

    pub fn scroll_down(&mut self) {
        self.pause();
        self.scroll = self.scroll.saturating_add(1).min(self.bottom());
    }

    pub fn scroll_up(&mut self) {
        self.pause();
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn follow(&mut self) {
        self.stick_to_bottom = true;
    }

    fn pause(&mut self) {
        if self.stick_to_bottom {
            self.stick_to_bottom = false;
            self.scroll = self.bottom();
        }
    }

    /// Offset to render with.
    pub fn offset(&self) -> u16 {
        if self.stick_to_bottom {
            self.bottom()
        } else {
            self.scroll
        }
    }

    pub fn close(mut self) {
        self.stream.terminate();
    }
}
