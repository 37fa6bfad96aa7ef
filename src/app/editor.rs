// Plain-text editor for the service configuration, with privileged save.

use super::model::{Toast, UnsavedChoice};
use super::systemd::{CommandRunner, command_line, run_checked};
use crate::config::Settings;
use crate::error::{Error, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TAB: &str = "    ";

/// Line-oriented text with a cursor. Columns count chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl TextBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(String::from).collect(),
            row: 0,
            col: 0,
        }
    }

    /// Joined content. Round-trips `from_text` exactly, trailing newline included.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_index(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map_or(line.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        s.chars().for_each(|c| self.insert_char(c));
    }

    pub fn newline(&mut self) {
        let at = self.byte_index();
        let rest = self.lines[self.row].split_off(at);
        self.row += 1;
        self.col = 0;
        self.lines.insert(self.row, rest);
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let at = self.byte_index();
            self.lines[self.row].remove(at);
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let at = self.byte_index();
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn up(&mut self, n: usize) {
        self.row = self.row.saturating_sub(n);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn down(&mut self, n: usize) {
        self.row = (self.row + n).min(self.lines.len() - 1);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn home(&mut self) {
        self.col = 0;
    }

    pub fn end(&mut self) {
        self.col = self.line_len(self.row);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written by this process.
    Direct,
    /// Copied into place by the elevation helper.
    Elevated,
}

/// What a key press asked the editor window to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    None,
    Save,
    Close,
}

/// Direct write used by [`Editor::save`] before it falls back to the helper.
pub type WriteFn = fn(&Path, &str) -> io::Result<()>;

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)
}

pub struct Editor<R> {
    path: PathBuf,
    pub buffer: TextBuffer,
    saved: String,
    runner: R,
    helper: String,
    write: WriteFn,
    pub toast: Option<Toast>,
    /// First visible row, maintained by the renderer.
    pub scroll: usize,
}

impl<R: CommandRunner> Editor<R> {
    /// Opens `path`. A read failure still yields an (empty) editor, together
    /// with the error so the caller can show it.
    pub fn open(path: impl Into<PathBuf>, runner: R, helper: impl Into<String>) -> (Self, Option<Error>) {
        let path = path.into();
        let (content, error) = match load(&path) {
            Ok(content) => (content, None),
            Err(e) => {
                warn!("{e}");
                (String::new(), Some(e))
            }
        };

        let editor = Self {
            buffer: TextBuffer::from_text(&content),
            saved: content,
            path,
            runner,
            helper: helper.into(),
            write: write_file,
            toast: None,
            scroll: 0,
        };
        (editor, error)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn with_writer(mut self, write: WriteFn) -> Self {
        self.write = write;
        self
    }

    /// Buffer differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.buffer.text() != self.saved
    }

    /// Writes directly when permitted, otherwise through the elevation helper.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        let content = self.buffer.text();
        let outcome = match (self.write)(&self.path, &content) {
            Ok(()) => SaveOutcome::Direct,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                info!("no write permission on {}, elevating", self.path.display());
                self.save_elevated(&content)?;
                SaveOutcome::Elevated
            }
            Err(e) => return Err(Error::io("save", &self.path, e)),
        };
        info!("saved {} ({outcome:?})", self.path.display());
        self.saved = content;
        Ok(outcome)
    }

    /// Stages `content` in a temporary file and runs `<helper> cp <tmp> <target>`.
    /// The temporary file is removed whether or not the copy succeeds.
    pub fn save_elevated(&self, content: &str) -> Result<()> {
        let mut staged = tempfile::Builder::new()
            .prefix("llama-tray-")
            .tempfile()
            .map_err(|e| Error::io("create temporary file for", &self.path, e))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|e| Error::io("stage", staged.path(), e))?;

        let staged = staged.into_temp_path();
        let args = vec![
            "cp".to_string(),
            staged.display().to_string(),
            self.path.display().to_string(),
        ];
        let result = run_checked(&self.runner, &self.helper, &args).map(drop);

        if let Err(e) = staged.close() {
            warn!("failed to remove temporary file: {e}");
        }
        result
    }

    /// Carries out the answer to the unsaved-changes prompt. Returns whether
    /// the window should close.
    pub fn resolve_close(&mut self, choice: UnsavedChoice) -> Result<bool> {
        match choice {
            UnsavedChoice::Save => self.save().map(|_| true),
            UnsavedChoice::Discard => Ok(true),
            UnsavedChoice::Cancel => Ok(false),
        }
    }

    /// Applies an editing key. Ctrl-S and Esc are returned to the caller.
    pub fn handle_key(&mut self, key: KeyEvent, page: usize) -> EditorCommand {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => return EditorCommand::Save,
            KeyCode::Char('q') if ctrl => return EditorCommand::Close,
            KeyCode::Esc => return EditorCommand::Close,
            KeyCode::Char(c) if !ctrl => self.buffer.insert_char(c),
            KeyCode::Tab => self.buffer.insert_str(TAB),
            KeyCode::Enter => self.buffer.newline(),
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete(),
            KeyCode::Left => self.buffer.left(),
            KeyCode::Right => self.buffer.right(),
            KeyCode::Up => self.buffer.up(1),
            KeyCode::Down => self.buffer.down(1),
            KeyCode::PageUp => self.buffer.up(page.max(1)),
            KeyCode::PageDown => self.buffer.down(page.max(1)),
            KeyCode::Home => self.buffer.home(),
            KeyCode::End => self.buffer.end(),
            _ => {}
        }
        EditorCommand::None
    }
}

pub fn load(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io("open", path, e))
}

/// Creates the config file from the sample through the helper if it is missing.
/// Returns whether a copy was made.
pub fn seed_config<R: CommandRunner>(settings: &Settings, runner: &R) -> Result<bool> {
    if settings.config_path.exists() {
        return Ok(false);
    }
    let args = vec![
        "cp".to_string(),
        settings.sample_path.display().to_string(),
        settings.config_path.display().to_string(),
    ];
    run_checked(runner, &settings.tools.helper, &args)?;
    info!("seeded {} from sample", settings.config_path.display());
    Ok(true)
}

/// Runs `<helper> -d <editor> <path>` detached from this process.
pub fn launch_external<R: CommandRunner>(runner: &R, helper: &str, editor: &str, path: &Path) -> Result<()> {
    let args = vec!["-d".to_string(), editor.to_string(), path.display().to_string()];
    let command = command_line(helper, &args);
    info!("launching {command}");
    runner
        .spawn_detached(helper, &args)
        .map_err(|e| Error::spawn(helper, command, e))
}
