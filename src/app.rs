// The central application controller and event loop.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::Backend, widgets::ListState};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

pub mod autostart;
pub mod editor;
pub mod journal;
pub mod model;
pub mod systemd;
pub mod ui;

use crate::config::Settings;
use crate::error::Error;
use autostart::Autostart;
use editor::{Editor, EditorCommand, SaveOutcome};
use journal::LogView;
use model::{Dialog, Level, MENU, MenuAction, MenuEntry, ServiceState, Toast, UnsavedChoice};
use systemd::{CommandRunner, ServiceController, SystemRunner};

/// Redraw and input latency; status polling runs on its own interval.
const FRAME_RATE: Duration = Duration::from_millis(100);

pub struct App<R = SystemRunner> {
    settings: Settings,
    runner: R,
    controller: ServiceController<R>,
    autostart: Autostart,
    state: ServiceState,
    autostart_enabled: bool,
    menu_state: ListState,
    dialog: Option<Dialog>,
    log_view: Option<LogView>,
    editor: Option<Editor<R>>,
    editor_page: u16,
    /// Standalone editor: no tray, closing the editor exits.
    editor_only: bool,
    should_quit: bool,
    last_poll: Instant,
}

impl<R: CommandRunner + Clone> App<R> {
    /// Tray mode. The first poll happens here, so the initial state is known
    /// before anything is drawn.
    pub fn new(settings: Settings, runner: R) -> Self {
        let mut app = Self::build(settings, runner, false);
        app.autostart_enabled = app.autostart.is_enabled();
        app.poll(Instant::now());
        app
    }

    /// Editor mode for a single file.
    pub fn editor_only(settings: Settings, runner: R, path: PathBuf) -> Self {
        let mut app = Self::build(settings, runner, true);
        app.open_editor(path);
        app
    }

    fn build(settings: Settings, runner: R, editor_only: bool) -> Self {
        let mut menu_state = ListState::default();
        menu_state.select(Some(0)); // Start with first item selected

        Self {
            controller: ServiceController::new(&settings, runner.clone()),
            autostart: Autostart::new(&settings),
            settings,
            runner,
            state: ServiceState::Stopped,
            autostart_enabled: false,
            menu_state,
            dialog: None,
            log_view: None,
            editor: None,
            editor_page: 10,
            editor_only,
            should_quit: false,
            last_poll: Instant::now(),
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.tick(Instant::now());
            terminal.draw(|f| ui::render(f, self))?;

            if event::poll(FRAME_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            if self.should_quit {
                self.shutdown();
                return Ok(());
            }
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Timer work: drain log output, expire toasts, and re-poll the service
    /// when the interval has passed. A pending quit question holds polling.
    pub fn tick(&mut self, now: Instant) {
        if let Some(view) = self.log_view.as_mut() {
            view.pump();
        }
        if let Some(editor) = self.editor.as_mut() {
            if editor.toast.as_ref().is_some_and(|t| t.expired(now)) {
                editor.toast = None;
            }
        }

        let waiting_on_quit = matches!(self.dialog, Some(Dialog::ConfirmQuit));
        if !self.editor_only
            && !waiting_on_quit
            && now.duration_since(self.last_poll) >= self.settings.poll_interval
        {
            self.poll(now);
        }
    }

    /// Replaces the displayed state with a fresh query.
    fn poll(&mut self, now: Instant) {
        self.state = self.controller.is_running().into();
        self.last_poll = now;
    }

    pub fn dispatch(&mut self, action: MenuAction) {
        info!("menu action: {}", action.label());
        match action {
            MenuAction::Start => {
                if let Err(e) = self.controller.start() {
                    self.open_log();
                    self.dialog = Some(Dialog::error(
                        "Service Start Failed",
                        format!("Could not start the service. Error:\n{}", e.detail()),
                    ));
                }
                self.poll(Instant::now());
            }
            MenuAction::Stop => {
                self.controller.stop();
                self.poll(Instant::now());
            }
            MenuAction::ToggleAutostart => self.toggle_autostart(),
            MenuAction::Configure => self.configure(),
            MenuAction::ShowLog => self.open_log(),
            MenuAction::Quit => self.request_quit(),
        }
    }

    fn toggle_autostart(&mut self) {
        if let Err(e) = self.autostart.set(!self.autostart_enabled) {
            self.dialog = Some(Dialog::error("Autostart Error", e.to_string()));
        }
        self.autostart_enabled = self.autostart.is_enabled();
    }

    fn configure(&mut self) {
        if let Err(e) = editor::seed_config(&self.settings, &self.runner) {
            self.dialog = Some(Dialog::error(
                "Configuration Error",
                format!("Could not create config file: {}", e.detail()),
            ));
            return;
        }

        let path = self.settings.config_path.clone();
        match self.settings.tools.editor.clone() {
            Some(program) => {
                let helper = &self.settings.tools.helper;
                if let Err(e) = editor::launch_external(&self.runner, helper, &program, &path) {
                    let body = if matches!(e, Error::ToolNotFound { .. }) {
                        e.to_string()
                    } else {
                        format!("An unexpected error occurred: {e}")
                    };
                    self.dialog = Some(Dialog::error("Configuration Error", body));
                }
            }
            None => self.open_editor(path),
        }
    }

    fn open_editor(&mut self, path: PathBuf) {
        if self.editor.is_some() {
            return;
        }
        let (editor, error) = Editor::open(path, self.runner.clone(), self.settings.tools.helper.clone());
        self.editor = Some(editor);
        if let Some(e) = error {
            let body = format!("Failed to open file: {}", e.detail());
            self.dialog = Some(Dialog::error("Error", body));
        }
    }

    /// Opens the log view unless one is already showing.
    fn open_log(&mut self) {
        if self.log_view.is_some() {
            return;
        }
        match LogView::open(&self.settings) {
            Ok(view) => self.log_view = Some(view),
            Err(e) => self.dialog = Some(Dialog::error("Log Error", e.to_string())),
        }
    }

    fn close_log(&mut self) {
        if let Some(view) = self.log_view.take() {
            view.close();
        }
    }

    fn request_quit(&mut self) {
        if self.controller.is_running() {
            self.dialog = Some(Dialog::ConfirmQuit);
        } else {
            self.should_quit = true;
        }
    }

    /// Returns whether the buffer reached disk.
    fn save_editor(&mut self) -> bool {
        let Some(editor) = self.editor.as_mut() else {
            return false;
        };
        match editor.save() {
            Ok(SaveOutcome::Direct) => {
                self.dialog = Some(Dialog::info("Saved", "File saved successfully."));
                true
            }
            Ok(SaveOutcome::Elevated) => {
                editor.toast = Some(Toast::new(Level::Info, "File saved successfully."));
                true
            }
            Err(e @ Error::Io { .. }) => {
                let body = format!("Failed to save file: {}", e.detail());
                self.dialog = Some(Dialog::error("Error", body));
                false
            }
            Err(e) => {
                editor.toast = Some(Toast::new(Level::Error, format!("Failed: {}", e.detail())));
                false
            }
        }
    }

    fn request_close_editor(&mut self) {
        match self.editor.as_ref() {
            Some(editor) if editor.is_dirty() => self.dialog = Some(Dialog::UnsavedChanges),
            Some(_) => self.finish_close_editor(),
            None => {}
        }
    }

    fn answer_unsaved(&mut self, choice: UnsavedChoice) {
        let close = match choice {
            UnsavedChoice::Save => self.save_editor(),
            other => self
                .editor
                .as_mut()
                .is_some_and(|editor| editor.resolve_close(other).unwrap_or(false)),
        };
        if close {
            self.finish_close_editor();
        }
    }

    fn finish_close_editor(&mut self) {
        self.editor = None;
        if self.editor_only {
            self.should_quit = true;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.dialog.is_some() {
            self.handle_dialog_key(key);
            return;
        }

        if let Some(editor) = self.editor.as_mut() {
            match editor.handle_key(key, self.editor_page as usize) {
                EditorCommand::Save => {
                    self.save_editor();
                }
                EditorCommand::Close => self.request_close_editor(),
                EditorCommand::None => {}
            }
            return;
        }

        if let Some(view) = self.log_view.as_mut() {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => view.scroll_down(),
                KeyCode::Char('k') | KeyCode::Up => view.scroll_up(),
                KeyCode::Char('G') | KeyCode::End => view.follow(),
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('l') => self.close_log(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.dispatch(MenuAction::Quit)
            }
            KeyCode::Char('j') | KeyCode::Down => self.next(),
            KeyCode::Char('k') | KeyCode::Up => self.previous(),
            KeyCode::Enter => {
                if let Some(action) = self.selected_action() {
                    self.dispatch(action);
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(action) = MenuAction::from_hotkey(c) {
                    self.dispatch(action);
                }
            }
            _ => {}
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        match (&dialog, key.code) {
            (Dialog::Message { .. }, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) => {}
            (Dialog::ConfirmQuit, KeyCode::Char('y')) => self.should_quit = true,
            (Dialog::ConfirmQuit, KeyCode::Char('n') | KeyCode::Esc) => {}
            (Dialog::UnsavedChanges, KeyCode::Char('s')) => self.answer_unsaved(UnsavedChoice::Save),
            (Dialog::UnsavedChanges, KeyCode::Char('d')) => self.answer_unsaved(UnsavedChoice::Discard),
            (Dialog::UnsavedChanges, KeyCode::Char('c') | KeyCode::Esc) => {
                self.answer_unsaved(UnsavedChoice::Cancel)
            }
            _ => self.dialog = Some(dialog),
        }
    }

    fn selected_action(&self) -> Option<MenuAction> {
        match MENU.get(self.menu_state.selected()?)? {
            MenuEntry::Action(action) => Some(*action),
            MenuEntry::Separator => None,
        }
    }

    fn next(&mut self) {
        let current = self.menu_state.selected().unwrap_or(0);
        let i = (1..=MENU.len())
            .map(|step| (current + step) % MENU.len())
            .find(|&i| matches!(MENU[i], MenuEntry::Action(_)))
            .unwrap_or(0);
        self.menu_state.select(Some(i));
    }

    fn previous(&mut self) {
        let current = self.menu_state.selected().unwrap_or(0);
        let i = (1..=MENU.len())
            .map(|step| (current + MENU.len() - step) % MENU.len())
            .find(|&i| matches!(MENU[i], MenuEntry::Action(_)))
            .unwrap_or(0);
        self.menu_state.select(Some(i));
    }

    fn shutdown(&mut self) {
        self.close_log();
        info!("shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scope;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::rc::Rc;
    use systemd::CommandOutput;
    use systemd::fake::{FakeRunner, failed, ok};
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::with_autostart_dir(Scope::System, dir.path().join("autostart"));
        settings.config_path = dir.path().join("llama-server.conf");
        settings.sample_path = dir.path().join("llama-server.conf.sample");
        settings.exec = "/usr/bin/llama-tray".to_string();
        settings.tools.journalctl = "true".to_string();
        settings
    }

    /// Simulates systemd with a shared active flag. `start` succeeds unless
    /// `start_error` is set; helper `cp` really copies.
    struct Service {
        active: Rc<Cell<bool>>,
        start_error: Rc<RefCell<Option<String>>>,
        runner: FakeRunner,
    }

    fn service() -> Service {
        let active = Rc::new(Cell::new(false));
        let start_error: Rc<RefCell<Option<String>>> = Rc::default();
        let (a, s) = (active.clone(), start_error.clone());
        let runner = FakeRunner::new(move |program, args| {
            let verb = args.iter().find(|arg| !arg.starts_with("--")).map(String::as_str);
            match (program, verb) {
                ("systemctl", Some("is-active")) if a.get() => Ok(ok("active\n")),
                ("systemctl", Some("is-active")) => Ok(CommandOutput {
                    code: Some(3),
                    stdout: "inactive\n".to_string(),
                    stderr: String::new(),
                }),
                ("systemctl", Some("start")) => match s.borrow().as_ref() {
                    Some(err) => Ok(failed(1, err)),
                    None => {
                        a.set(true);
                        Ok(ok(""))
                    }
                },
                ("systemctl", Some("stop")) => {
                    a.set(false);
                    Ok(ok(""))
                }
                (_, Some("cp")) => {
                    fs::copy(&args[1], &args[2])?;
                    Ok(ok(""))
                }
                _ => Ok(failed(1, "unexpected command")),
            }
        });
        Service {
            active,
            start_error,
            runner,
        }
    }

    fn is_active_calls(runner: &FakeRunner) -> usize {
        runner
            .calls()
            .iter()
            .filter(|(_, args)| args.iter().any(|a| a == "is-active"))
            .count()
    }

    #[test]
    fn every_poll_shows_the_latest_query() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();
        let mut app = App::new(settings(&dir), svc.runner.clone());
        assert_eq!(app.state(), ServiceState::Stopped);

        let t0 = app.last_poll;
        svc.active.set(true);
        app.tick(t0 + Duration::from_millis(4999));
        assert_eq!(app.state(), ServiceState::Stopped);
        app.tick(t0 + Duration::from_millis(5000));
        assert_eq!(app.state(), ServiceState::Running);

        svc.active.set(false);
        app.tick(t0 + Duration::from_millis(10_000));
        assert_eq!(app.state(), ServiceState::Stopped);
    }

    #[test]
    fn successful_start_shows_running() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();
        let mut app = App::new(settings(&dir), svc.runner.clone());

        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.state(), ServiceState::Running);
        assert!(app.dialog().is_none());
        assert!(
            svc.runner
                .calls()
                .contains(&("systemctl".to_string(), vec!["start".to_string(), "llama.cpp.service".to_string()]))
        );

        app.dispatch(MenuAction::Stop);
        assert_eq!(app.state(), ServiceState::Stopped);
    }

    #[test]
    fn failed_start_stays_stopped_and_shows_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();
        *svc.start_error.borrow_mut() = Some("Unit llama.cpp.service not found.\n".to_string());
        let mut app = App::new(settings(&dir), svc.runner.clone());

        app.dispatch(MenuAction::Start);

        assert_eq!(app.state(), ServiceState::Stopped);
        assert_eq!(
            app.dialog(),
            Some(&Dialog::error(
                "Service Start Failed",
                "Could not start the service. Error:\nUnit llama.cpp.service not found."
            ))
        );
        assert!(app.log_view.is_some());

        app.handle_key(key(KeyCode::Enter));
        assert!(app.dialog().is_none());
    }

    #[test]
    fn quit_while_running_asks_and_holds_polling() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service();
        svc.active.set(true);
        let mut app = App::new(settings(&dir), svc.runner.clone());

        app.dispatch(MenuAction::Quit);
        assert_eq!(app.dialog(), Some(&Dialog::ConfirmQuit));
        assert!(!app.should_quit());

        let polls = is_active_calls(&svc.runner);
        app.tick(app.last_poll + Duration::from_secs(60));
        assert_eq!(is_active_calls(&svc.runner), polls);

        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.dialog(), Some(&Dialog::ConfirmQuit));
        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.dialog().is_none());
        assert!(!app.should_quit());

        app.handle_key(key(KeyCode::Char('q')));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.should_quit());
    }

    #[test]
    fn quit_while_stopped_exits_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir), service().runner);

        app.dispatch(MenuAction::Quit);
        assert!(app.should_quit());
        assert!(app.dialog().is_none());
    }

    #[test]
    fn autostart_toggles_follow_the_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let descriptor = settings.autostart_path.clone();
        let mut app = App::new(settings, service().runner);
        assert!(!app.autostart_enabled);

        app.dispatch(MenuAction::ToggleAutostart);
        assert!(app.autostart_enabled);
        assert!(descriptor.exists());

        app.dispatch(MenuAction::ToggleAutostart);
        assert!(!app.autostart_enabled);
        assert!(!descriptor.exists());
    }

    #[test]
    fn configure_seeds_and_opens_builtin_editor() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        fs::write(&settings.sample_path, "MODEL=/models/a.gguf\n").unwrap();
        let mut app = App::new(settings, service().runner);

        app.dispatch(MenuAction::Configure);

        let editor = app.editor.as_ref().unwrap();
        assert_eq!(editor.buffer.text(), "MODEL=/models/a.gguf\n");
        assert!(app.dialog().is_none());
    }

    #[test]
    fn configure_reports_seed_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir), service().runner);

        app.dispatch(MenuAction::Configure);

        assert!(app.editor.is_none());
        assert!(matches!(
            app.dialog(),
            Some(Dialog::Message { title, body, .. })
                if title == "Configuration Error" && body.starts_with("Could not create config file")
        ));
    }

    #[test]
    fn configure_launches_external_editor() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(&dir);
        fs::write(&settings.config_path, "A=1\n").unwrap();
        settings.tools.helper = "qt-sudo".to_string();
        settings.tools.editor = Some("leafpad".to_string());
        let config = settings.config_path.display().to_string();
        let svc = service();
        let mut app = App::new(settings, svc.runner.clone());

        app.dispatch(MenuAction::Configure);

        assert!(app.editor.is_none());
        assert_eq!(
            svc.runner.detached_calls(),
            vec![("qt-sudo".to_string(), vec!["-d".to_string(), "leafpad".to_string(), config])]
        );
    }

    #[test]
    fn missing_external_helper_gets_its_own_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(&dir);
        fs::write(&settings.config_path, "A=1\n").unwrap();
        settings.tools.editor = Some("leafpad".to_string());
        let runner = service().runner.failing_detached(std::io::ErrorKind::NotFound);
        let mut app = App::new(settings, runner);

        app.dispatch(MenuAction::Configure);
        assert_eq!(
            app.dialog(),
            Some(&Dialog::error("Configuration Error", "pkexec could not be found"))
        );
    }

    #[test]
    fn clean_editor_closes_without_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        fs::write(&settings.config_path, "A=1\n").unwrap();
        let mut app = App::new(settings, service().runner);

        app.dispatch(MenuAction::Configure);
        app.handle_key(key(KeyCode::Esc));

        assert!(app.editor.is_none());
        assert!(app.dialog().is_none());
        assert!(!app.should_quit());
    }

    #[test]
    fn dirty_editor_prompts_and_cancel_keeps_it() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        fs::write(&settings.config_path, "A=1\n").unwrap();
        let mut app = App::new(settings, service().runner);

        app.dispatch(MenuAction::Configure);
        app.handle_key(key(KeyCode::Char('#')));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.dialog(), Some(&Dialog::UnsavedChanges));

        app.handle_key(key(KeyCode::Char('c')));
        assert!(app.dialog().is_none());
        assert_eq!(app.editor.as_ref().unwrap().buffer.text(), "#A=1\n");

        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.editor.is_none());
    }

    #[test]
    fn save_then_close_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config = settings.config_path.clone();
        fs::write(&config, "A=1\n").unwrap();
        let mut app = App::editor_only(settings, service().runner, config.clone());

        app.handle_key(key(KeyCode::Char('#')));
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('s')));

        assert_eq!(fs::read_to_string(&config).unwrap(), "#A=1\n");
        assert!(app.editor.is_none());
        assert!(app.should_quit());
    }

    fn ctrl_s() -> KeyEvent {
        KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)
    }

    fn deny_write(_: &Path, _: &str) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }

    #[test]
    fn missing_file_reports_failed_open() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config = settings.config_path.clone();
        let app = App::editor_only(settings, service().runner, config.clone());

        let Some(Dialog::Message { level, body, .. }) = app.dialog() else {
            panic!("expected an error dialog, got {:?}", app.dialog());
        };
        assert_eq!(*level, Level::Error);
        assert!(body.starts_with("Failed to open file: "), "{body}");
        assert!(body.contains(&config.display().to_string()));
        assert!(!body.contains("failed to open"));
        assert_eq!(app.editor.as_ref().unwrap().buffer.text(), "");
    }

    #[test]
    fn direct_save_shows_saved_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config = settings.config_path.clone();
        fs::write(&config, "A=1\n").unwrap();
        let mut app = App::editor_only(settings, service().runner, config.clone());

        app.handle_key(key(KeyCode::Char('#')));
        app.handle_key(ctrl_s());

        assert_eq!(app.dialog(), Some(&Dialog::info("Saved", "File saved successfully.")));
        assert_eq!(fs::read_to_string(&config).unwrap(), "#A=1\n");
        assert!(!app.editor.as_ref().unwrap().is_dirty());
    }

    #[test]
    fn failed_direct_save_shows_failed_save_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config = dir.path().join("missing/llama-server.conf");
        let mut app = App::editor_only(settings, service().runner, config);
        app.handle_key(key(KeyCode::Enter));

        app.handle_key(key(KeyCode::Char('#')));
        app.handle_key(ctrl_s());

        let Some(Dialog::Message { body, .. }) = app.dialog() else {
            panic!("expected an error dialog, got {:?}", app.dialog());
        };
        assert!(body.starts_with("Failed to save file: "), "{body}");
        assert!(app.editor.as_ref().unwrap().is_dirty());
    }

    #[test]
    fn elevated_save_shows_success_toast() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config = settings.config_path.clone();
        fs::write(&config, "A=1\n").unwrap();
        let svc = service();
        let mut app = App::editor_only(settings, svc.runner.clone(), config.clone());
        app.editor = app.editor.take().map(|e| e.with_writer(deny_write));

        app.handle_key(key(KeyCode::Char('#')));
        app.handle_key(ctrl_s());

        assert!(app.dialog().is_none());
        let editor = app.editor.as_ref().unwrap();
        let toast = editor.toast.as_ref().unwrap();
        assert_eq!(toast.level, Level::Info);
        assert_eq!(toast.message, "File saved successfully.");
        assert!(!editor.is_dirty());
        assert_eq!(fs::read_to_string(&config).unwrap(), "#A=1\n");
        let calls = svc.runner.calls();
        assert!(calls.iter().any(|(program, args)| program == "pkexec" && args[0] == "cp"));
    }

    #[test]
    fn refused_elevation_shows_failure_toast() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config = settings.config_path.clone();
        fs::write(&config, "A=1\n").unwrap();
        let runner = FakeRunner::new(|_, _| Ok(failed(126, "Not authorized")));
        let mut app = App::editor_only(settings, runner, config.clone());
        app.editor = app.editor.take().map(|e| e.with_writer(deny_write));

        app.handle_key(key(KeyCode::Char('#')));
        app.handle_key(ctrl_s());

        assert!(app.dialog().is_none());
        let editor = app.editor.as_ref().unwrap();
        let toast = editor.toast.as_ref().unwrap();
        assert_eq!(toast.level, Level::Error);
        assert_eq!(toast.message, "Failed: Not authorized");
        assert!(editor.is_dirty());
        assert_eq!(fs::read_to_string(&config).unwrap(), "A=1\n");
    }

    #[test]
    fn editor_only_mode_never_polls() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let config = settings.config_path.clone();
        fs::write(&config, "A=1\n").unwrap();
        let svc = service();
        let mut app = App::editor_only(settings, svc.runner.clone(), config);

        app.tick(Instant::now() + Duration::from_secs(60));
        assert_eq!(is_active_calls(&svc.runner), 0);
    }

    #[test]
    fn log_view_opens_once_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir), service().runner);

        app.handle_key(key(KeyCode::Char('l')));
        assert!(app.log_view.is_some());
        app.dispatch(MenuAction::ShowLog);
        assert!(app.log_view.is_some());

        app.handle_key(key(KeyCode::Esc));
        assert!(app.log_view.is_none());
    }

    #[test]
    fn menu_navigation_skips_separators() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir), service().runner);

        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected_action(), Some(MenuAction::Stop));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected_action(), Some(MenuAction::ToggleAutostart));
        app.handle_key(key(KeyCode::Char('k')));
        app.handle_key(key(KeyCode::Char('k')));
        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.selected_action(), Some(MenuAction::Quit));
    }
}
