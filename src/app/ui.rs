// Handles the rendering of widgets to the terminal frame.

use super::App;
use super::editor::Editor;
use super::journal::LogView;
use super::model::{Dialog, Level, MENU, MenuAction, MenuEntry, ServiceState};
use super::systemd::CommandRunner;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

/// Main render function called every frame.
pub fn render<R: CommandRunner>(f: &mut Frame, app: &mut App<R>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    if app.editor_only {
        if let Some(editor) = app.editor.as_mut() {
            app.editor_page = render_editor(f, chunks[0], editor);
        }
        render_footer(f, chunks[1], Footer::Editor);
    } else {
        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(chunks[0]);

        render_status(f, body[0], &app.settings.unit, &app.settings.tooltip, app.state);

        let footer = if let Some(editor) = app.editor.as_mut() {
            app.editor_page = render_editor(f, body[1], editor);
            Footer::Editor
        } else {
            render_menu(f, body[1], app);
            if let Some(view) = app.log_view.as_mut() {
                render_logs(f, view);
                Footer::Logs
            } else {
                Footer::Menu
            }
        };
        render_footer(f, chunks[1], footer);
    }

    if let Some(dialog) = app.dialog.as_ref() {
        render_dialog(f, dialog);
    }
}

fn render_status(f: &mut Frame, area: Rect, unit: &str, tooltip: &str, state: ServiceState) {
    let (symbol, color) = match state {
        ServiceState::Running => ("●", Color::Green),
        ServiceState::Stopped => ("○", Color::DarkGray),
    };

    let line = Line::from(vec![
        Span::styled(format!("{symbol} "), Style::default().fg(color)),
        Span::raw(format!("{unit}: ")),
        Span::styled(state.label(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ]);

    let title = format!(" {tooltip} ");
    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

fn render_menu<R>(f: &mut Frame, area: Rect, app: &mut App<R>) {
    let items: Vec<ListItem> = MENU
        .iter()
        .map(|entry| match entry {
            MenuEntry::Separator => ListItem::new(Line::styled(
                "─".repeat(area.width.saturating_sub(4) as usize),
                Style::default().fg(Color::DarkGray),
            )),
            MenuEntry::Action(action) => {
                let check = match action {
                    MenuAction::ToggleAutostart if app.autostart_enabled => "[x] ",
                    MenuAction::ToggleAutostart => "[ ] ",
                    _ => "    ",
                };
                ListItem::new(Line::from(vec![
                    Span::raw(check),
                    Span::raw(format!("{:<24}", action.label())),
                    Span::styled(
                        format!("({})", action.hotkey()),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Menu "))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, &mut app.menu_state);
}

/// Draws the editor and returns the number of visible text rows.
fn render_editor<R: CommandRunner>(f: &mut Frame, area: Rect, editor: &mut Editor<R>) -> u16 {
    let marker = if editor.is_dirty() { " [modified]" } else { "" };
    let title = format!(" Llama.cpp service config editor: {}{marker} ", editor.path().display());
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let height = inner.height as usize;
    let width = inner.width as usize;
    let (row, col) = editor.buffer.cursor();

    // Keep the cursor on screen.
    if row < editor.scroll {
        editor.scroll = row;
    } else if height > 0 && row >= editor.scroll + height {
        editor.scroll = row + 1 - height;
    }
    let hscroll = col.saturating_sub(width.saturating_sub(1));

    let content: Vec<Line> = editor
        .buffer
        .lines()
        .iter()
        .skip(editor.scroll)
        .take(height)
        .map(|s| Line::from(s.as_str()))
        .collect();
    let paragraph = Paragraph::new(content).scroll((0, hscroll.min(u16::MAX as usize) as u16));
    f.render_widget(paragraph, inner);

    if height > 0 {
        f.set_cursor_position(Position::new(
            inner.x + (col - hscroll) as u16,
            inner.y + (row - editor.scroll) as u16,
        ));
    }

    if let Some(toast) = editor.toast.as_ref() {
        let bg = level_color(toast.level);
        let bar = Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1.min(inner.height));
        f.render_widget(Clear, bar);
        f.render_widget(
            Paragraph::new(toast.message.as_str())
                .style(Style::default().bg(bg).fg(Color::Black))
                .centered(),
            bar,
        );
    }

    inner.height
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Info => Color::LightGreen,
        Level::Error => Color::LightRed,
    }
}

#[derive(Clone, Copy)]
enum Footer {
    Menu,
    Logs,
    Editor,
}

fn render_footer(f: &mut Frame, area: Rect, footer: Footer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = match footer {
        Footer::Logs => Line::from(vec![
            Span::raw("Scroll: "),
            Span::styled("j/k ", bold),
            Span::raw("| Auto-Scroll: "),
            Span::styled("G ", bold),
            Span::raw("| Close: "),
            Span::styled("Esc/q/l ", Style::default().fg(Color::Red)),
        ]),
        Footer::Editor => Line::from(vec![
            Span::raw("Save: "),
            Span::styled("Ctrl-S ", bold),
            Span::raw("| Close: "),
            Span::styled("Esc", Style::default().fg(Color::Red)),
        ]),
        Footer::Menu => Line::from(vec![
            Span::raw("Nav: "),
            Span::styled("j/k ", bold),
            Span::raw("| Select: "),
            Span::styled("Enter ", bold),
            Span::raw("| Action: "),
            Span::styled(
                "s(start) x(stop) a(autostart) c(configure) l(log) ",
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("| Quit: "),
            Span::styled("q", Style::default().fg(Color::Red)),
        ]),
    };

    let paragraph =
        Paragraph::new(help_text).block(Block::default().borders(Borders::ALL).title(" Controls "));

    f.render_widget(paragraph, area);
}

fn render_logs(f: &mut Frame, view: &mut LogView) {
    let area = centered_rect(80, 80, f.area());

    f.render_widget(Clear, area);

    let state = if view.stick_to_bottom {
        "Live | Auto-scroll: ON"
    } else {
        "Paused | Auto-scroll: OFF"
    };
    let title = format!(" {} ({state}) ", view.title);

    let block = Block::default().borders(Borders::ALL).title(title);
    view.page = block.inner(area).height;

    let content: Vec<Line> = view.lines.iter().map(|s| Line::from(s.as_str())).collect();

    let paragraph = Paragraph::new(content).block(block).scroll((view.offset(), 0));

    f.render_widget(paragraph, area);
}

fn render_dialog(f: &mut Frame, dialog: &Dialog) {
    let (title, body, prompt, color) = match dialog {
        Dialog::Message { level, title, body } => {
            (title.as_str(), body.as_str(), "[Enter] OK", level_color(*level))
        }
        Dialog::ConfirmQuit => (
            "Service Running",
            "Are you sure you want to quit without shutting down the service?",
            "[y] Yes  [n] No",
            Color::LightYellow,
        ),
        Dialog::UnsavedChanges => (
            "Unsaved Changes",
            "You have unsaved changes. Do you want to save before closing?",
            "[s] Save  [d] Discard  [c] Cancel",
            Color::LightYellow,
        ),
    };

    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);

    let mut lines: Vec<Line> = body.lines().map(Line::from).collect();
    lines.push(Line::from(""));
    lines.push(Line::styled(prompt, Style::default().add_modifier(Modifier::BOLD)));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {title} "));
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
