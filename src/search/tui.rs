use std::io::{Stdout, stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState,
};

use crate::error::PlaybackError;
use crate::ui::Level;

use super::controller::{Action, Flow, Focus, LineSource, SearchController, video_label};
use super::player::{PlaybackRequest, Player};

const POLL_TIMEOUT: Duration = Duration::from_millis(200);
const SEARCH_LABEL: &str = "Search: ";

type Backend = CrosstermBackend<Stdout>;

/// Translate a key press into a controller action for the focused widget.
pub fn action_for_key(focus: Focus, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(Action::Quit);
    }

    let action = match (focus, key.code) {
        (_, KeyCode::Esc) => Action::Quit,
        (_, KeyCode::Tab | KeyCode::BackTab) => Action::SwitchFocus,
        (Focus::Videos, KeyCode::Up) => Action::VideoCursorUp,
        (Focus::Videos, KeyCode::Down) => Action::VideoCursorDown,
        (Focus::Videos, KeyCode::Enter | KeyCode::Char(' ')) => Action::ToggleVideo,
        (Focus::Search, KeyCode::Up) => Action::SelectPrevious,
        (Focus::Search, KeyCode::Down) => Action::SelectNext,
        (Focus::Search, KeyCode::Enter) => Action::Commit,
        (Focus::Search, KeyCode::Backspace) => Action::Backspace,
        (Focus::Search, KeyCode::Char(c)) if !key.modifiers.contains(KeyModifiers::ALT) => {
            Action::Input(c)
        }
        _ => return None,
    };
    Some(action)
}

/// Full-screen search session. Restores the terminal on drop.
pub struct SearchApp<S, P> {
    terminal: Terminal<Backend>,
    controller: SearchController<S>,
    player: P,
    cleaned_up: bool,
}

impl<S: LineSource, P: Player> SearchApp<S, P> {
    pub fn new(controller: SearchController<S>, player: P) -> Result<Self> {
        enable_raw_mode()?;
        let terminal = undo_on_err(enter_screen(), || {
            let _ = execute!(stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        })?;

        Ok(Self {
            terminal,
            controller,
            player,
            cleaned_up: false,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut needs_redraw = true;

        loop {
            if needs_redraw {
                self.draw()?;
                needs_redraw = false;
            }

            if !event::poll(POLL_TIMEOUT)? {
                continue;
            }

            match event::read()? {
                Event::Key(key) => {
                    let Some(action) = action_for_key(self.controller.focus(), key) else {
                        continue;
                    };
                    let mut player = TerminalHandoff {
                        terminal: &mut self.terminal,
                        inner: &mut self.player,
                    };
                    if self.controller.apply(action, &mut player) == Flow::Quit {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }

        self.cleanup()
    }

    fn draw(&mut self) -> Result<()> {
        let controller = &self.controller;
        self.terminal.draw(|frame| render(frame, controller))?;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }

        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        self.cleaned_up = true;
        Ok(())
    }
}

impl<S, P> Drop for SearchApp<S, P> {
    fn drop(&mut self) {
        if !self.cleaned_up {
            let _ = disable_raw_mode();
            let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
            let _ = self.terminal.show_cursor();
        }
    }
}

fn enter_screen() -> std::io::Result<Terminal<Backend>> {
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

/// Runs `undo` when a terminal transition fails partway.
fn undo_on_err<T, E>(result: Result<T, E>, undo: impl FnOnce()) -> Result<T, E> {
    if result.is_err() {
        undo();
    }
    result
}

/// Gives the terminal back to the user while the player runs.
struct TerminalHandoff<'a, P> {
    terminal: &'a mut Terminal<Backend>,
    inner: &'a mut P,
}

impl<P: Player> Player for TerminalHandoff<'_, P> {
    fn play(&mut self, request: &PlaybackRequest) -> Result<(), PlaybackError> {
        disable_raw_mode().map_err(PlaybackError::Terminal)?;
        undo_on_err(
            execute!(self.terminal.backend_mut(), LeaveAlternateScreen),
            || {
                let _ = enable_raw_mode();
            },
        )
        .map_err(PlaybackError::Terminal)?;

        let result = self.inner.play(request);

        enable_raw_mode().map_err(PlaybackError::Terminal)?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)
            .map_err(PlaybackError::Terminal)?;
        self.terminal.clear().map_err(PlaybackError::Terminal)?;
        result
    }
}

fn focused_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render<S: LineSource>(frame: &mut Frame, controller: &SearchController<S>) {
    let [videos_area, lines_area, input_area, status_area] = Layout::vertical([
        Constraint::Fill(2),
        Constraint::Fill(5),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_videos(frame, controller, videos_area);
    render_lines(frame, controller, lines_area);
    render_input(frame, controller, input_area);
    render_status(frame, controller, status_area);
}

fn render_videos<S: LineSource>(frame: &mut Frame, controller: &SearchController<S>, area: Rect) {
    let focused = controller.focus() == Focus::Videos;
    let items: Vec<ListItem> = controller
        .videos()
        .map(|(video, included)| ListItem::new(video_label(video, included)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused_border(focused))
                .title(format!(" Videos ({}) ", controller.video_count())),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    // The cursor is only visible while the list has focus
    let mut state = ListState::default();
    if focused && controller.video_count() > 0 {
        state.select(Some(controller.video_cursor()));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_lines<S: LineSource>(frame: &mut Frame, controller: &SearchController<S>, area: Rect) {
    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let header = Row::new(["ID", "[", "]", "Text"]).style(header_style);

    let rows: Vec<Row> = controller
        .results()
        .iter()
        .map(|row| {
            let text: Vec<Span> = row
                .segments
                .iter()
                .map(|segment| {
                    if segment.matched {
                        Span::styled(segment.text.as_str(), Style::default().fg(Color::Red))
                    } else {
                        Span::raw(segment.text.as_str())
                    }
                })
                .collect();
            Row::new(vec![
                Cell::from(row.line.video_id.to_string()),
                Cell::from(row.start_label()),
                Cell::from(row.end_label()),
                Cell::from(Line::from(text)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Fill(1),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Lines ({}) ", controller.results().len())),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(controller.selected());
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_input<S: LineSource>(frame: &mut Frame, controller: &SearchController<S>, area: Rect) {
    let text = controller.search_text();
    let input = Paragraph::new(Line::from(vec![
        Span::styled(
            SEARCH_LABEL,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(text),
    ]));
    frame.render_widget(input, area);

    if controller.focus() == Focus::Search {
        let offset = (SEARCH_LABEL.len() + text.chars().count()) as u16;
        let x = area
            .x
            .saturating_add(offset)
            .min(area.right().saturating_sub(1));
        frame.set_cursor_position(Position::new(x, area.y));
    }
}

fn render_status<S: LineSource>(frame: &mut Frame, controller: &SearchController<S>, area: Rect) {
    let status = match controller.status() {
        Some(status) => {
            let color = match status.level {
                Level::Error => Color::Red,
                Level::Warn => Color::Yellow,
                Level::Success => Color::Green,
                _ => Color::Gray,
            };
            Paragraph::new(status.message.as_str())
                .style(Style::default().fg(color))
        }
        None => Paragraph::new(Line::from(vec![
            Span::styled("Tab", Style::default().fg(Color::Cyan)),
            Span::raw(" switch focus  •  "),
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::raw(" play / toggle  •  "),
            Span::styled("Esc", Style::default().fg(Color::Cyan)),
            Span::raw(" quit"),
        ]))
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Line as SpokenLine;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn failed_transition_runs_undo() {
        let mut undone = false;
        let failed: std::io::Result<()> = Err(std::io::Error::other("no tty"));
        assert!(undo_on_err(failed, || undone = true).is_err());
        assert!(undone);

        let mut undone = false;
        let entered: std::io::Result<u8> = Ok(3);
        assert_eq!(undo_on_err(entered, || undone = true).unwrap(), 3);
        assert!(!undone);
    }

    #[test]
    fn keys_map_per_focus() {
        assert_eq!(
            action_for_key(Focus::Search, press(KeyCode::Enter)),
            Some(Action::Commit)
        );
        assert_eq!(
            action_for_key(Focus::Videos, press(KeyCode::Enter)),
            Some(Action::ToggleVideo)
        );
        assert_eq!(
            action_for_key(Focus::Search, press(KeyCode::Char(' '))),
            Some(Action::Input(' '))
        );
        assert_eq!(
            action_for_key(Focus::Videos, press(KeyCode::Char(' '))),
            Some(Action::ToggleVideo)
        );
        assert_eq!(
            action_for_key(Focus::Search, press(KeyCode::Up)),
            Some(Action::SelectPrevious)
        );
        assert_eq!(
            action_for_key(Focus::Videos, press(KeyCode::Up)),
            Some(Action::VideoCursorUp)
        );
        assert_eq!(
            action_for_key(Focus::Videos, press(KeyCode::Tab)),
            Some(Action::SwitchFocus)
        );
        assert_eq!(action_for_key(Focus::Videos, press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ctrl_c_quits_and_other_chords_are_ignored() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(Focus::Search, ctrl_c), Some(Action::Quit));
        assert_eq!(action_for_key(Focus::Search, ctrl_a), None);
    }

    #[test]
    fn renders_rows_and_titles() {
        let db = Database::open_in_memory().unwrap();
        let (video, _) = db.upsert_video("/v/show.mkv", "/v/show.srt").unwrap();
        db.replace_lines(
            &video,
            false,
            &[SpokenLine::new(
                "World",
                Duration::from_secs(4),
                Duration::from_secs(6),
            )],
        )
        .unwrap();

        let mut controller = SearchController::new(db).unwrap();
        controller.set_search_text("orld");

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| render(frame, &controller)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        assert!(screen.contains("Videos (1)"));
        assert!(screen.contains("[X] (1) show.mkv"));
        assert!(screen.contains("Lines (1)"));
        assert!(screen.contains("World"));
        assert!(screen.contains("4s"));
        assert!(screen.contains("Search: orld"));
    }
}
