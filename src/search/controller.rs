//! State of the interactive search screen.
//!
//! The controller owns the video filter, the search text and the derived
//! result rows. Every filter toggle or text edit re-runs the full search
//! synchronously. Committing a row resolves it to a video and a time window
//! and hands that to a [`Player`]. Failures after start-up never abort the
//! session; they end up in [`SearchController::status`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::db::Database;
use crate::error::StoreError;
use crate::models::{Line, Video};
use crate::ui::Level;

use super::format::format_duration;
use super::highlight::{Segment, highlight};
use super::player::{PlaybackRequest, Player};

/// Read access the search screen needs from the line store.
pub trait LineSource {
    fn videos(&self) -> Result<Vec<Video>, StoreError>;
    fn video_by_id(&self, id: i64) -> Result<Video, StoreError>;
    fn search_lines(&self, video_ids: &[i64], keyword: &str) -> Result<Vec<Line>, StoreError>;
}

impl LineSource for Database {
    fn videos(&self) -> Result<Vec<Video>, StoreError> {
        Database::videos(self)
    }

    fn video_by_id(&self, id: i64) -> Result<Video, StoreError> {
        Database::video_by_id(self, id)
    }

    fn search_lines(&self, video_ids: &[i64], keyword: &str) -> Result<Vec<Line>, StoreError> {
        Database::search_lines(self, video_ids, keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Videos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SwitchFocus,
    VideoCursorUp,
    VideoCursorDown,
    ToggleVideo,
    Input(char),
    Backspace,
    SelectPrevious,
    SelectNext,
    Commit,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: Level,
    pub message: String,
}

/// One result row: the backing line plus its highlighted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub line: Line,
    pub segments: Vec<Segment>,
}

impl ResultRow {
    fn new(line: Line, search_text: &str) -> Self {
        let segments = highlight(&line.text, search_text);
        ResultRow { line, segments }
    }

    pub fn start_label(&self) -> String {
        format_duration(self.line.start)
    }

    pub fn end_label(&self) -> String {
        format_duration(self.line.end)
    }
}

pub struct SearchController<S> {
    source: S,
    videos: Vec<Video>,
    filter: BTreeMap<i64, bool>,
    video_cursor: usize,
    search_text: String,
    results: Vec<ResultRow>,
    selected: usize,
    focus: Focus,
    status: Option<Status>,
}

impl<S: LineSource> SearchController<S> {
    /// Load the video list with every video included.
    pub fn new(source: S) -> Result<Self, StoreError> {
        let videos = source.videos()?;
        let filter = videos.iter().map(|video| (video.id, true)).collect();

        let mut controller = SearchController {
            source,
            videos,
            filter,
            video_cursor: 0,
            search_text: String::new(),
            results: Vec::new(),
            selected: 0,
            focus: Focus::Search,
            status: None,
        };
        controller.recompute();
        Ok(controller)
    }

    pub fn apply(&mut self, action: Action, player: &mut dyn Player) -> Flow {
        self.status = None;
        match action {
            Action::Quit => return Flow::Quit,
            Action::SwitchFocus => {
                self.focus = match self.focus {
                    Focus::Search => Focus::Videos,
                    Focus::Videos => Focus::Search,
                }
            }
            Action::VideoCursorUp => self.video_cursor = self.video_cursor.saturating_sub(1),
            Action::VideoCursorDown => {
                if self.video_cursor + 1 < self.videos.len() {
                    self.video_cursor += 1;
                }
            }
            Action::ToggleVideo => {
                if let Some(id) = self.videos.get(self.video_cursor).map(|video| video.id) {
                    self.toggle_video(id);
                }
            }
            Action::Input(c) => {
                let mut text = self.search_text.clone();
                text.push(c);
                self.set_search_text(text);
            }
            Action::Backspace => {
                let mut text = self.search_text.clone();
                if text.pop().is_some() {
                    self.set_search_text(text);
                }
            }
            Action::SelectPrevious => self.select_previous(),
            Action::SelectNext => self.select_next(),
            Action::Commit => self.commit(player),
        }
        Flow::Continue
    }

    /// Flip whether `video_id` is part of the search scope.
    pub fn toggle_video(&mut self, video_id: i64) {
        if let Some(included) = self.filter.get_mut(&video_id) {
            *included = !*included;
            self.recompute();
        }
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.recompute();
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.results.len() {
            self.selected += 1;
        }
    }

    /// Videos currently in scope, ascending by id.
    pub fn active_video_ids(&self) -> Vec<i64> {
        self.filter
            .iter()
            .filter(|(_, included)| **included)
            .map(|(id, _)| *id)
            .collect()
    }

    fn recompute(&mut self) {
        let ids = self.active_video_ids();
        match self.source.search_lines(&ids, &self.search_text) {
            Ok(lines) => {
                self.results = lines
                    .into_iter()
                    .map(|line| ResultRow::new(line, &self.search_text))
                    .collect();
            }
            Err(err) => {
                self.results.clear();
                self.report(Level::Error, format!("Search failed: {err}"));
            }
        }
        self.selected = 0;
    }

    /// Resolve the selected row to the file and time window to play.
    pub fn resolve_selection(&self) -> Option<Result<PlaybackRequest, StoreError>> {
        let row = self.selected_row()?;
        let request = self
            .source
            .video_by_id(row.line.video_id)
            .map(|video| PlaybackRequest {
                video_file: PathBuf::from(video.video_file),
                start: row.line.start,
                end: row.line.end,
            });
        Some(request)
    }

    pub fn commit(&mut self, player: &mut dyn Player) {
        let request = match self.resolve_selection() {
            None => return,
            Some(Ok(request)) => request,
            Some(Err(err)) => {
                self.report(Level::Error, format!("Could not resolve video: {err}"));
                return;
            }
        };

        match player.play(&request) {
            Ok(()) => self.report(
                Level::Info,
                format!(
                    "Played {} [{} - {}]",
                    request.video_file.display(),
                    format_duration(request.start),
                    format_duration(request.end)
                ),
            ),
            Err(err) => self.report(Level::Error, format!("Could not play video file: {err}")),
        }
    }

    fn report(&mut self, level: Level, message: String) {
        self.status = Some(Status { level, message });
    }

    pub fn videos(&self) -> impl Iterator<Item = (&Video, bool)> {
        self.videos.iter().map(|video| {
            let included = self.filter.get(&video.id).copied().unwrap_or(false);
            (video, included)
        })
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    pub fn video_cursor(&self) -> usize {
        self.video_cursor
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    pub fn selected(&self) -> Option<usize> {
        (!self.results.is_empty()).then_some(self.selected)
    }

    pub fn selected_row(&self) -> Option<&ResultRow> {
        self.results.get(self.selected)
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }
}

/// `[X] (id) name` for included videos, `[ ] (id) name` otherwise.
pub fn video_label(video: &Video, included: bool) -> String {
    let mark = if included { 'X' } else { ' ' };
    format!("[{mark}] ({}) {}", video.id, video.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use std::cell::Cell;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingPlayer {
        requests: Vec<PlaybackRequest>,
        fail: bool,
    }

    impl Player for RecordingPlayer {
        fn play(&mut self, request: &PlaybackRequest) -> Result<(), PlaybackError> {
            self.requests.push(request.clone());
            if self.fail {
                return Err(PlaybackError::PlayerNotFound("mpv".to_string()));
            }
            Ok(())
        }
    }

    /// Store stand-in that can be told to fail.
    struct FlakySource {
        inner: Database,
        fail_search: Cell<bool>,
        fail_lookup: bool,
    }

    impl LineSource for FlakySource {
        fn videos(&self) -> Result<Vec<Video>, StoreError> {
            self.inner.videos()
        }

        fn video_by_id(&self, id: i64) -> Result<Video, StoreError> {
            if self.fail_lookup {
                return Err(StoreError::VideoNotFound(id));
            }
            self.inner.video_by_id(id)
        }

        fn search_lines(&self, ids: &[i64], keyword: &str) -> Result<Vec<Line>, StoreError> {
            if self.fail_search.get() {
                return Err(StoreError::VideoNotFound(0));
            }
            self.inner.search_lines(ids, keyword)
        }
    }

    fn line(text: &str, start_s: u64, end_s: u64) -> Line {
        Line::new(
            text,
            Duration::from_secs(start_s),
            Duration::from_secs(end_s),
        )
    }

    /// Two videos: A says "Hello"/"World", B says "World peace".
    fn seeded() -> (Database, Video, Video) {
        let db = Database::open_in_memory().unwrap();
        let (a, _) = db.upsert_video("/v/a.mkv", "/v/a.srt").unwrap();
        let (b, _) = db.upsert_video("/v/b.mkv", "/v/b.srt").unwrap();
        db.replace_lines(&a, false, &[line("Hello", 0, 2), line("World", 4, 6)])
            .unwrap();
        db.replace_lines(&b, false, &[line("World peace", 1, 3)])
            .unwrap();
        (db, a, b)
    }

    fn type_text(c: &mut SearchController<impl LineSource>, text: &str) {
        let mut player = RecordingPlayer::default();
        for ch in text.chars() {
            c.apply(Action::Input(ch), &mut player);
        }
    }

    fn result_texts<S: LineSource>(c: &SearchController<S>) -> Vec<&str> {
        c.results().iter().map(|r| r.line.text.as_str()).collect()
    }

    #[test]
    fn starts_with_all_videos_and_no_results() {
        let (db, a, b) = seeded();
        let c = SearchController::new(db).unwrap();
        assert_eq!(c.active_video_ids(), vec![a.id, b.id]);
        assert!(c.results().is_empty());
        assert_eq!(c.selected(), None);
        assert_eq!(c.focus(), Focus::Search);
    }

    #[test]
    fn typing_searches_and_highlights() {
        let (db, a, _) = seeded();
        let mut c = SearchController::new(db).unwrap();
        type_text(&mut c, "orld");

        assert_eq!(result_texts(&c), vec!["World", "World peace"]);
        let first = &c.results()[0];
        assert_eq!(first.line.video_id, a.id);
        assert_eq!(
            first.segments,
            vec![
                Segment {
                    text: "W".to_string(),
                    matched: false
                },
                Segment {
                    text: "orld".to_string(),
                    matched: true
                },
            ]
        );
        assert_eq!(first.start_label(), "4s");
        assert_eq!(first.end_label(), "6s");
        assert!(!result_texts(&c).contains(&"Hello"));
    }

    #[test]
    fn backspace_recomputes() {
        let (db, _, _) = seeded();
        let mut c = SearchController::new(db).unwrap();
        let mut player = RecordingPlayer::default();
        type_text(&mut c, "Hellx");
        assert!(c.results().is_empty());

        c.apply(Action::Backspace, &mut player);
        assert_eq!(c.search_text(), "Hell");
        assert_eq!(result_texts(&c), vec!["Hello"]);

        for _ in 0..10 {
            c.apply(Action::Backspace, &mut player);
        }
        assert_eq!(c.search_text(), "");
        assert!(c.results().is_empty());
    }

    #[test]
    fn toggled_off_video_never_returned() {
        let (db, a, b) = seeded();
        let mut c = SearchController::new(db).unwrap();
        c.set_search_text("World");
        assert_eq!(c.results().len(), 2);

        c.toggle_video(a.id);
        assert_eq!(c.active_video_ids(), vec![b.id]);
        assert!(c.results().iter().all(|r| r.line.video_id != a.id));
        assert_eq!(result_texts(&c), vec!["World peace"]);

        c.toggle_video(a.id);
        assert_eq!(c.results().len(), 2);
    }

    #[test]
    fn toggle_via_video_cursor() {
        let (db, a, b) = seeded();
        let mut c = SearchController::new(db).unwrap();
        let mut player = RecordingPlayer::default();
        c.set_search_text("World");

        c.apply(Action::SwitchFocus, &mut player);
        assert_eq!(c.focus(), Focus::Videos);
        c.apply(Action::VideoCursorDown, &mut player);
        c.apply(Action::VideoCursorDown, &mut player);
        assert_eq!(c.video_cursor(), 1);
        c.apply(Action::ToggleVideo, &mut player);

        let states: Vec<(i64, bool)> = c.videos().map(|(v, inc)| (v.id, inc)).collect();
        assert_eq!(states, vec![(a.id, true), (b.id, false)]);
        assert_eq!(result_texts(&c), vec!["World"]);
        assert_eq!(video_label(&b, false), format!("[ ] ({}) b.mkv", b.id));
        assert_eq!(video_label(&a, true), format!("[X] ({}) a.mkv", a.id));
    }

    #[test]
    fn selection_is_clamped() {
        let (db, _, _) = seeded();
        let mut c = SearchController::new(db).unwrap();
        let mut player = RecordingPlayer::default();
        c.set_search_text("o");
        assert_eq!(c.results().len(), 3);

        c.apply(Action::SelectPrevious, &mut player);
        assert_eq!(c.selected(), Some(0));
        for _ in 0..5 {
            c.apply(Action::SelectNext, &mut player);
        }
        assert_eq!(c.selected(), Some(2));

        c.set_search_text("or");
        assert_eq!(c.selected(), Some(0));
    }

    #[test]
    fn commit_plays_selected_window() {
        let (db, _, b) = seeded();
        let mut c = SearchController::new(db).unwrap();
        let mut player = RecordingPlayer::default();
        c.set_search_text("World");
        c.apply(Action::SelectNext, &mut player);
        c.apply(Action::Commit, &mut player);

        assert_eq!(
            player.requests,
            vec![PlaybackRequest {
                video_file: PathBuf::from(&b.video_file),
                start: Duration::from_secs(1),
                end: Duration::from_secs(3),
            }]
        );
        assert_eq!(c.status().map(|s| s.level), Some(Level::Info));
    }

    #[test]
    fn commit_without_results_does_nothing() {
        let (db, _, _) = seeded();
        let mut c = SearchController::new(db).unwrap();
        let mut player = RecordingPlayer::default();
        c.apply(Action::Commit, &mut player);
        assert!(player.requests.is_empty());
        assert!(c.status().is_none());
    }

    #[test]
    fn player_failure_keeps_state() {
        let (db, _, _) = seeded();
        let mut c = SearchController::new(db).unwrap();
        let mut player = RecordingPlayer {
            fail: true,
            ..Default::default()
        };
        c.set_search_text("World");
        c.apply(Action::SelectNext, &mut player);
        let before = c.results().to_vec();

        assert_eq!(c.apply(Action::Commit, &mut player), Flow::Continue);
        assert_eq!(c.results(), before.as_slice());
        assert_eq!(c.selected(), Some(1));
        let status = c.status().unwrap();
        assert_eq!(status.level, Level::Error);
        assert!(status.message.contains("Could not play"));
    }

    #[test]
    fn lookup_failure_is_reported() {
        let (db, _, _) = seeded();
        let source = FlakySource {
            inner: db,
            fail_search: Cell::new(false),
            fail_lookup: true,
        };
        let mut c = SearchController::new(source).unwrap();
        let mut player = RecordingPlayer::default();
        c.set_search_text("Hello");
        c.apply(Action::Commit, &mut player);

        assert!(player.requests.is_empty());
        assert!(c.status().unwrap().message.contains("Could not resolve"));
    }

    #[test]
    fn search_failure_is_not_fatal() {
        let (db, _, _) = seeded();
        let source = FlakySource {
            inner: db,
            fail_search: Cell::new(false),
            fail_lookup: false,
        };
        let mut c = SearchController::new(source).unwrap();
        c.set_search_text("World");
        assert_eq!(c.results().len(), 2);

        c.source.fail_search.set(true);
        c.set_search_text("Worl");
        assert!(c.results().is_empty());
        assert_eq!(c.status().map(|s| s.level), Some(Level::Error));

        c.source.fail_search.set(false);
        let mut player = RecordingPlayer::default();
        c.apply(Action::Backspace, &mut player);
        assert_eq!(c.results().len(), 2);
        assert!(c.status().is_none());
    }

    #[test]
    fn quit_stops_the_loop() {
        let (db, _, _) = seeded();
        let mut c = SearchController::new(db).unwrap();
        let mut player = RecordingPlayer::default();
        assert_eq!(c.apply(Action::Quit, &mut player), Flow::Quit);
    }
}
