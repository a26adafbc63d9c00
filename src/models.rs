use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub id: i64,
    pub video_file: String,
    pub subtitle_file: String,
}

impl Video {
    /// Base file name of the video, used wherever a video is shown to the user.
    pub fn display_name(&self) -> String {
        Path::new(&self.video_file)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.video_file.clone())
    }
}

/// A spoken line. `id` and `video_id` are zero until the line is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub id: i64,
    pub video_id: i64,
    pub text: String,
    pub start: Duration,
    pub end: Duration,
}

impl Line {
    pub fn new(text: impl Into<String>, start: Duration, end: Duration) -> Self {
        Self {
            id: 0,
            video_id: 0,
            text: text.into(),
            start,
            end,
        }
    }
}
