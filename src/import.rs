use std::path::{Path, PathBuf};

use crate::db::{Database, LineFailure};
use crate::error::ImportError;
use crate::models::Video;
use crate::normalize::normalize;
use crate::subtitle;

#[derive(Debug)]
pub struct ImportReport {
    pub video: Video,
    /// Whether the video was already tracked before this run
    pub existed: bool,
    /// Lines produced by normalization
    pub normalized: usize,
    pub inserted: usize,
    pub failures: Vec<LineFailure>,
}

/// Parse `subtitle_file`, normalize it and make it the searchable line set of `video_file`.
///
/// Re-running with the same video replaces its lines wholesale. Errors
/// returned here are fatal to the run; individual line insert failures are
/// collected in the report instead.
pub fn import_subtitles(
    db: &Database,
    video_file: &Path,
    subtitle_file: &Path,
) -> Result<ImportReport, ImportError> {
    let video_path = absolute(video_file)?;
    let subtitle_path = absolute(subtitle_file)?;

    let cues = subtitle::parse_file(&subtitle_path)?;
    let lines = normalize(&cues);

    let (video, existed) = db.upsert_video(
        &video_path.to_string_lossy(),
        &subtitle_path.to_string_lossy(),
    )?;
    let outcome = db.replace_lines(&video, existed, &lines)?;

    Ok(ImportReport {
        video,
        existed,
        normalized: lines.len(),
        inserted: outcome.inserted,
        failures: outcome.failures,
    })
}

fn absolute(path: &Path) -> Result<PathBuf, ImportError> {
    path.canonicalize().map_err(|source| ImportError::Path {
        path: path.to_path_buf(),
        source,
    })
}
