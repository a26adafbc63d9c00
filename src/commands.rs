use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::json;
use std::path::Path;

use crate::config::PlayerConfig;
use crate::db::Database;
use crate::import::import_subtitles;
use crate::search::{ExternalPlayer, SearchApp, SearchController};
use crate::ui::prelude::*;

fn open_database(path: &Path) -> Result<Database> {
    emit(
        Level::Debug,
        "db.open",
        &format!("Opening database {}", path.display()),
        None,
    );
    Database::open(path)
        .with_context(|| format!("opening database {}", path.display()))
}

pub fn handle_add(database: &Path, video: &Path, subtitle: &Path) -> Result<()> {
    let db = open_database(database)?;

    let report = import_subtitles(&db, video, subtitle)
        .with_context(|| format!("importing {} for {}", subtitle.display(), video.display()))?;

    let name = report.video.display_name();
    if report.existed {
        emit(
            Level::Debug,
            "import.replaced",
            &format!(
                "Replaced existing lines of video {} ('{}')",
                report.video.id, name
            ),
            None,
        );
    }

    for failure in &report.failures {
        emit(
            Level::Warn,
            "import.line_failed",
            &format!("Failed to add line '{}': {}", failure.text, failure.error),
            None,
        );
    }
    if !report.failures.is_empty() {
        emit(
            Level::Warn,
            "import.partial",
            &format!(
                "{} of {} lines could not be stored",
                report.failures.len(),
                report.normalized
            ),
            None,
        );
    }

    emit(
        Level::Success,
        "import.done",
        &format!("Added {} lines for video '{}'", report.inserted, name),
        Some(json!({
            "video_id": report.video.id,
            "video_file": report.video.video_file,
            "subtitle_file": report.video.subtitle_file,
            "replaced": report.existed,
            "inserted": report.inserted,
            "failed": report.failures.len(),
        })),
    );
    Ok(())
}

pub fn handle_search(database: &Path, player: &PlayerConfig) -> Result<()> {
    let db = open_database(database)?;
    let controller = SearchController::new(db).context("loading videos")?;

    let mut app = SearchApp::new(controller, ExternalPlayer::from_config(player))
        .context("starting terminal interface")?;
    app.run()
}

pub fn handle_list(database: &Path) -> Result<()> {
    let db = open_database(database)?;
    let videos = db.videos().context("listing videos")?;

    let mut rows = Vec::with_capacity(videos.len());
    for video in &videos {
        let count = db
            .line_count(video.id)
            .with_context(|| format!("counting lines of video {}", video.id))?;
        rows.push((video, count));
    }

    if get_output_format() == OutputFormat::Json {
        for (video, count) in rows {
            emit(
                Level::Info,
                "list.video",
                &video.display_name(),
                Some(json!({
                    "id": video.id,
                    "video_file": video.video_file,
                    "subtitle_file": video.subtitle_file,
                    "lines": count,
                })),
            );
        }
        return Ok(());
    }

    if rows.is_empty() {
        emit(Level::Info, "list.empty", "No videos imported yet", None);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Video", "Subtitle", "Lines"]);
    for (video, count) in rows {
        table.add_row(vec![
            video.id.to_string(),
            video.display_name(),
            video.subtitle_file.clone(),
            count.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
