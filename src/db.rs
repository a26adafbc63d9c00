use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::StoreError;
use crate::models::{Line, Video};

pub type Result<T> = std::result::Result<T, StoreError>;

pub struct Database {
    conn: Connection,
}

const CURRENT_SCHEMA_VERSION: i32 = 1;

/// A line that could not be stored during [`Database::replace_lines`].
#[derive(Debug)]
pub struct LineFailure {
    pub text: String,
    pub error: StoreError,
}

#[derive(Debug, Default)]
pub struct ReplaceOutcome {
    pub inserted: usize,
    pub failures: Vec<LineFailure>,
}

impl Database {
    /// Open (or create) the store at `path`, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Location {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", ())?;

        Self::init_schema(&conn)?;

        Ok(Database { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL,
                updated TEXT NOT NULL,
                PRIMARY KEY (version)
            )",
            (),
        )?;

        let mut version = match conn.query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        ) {
            Ok(v) => v,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                conn.execute(
                    "INSERT INTO schema_version (version, updated) VALUES (0, datetime('now'))",
                    [],
                )?;
                0
            }
            Err(e) => return Err(e.into()),
        };

        while version < CURRENT_SCHEMA_VERSION {
            version = Self::migrate_schema(conn, version)?;
        }

        Ok(())
    }

    /// Applies one migration step and returns the version it reached.
    fn migrate_schema(conn: &Connection, from_version: i32) -> Result<i32> {
        match from_version {
            0 => {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS videos (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        video_file TEXT NOT NULL UNIQUE,
                        subtitle_file TEXT NOT NULL UNIQUE
                    );
                    CREATE TABLE IF NOT EXISTS lines (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        video_id INTEGER NOT NULL,
                        text TEXT NOT NULL,
                        start_at INTEGER NOT NULL,
                        end_at INTEGER NOT NULL,
                        FOREIGN KEY (video_id) REFERENCES videos(id)
                    );
                    CREATE INDEX IF NOT EXISTS lines_video_id ON lines (video_id);
                    INSERT INTO schema_version (version, updated) VALUES (1, datetime('now'));",
                )?;
                Ok(1)
            }
            other => Ok(other + 1),
        }
    }

    /// Find the video for `video_file`, creating it if needed.
    ///
    /// Returns the row and whether it already existed. An existing row keeps
    /// its original subtitle path.
    pub fn upsert_video(&self, video_file: &str, subtitle_file: &str) -> Result<(Video, bool)> {
        if let Some(video) = self.video_by_video_file(video_file)? {
            return Ok((video, true));
        }

        self.conn.execute(
            "INSERT INTO videos (video_file, subtitle_file) VALUES (?1, ?2)",
            params![video_file, subtitle_file],
        )?;

        let video = Video {
            id: self.conn.last_insert_rowid(),
            video_file: video_file.to_string(),
            subtitle_file: subtitle_file.to_string(),
        };
        Ok((video, false))
    }

    pub fn video_by_video_file(&self, video_file: &str) -> Result<Option<Video>> {
        let video = self
            .conn
            .query_row(
                "SELECT id, video_file, subtitle_file FROM videos WHERE video_file = ?1",
                [video_file],
                video_from_row,
            )
            .optional()?;
        Ok(video)
    }

    pub fn video_by_id(&self, id: i64) -> Result<Video> {
        self.conn
            .query_row(
                "SELECT id, video_file, subtitle_file FROM videos WHERE id = ?1",
                [id],
                video_from_row,
            )
            .optional()?
            .ok_or(StoreError::VideoNotFound(id))
    }

    /// All videos, ascending by id.
    pub fn videos(&self) -> Result<Vec<Video>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, video_file, subtitle_file FROM videos ORDER BY id ASC")?;
        let rows = stmt.query_map([], video_from_row)?;
        let mut result = Vec::new();
        for video in rows {
            result.push(video?);
        }
        Ok(result)
    }

    pub fn insert_line(&self, line: &Line) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO lines (video_id, text, start_at, end_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                line.video_id,
                line.text,
                to_nanos(line.start),
                to_nanos(line.end)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn delete_lines(&self, video_id: i64) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM lines WHERE video_id = ?1", [video_id])?;
        Ok(deleted)
    }

    /// Replace the stored lines of `video` with `lines`.
    ///
    /// Old lines are deleted only when the video already existed. Inserts are
    /// best effort: a failing line is recorded in the outcome and the rest
    /// are still attempted.
    pub fn replace_lines(
        &self,
        video: &Video,
        existed: bool,
        lines: &[Line],
    ) -> Result<ReplaceOutcome> {
        if existed {
            self.delete_lines(video.id)?;
        }

        let mut outcome = ReplaceOutcome::default();
        for line in lines {
            let line = Line {
                video_id: video.id,
                ..line.clone()
            };
            match self.insert_line(&line) {
                Ok(_) => outcome.inserted += 1,
                Err(error) => outcome.failures.push(LineFailure {
                    text: line.text,
                    error,
                }),
            }
        }
        Ok(outcome)
    }

    pub fn line_count(&self, video_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM lines WHERE video_id = ?1",
            [video_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Lines of the given videos containing `keyword` (literal, case-sensitive).
    ///
    /// Results are grouped per video in the order of `video_ids`, and follow
    /// subtitle order within a video. An empty keyword matches nothing.
    pub fn search_lines(&self, video_ids: &[i64], keyword: &str) -> Result<Vec<Line>> {
        let mut result = Vec::new();
        if keyword.is_empty() {
            return Ok(result);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, video_id, text, start_at, end_at FROM lines
             WHERE video_id = ?1 AND instr(text, ?2) > 0
             ORDER BY id ASC",
        )?;
        for video_id in video_ids {
            let rows = stmt.query_map(params![video_id, keyword], line_from_row)?;
            for line in rows {
                result.push(line?);
            }
        }
        Ok(result)
    }
}

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: row.get(0)?,
        video_file: row.get(1)?,
        subtitle_file: row.get(2)?,
    })
}

fn line_from_row(row: &Row<'_>) -> rusqlite::Result<Line> {
    Ok(Line {
        id: row.get(0)?,
        video_id: row.get(1)?,
        text: row.get(2)?,
        start: from_nanos(row.get(3)?),
        end: from_nanos(row.get(4)?),
    })
}

fn to_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

fn from_nanos(nanos: i64) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(0))
}
