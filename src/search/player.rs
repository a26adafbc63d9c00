use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::PlayerConfig;
use crate::error::PlaybackError;

/// Play `video_file` from `start`, looping between `start` and `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub video_file: PathBuf,
    pub start: Duration,
    pub end: Duration,
}

impl PlaybackRequest {
    pub fn window_args(&self) -> [String; 3] {
        let start = self.start.as_secs_f64();
        let end = self.end.as_secs_f64();
        [
            format!("--start={start:.6}"),
            format!("--ab-loop-a={start:.6}"),
            format!("--ab-loop-b={end:.6}"),
        ]
    }
}

pub trait Player {
    /// Run playback to completion. Blocks until the player exits.
    fn play(&mut self, request: &PlaybackRequest) -> Result<(), PlaybackError>;
}

/// Runs an mpv-compatible player as a child process.
#[derive(Debug, Clone)]
pub struct ExternalPlayer {
    program: String,
    extra_args: Vec<String>,
}

impl ExternalPlayer {
    pub fn from_config(config: &PlayerConfig) -> Self {
        ExternalPlayer {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn args(&self, request: &PlaybackRequest) -> Vec<OsString> {
        self.extra_args
            .iter()
            .map(OsString::from)
            .chain(request.window_args().into_iter().map(OsString::from))
            .chain(std::iter::once(request.video_file.clone().into_os_string()))
            .collect()
    }
}

impl Player for ExternalPlayer {
    fn play(&mut self, request: &PlaybackRequest) -> Result<(), PlaybackError> {
        let executable = which::which(&self.program)
            .map_err(|_| PlaybackError::PlayerNotFound(self.program.clone()))?;

        duct::cmd(executable, self.args(request))
            .run()
            .map_err(|source| PlaybackError::Failed {
                program: self.program.clone(),
                source,
            })?;
        Ok(())
    }
}
