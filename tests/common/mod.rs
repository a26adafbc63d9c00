use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Isolated config, data and media directories for one test.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        for dir in ["config", "data", "media"] {
            std::fs::create_dir_all(temp_dir.path().join(dir))?;
        }
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn database(&self) -> PathBuf {
        self.path().join("data").join("lines.db")
    }

    /// Create an empty video file and a subtitle file next to it.
    pub fn media(
        &self,
        name: &str,
        subtitle_ext: &str,
        subtitle: &str,
    ) -> Result<(PathBuf, PathBuf)> {
        let media = self.path().join("media");
        let video = media.join(format!("{name}.mkv"));
        let subs = media.join(format!("{name}.{subtitle_ext}"));
        std::fs::write(&video, b"")?;
        std::fs::write(&subs, subtitle)?;
        Ok((video, subs))
    }

    /// Run the binary with XDG directories pointing into the temp dir.
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(env!("CARGO_BIN_EXE_subseek"))
            .args(["--no-color", "--database"])
            .arg(self.database())
            .args(args)
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env_remove("SUBSEEK_DATABASE_FILE")
            .current_dir(self.path())
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
