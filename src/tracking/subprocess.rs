//! Tracker subprocess manager
//!
//! Launches the holistic tracker helper (`scripts/holistic_tracker.py`) as a
//! child process and reads its stdout as a detection stream. The child is
//! killed when the manager is dropped.

use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

use super::LineSource;
use crate::config::TrackerConfig;
use crate::error::{AvaverseError, TrackingError};

/// Detection stream read from the tracker's stdout.
pub type TrackerStream = LineSource<BufReader<ChildStdout>>;

/// Manages a holistic tracker subprocess.
pub struct TrackerProcess {
    child: Option<Child>,
    config: TrackerConfig,
}

impl TrackerProcess {
    /// Create a new subprocess manager (does not start the process)
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            child: None,
            config: config.clone(),
        }
    }

    /// Command line for the helper:
    /// `<python> <script> [--video <path>] --runtime <runtime> [--solved <path>]`
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.python);
        cmd.arg(&self.config.script);
        if let Some(video) = &self.config.video_path {
            cmd.arg("--video").arg(video);
        }
        cmd.args(["--runtime", &self.config.runtime]);
        if let Some(solved) = &self.config.solved_path {
            cmd.arg("--solved").arg(solved);
        }
        cmd
    }

    /// Launch the tracker and return its detection stream.
    pub fn start(&mut self) -> Result<TrackerStream, AvaverseError> {
        if self.child.is_some() {
            return Err(TrackingError::Subprocess("Tracker already started".to_string()).into());
        }

        let mut child = self
            .command()
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TrackingError::Subprocess(format!(
                    "Failed to launch tracker at '{}': {}",
                    self.config.script, e
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            TrackingError::Subprocess("Tracker stdout was not captured".to_string())
        })?;

        // Forward the helper's diagnostics into our log
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "avaverse::tracker", "{}", line);
                }
            });
        }

        tracing::info!(
            "Tracker subprocess started (pid: {:?}, script: {}, video: {:?})",
            child.id(),
            self.config.script,
            self.config.video_path,
        );

        self.child = Some(child);
        Ok(LineSource::new(BufReader::new(stdout)))
    }

    /// Check if the subprocess is still running (non-blocking)
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::info!("Tracker subprocess exited with: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to check tracker subprocess status: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Stop the subprocess by killing it
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping tracker subprocess (pid: {:?})", child.id());
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let config = TrackerConfig {
            python: "python3".to_string(),
            script: "scripts/holistic_tracker.py".to_string(),
            video_path: Some("clip.mp4".into()),
            ..Default::default()
        };
        let process = TrackerProcess::new(&config);
        let cmd = process.command();
        let std_cmd = cmd.as_std();

        assert_eq!(std_cmd.get_program(), "python3");
        let args: Vec<_> = std_cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "scripts/holistic_tracker.py",
                "--video",
                "clip.mp4",
                "--runtime",
                "mediapipe"
            ]
        );
    }

    #[test]
    fn test_command_line_forwards_solved_records() {
        let config = TrackerConfig {
            video_path: Some("v.mp4".into()),
            solved_path: Some("v.solved.jsonl".into()),
            ..Default::default()
        };
        let cmd = TrackerProcess::new(&config).command();
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "scripts/holistic_tracker.py",
                "--video",
                "v.mp4",
                "--runtime",
                "mediapipe",
                "--solved",
                "v.solved.jsonl"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_interpreter_fails_to_start() {
        let config = TrackerConfig {
            python: "definitely-not-a-python-binary".to_string(),
            ..Default::default()
        };
        let mut process = TrackerProcess::new(&config);
        assert!(process.start().is_err());
        assert!(!process.is_running());
    }
}
