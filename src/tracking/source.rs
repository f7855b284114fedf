//! Detection sources
//!
//! The tracker speaks newline-delimited JSON:
//!
//! ```text
//! {"type":"header","width":1280,"height":720,"fps":30}
//! {"type":"frame","image":"data:image/jpeg;base64,...","face_landmarks":[...],"solved":{...}}
//! {"type":"end"}
//! ```
//!
//! A `null` line or EOF also ends the stream. Malformed lines are logged and
//! skipped.

use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use super::{DetectionFrame, ImageSize};
use crate::error::{AvaverseError, TrackingError};

/// Supplier of detection frames in capture order.
pub trait DetectionSource {
    /// Next frame, or `None` once the stream has ended.
    fn next_frame(
        &mut self,
    ) -> impl Future<Output = Result<Option<DetectionFrame>, AvaverseError>> + Send;

    /// Size of the tracked video, once known.
    fn video_size(&self) -> Option<ImageSize>;
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SourceMessage {
    Header {
        width: u32,
        height: u32,
        #[serde(default)]
        fps: Option<f32>,
    },
    Frame(Box<DetectionFrame>),
    End,
}

/// Parse one line. `Ok(None)` is the `null` end marker.
fn parse_message(line: &str) -> Result<Option<SourceMessage>, TrackingError> {
    serde_json::from_str(line).map_err(|e| TrackingError::Parse(e.to_string()))
}

/// Newline-delimited JSON detection source over any async reader.
pub struct LineSource<R> {
    lines: Lines<R>,
    video_size: Option<ImageSize>,
    finished: bool,
    frames_read: u64,
    skipped: u64,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            video_size: None,
            finished: false,
            frames_read: 0,
            skipped: 0,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Number of lines dropped as malformed.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn finish(&mut self) -> Option<DetectionFrame> {
        if !self.finished {
            tracing::info!(
                "Detection stream ended after {} frames ({} malformed lines skipped)",
                self.frames_read,
                self.skipped
            );
        }
        self.finished = true;
        None
    }

    async fn read_frame(&mut self) -> Result<Option<DetectionFrame>, AvaverseError> {
        loop {
            if self.finished {
                return Ok(None);
            }

            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| TrackingError::Read(e.to_string()))?;
            let Some(line) = line else {
                return Ok(self.finish());
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_message(line) {
                Ok(None) | Ok(Some(SourceMessage::End)) => return Ok(self.finish()),
                Ok(Some(SourceMessage::Header { width, height, fps })) => {
                    tracing::info!(
                        "Detection stream header: {}x{} @ {:?} fps",
                        width,
                        height,
                        fps
                    );
                    self.video_size = Some(ImageSize { width, height });
                }
                Ok(Some(SourceMessage::Frame(frame))) => {
                    self.frames_read += 1;
                    return Ok(Some(*frame));
                }
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!("Skipping malformed detection message: {}", e);
                }
            }
        }
    }
}

impl LineSource<BufReader<tokio::fs::File>> {
    /// Replay a recorded detection stream from disk.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, AvaverseError> {
        let file = tokio::fs::File::open(path.as_ref()).await.map_err(|e| {
            TrackingError::Read(format!("{}: {}", path.as_ref().display(), e))
        })?;
        tracing::info!("Reading detection frames from {}", path.as_ref().display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> DetectionSource for LineSource<R> {
    fn next_frame(
        &mut self,
    ) -> impl Future<Output = Result<Option<DetectionFrame>, AvaverseError>> + Send {
        self.read_frame()
    }

    fn video_size(&self) -> Option<ImageSize> {
        self.video_size
    }
}
