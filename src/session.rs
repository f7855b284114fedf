//! Frame loop: pace, load the avatar in the background, retarget, render.
//!
//! Everything here runs cooperatively on one task. Retargeting for a frame
//! always finishes before that frame is rendered.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::time::{Interval, MissedTickBehavior};

use crate::avatar::Avatar;
use crate::error::{AvaverseError, AvatarError};
use crate::output::{RenderFrame, Renderer};
use crate::retarget::FrameDriver;
use crate::solver::UpstreamSolver;
use crate::tracking::DetectionSource;

/// Paces the loop at a target frame rate. A rate of 0 runs unpaced.
pub struct Ticker {
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(fps: u32) -> Self {
        let interval = (fps > 0).then(|| {
            let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        Self { interval }
    }

    pub async fn tick(&mut self) {
        match &mut self.interval {
            Some(interval) => {
                interval.tick().await;
            }
            None => tokio::task::yield_now().await,
        }
    }
}

/// Loading state of the avatar as reported over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum AvatarStatus {
    Loading,
    Ready,
    Failed(String),
}

enum SlotState<A> {
    Loading(oneshot::Receiver<Result<A, AvatarError>>),
    Ready(Box<A>),
    Failed(String),
}

/// Avatar that becomes available once a background load completes.
pub struct AvatarSlot<A> {
    state: SlotState<A>,
}

impl<A: Send + 'static> AvatarSlot<A> {
    /// Run `loader` on the blocking pool.
    pub fn spawn<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<A, AvatarError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(loader());
        });
        Self {
            state: SlotState::Loading(rx),
        }
    }

    pub fn ready(avatar: A) -> Self {
        Self {
            state: SlotState::Ready(Box::new(avatar)),
        }
    }

    /// Pick up a finished load without waiting. A failed load is logged
    /// once and not retried.
    pub fn refresh(&mut self) {
        let SlotState::Loading(rx) = &mut self.state else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(avatar)) => {
                tracing::info!("Avatar ready");
                self.state = SlotState::Ready(Box::new(avatar));
            }
            Ok(Err(e)) => {
                tracing::error!("Avatar load failed: {}", e);
                self.state = SlotState::Failed(e.to_string());
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                let e = AvatarError::LoaderTask("loader exited without a result".to_string());
                tracing::error!("Avatar load failed: {}", e);
                self.state = SlotState::Failed(e.to_string());
            }
        }
    }

    pub fn avatar_mut(&mut self) -> Option<&mut A> {
        match &mut self.state {
            SlotState::Ready(avatar) => Some(avatar.as_mut()),
            _ => None,
        }
    }

    /// `refresh` then `avatar_mut`.
    pub fn poll(&mut self) -> Option<&mut A> {
        self.refresh();
        self.avatar_mut()
    }

    pub fn status(&self) -> AvatarStatus {
        match &self.state {
            SlotState::Loading(_) => AvatarStatus::Loading,
            SlotState::Ready(_) => AvatarStatus::Ready,
            SlotState::Failed(message) => AvatarStatus::Failed(message.clone()),
        }
    }
}

/// Counters for one session run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    /// Frames where at least one group reached the avatar
    pub retargeted: u64,
}

/// Owns the per-session loop state.
pub struct Session<A> {
    driver: FrameDriver,
    ticker: Ticker,
    slot: AvatarSlot<A>,
}

impl<A: Avatar + 'static> Session<A> {
    pub fn new(driver: FrameDriver, ticker: Ticker, slot: AvatarSlot<A>) -> Self {
        Self {
            driver,
            ticker,
            slot,
        }
    }

    pub fn avatar_status(&self) -> AvatarStatus {
        self.slot.status()
    }

    /// Run until the source ends or shutdown is signalled.
    ///
    /// `on_status` is called whenever the avatar slot changes state.
    pub async fn run<S, R, F>(
        &mut self,
        source: &mut S,
        renderer: &mut R,
        mut shutdown: broadcast::Receiver<()>,
        mut on_status: F,
    ) -> Result<SessionStats, AvaverseError>
    where
        S: DetectionSource,
        R: Renderer,
        F: FnMut(AvatarStatus),
    {
        let mut stats = SessionStats::default();
        let mut last_status = self.slot.status();
        on_status(last_status.clone());

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Session stopping on shutdown");
                    break;
                }
                _ = self.ticker.tick() => {}
            }

            self.slot.refresh();
            let status = self.slot.status();
            if status != last_status {
                on_status(status.clone());
                last_status = status;
            }
            let mut avatar = self.slot.avatar_mut();

            let frame = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Session stopping on shutdown");
                    break;
                }
                frame = source.next_frame() => frame?,
            };
            let Some(frame) = frame else {
                break;
            };
            stats.frames += 1;

            if self.driver.context().image_size.is_none() {
                self.driver.context_mut().image_size = source.video_size();
            }

            let mut solver = UpstreamSolver::new(&frame.solved);
            let report = self
                .driver
                .drive(avatar.as_deref_mut(), &frame, &mut solver);
            if !report.is_empty() {
                stats.retargeted += 1;
            }

            renderer
                .render(RenderFrame {
                    avatar: avatar.as_deref().map(|a| a as &dyn Avatar),
                    frame: &frame,
                    video_size: source.video_size(),
                    report,
                })
                .await?;
        }

        tracing::info!(
            "Session finished: {} frames, {} retargeted",
            stats.frames,
            stats.retargeted
        );
        Ok(stats)
    }
}
