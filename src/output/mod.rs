//! Output module
//!
//! Renderers consume the retargeted avatar once per frame:
//! - Browser viewer (HTTP + SSE pose snapshots, three-vrm on the page)

pub mod browser;
pub mod snapshot;
pub mod sse;

pub use browser::{BrowserRenderer, BrowserServer, SceneSettings};
pub use snapshot::{BoneSnapshot, PoseSnapshot};

use std::future::Future;

use crate::avatar::Avatar;
use crate::error::AvaverseError;
use crate::retarget::FrameReport;
use crate::tracking::{DetectionFrame, ImageSize};

/// What a renderer sees for one frame. `avatar` is `None` until the model
/// has finished loading.
#[derive(Clone, Copy)]
pub struct RenderFrame<'a> {
    pub avatar: Option<&'a dyn Avatar>,
    pub frame: &'a DetectionFrame,
    pub video_size: Option<ImageSize>,
    pub report: FrameReport,
}

/// Draws (or publishes) the avatar after retargeting.
pub trait Renderer {
    fn render(
        &mut self,
        frame: RenderFrame<'_>,
    ) -> impl Future<Output = Result<(), AvaverseError>> + Send;
}
