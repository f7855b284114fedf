//! Retargeting of solved face, body and hand records onto avatar bones
//!
//! Each retargeter writes through `rig::rig_rotation`/`rig::rig_position`
//! and silently skips bones the avatar does not have. `FrameDriver` decides
//! per frame which retargeters run.

pub mod body;
pub mod driver;
pub mod face;
pub mod hand;

pub use body::{hip_position_target, BodyRetargeter};
pub use driver::{FrameDriver, FrameReport};
pub use face::{FaceRetargeter, FaceState};
pub use hand::HandRetargeter;
