//! Tracking module
//!
//! Detection frames and where they come from:
//! - newline-delimited JSON over any async reader (file replay, pipes)
//! - the holistic tracker helper launched as a subprocess

pub mod frame;
pub mod source;
pub mod subprocess;

pub use frame::{DetectionFrame, ImageSize, Landmark};
pub use source::{DetectionSource, LineSource};
pub use subprocess::{TrackerProcess, TrackerStream};
