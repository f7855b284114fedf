//! Per-frame dispatch of landmark groups to the retargeters.

use serde::{Deserialize, Serialize};

use crate::avatar::Avatar;
use crate::config::RetargetTuning;
use crate::rig::Side;
use crate::solver::{SolveContext, Solver};
use crate::tracking::DetectionFrame;

use super::{BodyRetargeter, FaceRetargeter, HandRetargeter};

/// Which groups were retargeted for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameReport {
    pub face: bool,
    pub pose: bool,
    pub left_hand: bool,
    pub right_hand: bool,
}

impl FrameReport {
    pub fn is_empty(&self) -> bool {
        !(self.face || self.pose || self.left_hand || self.right_hand)
    }

    pub fn hand(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left_hand,
            Side::Right => self.right_hand,
        }
    }

    fn set_hand(&mut self, side: Side) {
        match side {
            Side::Left => self.left_hand = true,
            Side::Right => self.right_hand = true,
        }
    }
}

pub struct FrameDriver {
    face: FaceRetargeter,
    body: BodyRetargeter,
    hands: HandRetargeter,
    ctx: SolveContext,
    /// Frames that carried landmarks but produced no solve at all
    unsolved_frames: u64,
}

impl FrameDriver {
    pub fn new(tuning: &RetargetTuning, ctx: SolveContext) -> Self {
        Self {
            face: FaceRetargeter::new(tuning),
            body: BodyRetargeter::new(tuning),
            hands: HandRetargeter::new(tuning),
            ctx,
            unsolved_frames: 0,
        }
    }

    pub fn context(&self) -> &SolveContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SolveContext {
        &mut self.ctx
    }

    pub fn face(&self) -> &FaceRetargeter {
        &self.face
    }

    pub fn hands(&self) -> &HandRetargeter {
        &self.hands
    }

    pub fn unsolved_frames(&self) -> u64 {
        self.unsolved_frames
    }

    /// Retarget every group present in `frame` onto `avatar`.
    pub fn drive<A, S>(
        &mut self,
        avatar: Option<&mut A>,
        frame: &DetectionFrame,
        solver: &mut S,
    ) -> FrameReport
    where
        A: Avatar + ?Sized,
        S: Solver + ?Sized,
    {
        let mut report = FrameReport::default();
        let Some(avatar) = avatar else {
            tracing::trace!("No avatar loaded, skipping frame");
            return report;
        };

        if let Some(size) = frame.size {
            self.ctx.image_size = Some(size);
        }

        if let Some(landmarks) = frame.face() {
            match solver.solve_face(landmarks, &self.ctx) {
                Some(face) => {
                    self.face.apply(Some(&mut *avatar), &face);
                    report.face = true;
                }
                None => tracing::debug!("Face landmarks present but no face solve"),
            }
        }

        let pose = frame
            .pose()
            .and_then(|(world, image)| solver.solve_pose(world, image, &self.ctx));
        if let Some(pose) = &pose {
            self.body.apply(Some(&mut *avatar), pose);
            self.hands.observe_pose(pose);
            report.pose = true;
        } else if frame.pose().is_some() {
            tracing::debug!("Pose landmarks present but no pose solve");
        }

        for side in Side::BOTH {
            let Some(landmarks) = frame.hand_for(side) else {
                continue;
            };
            match solver.solve_hand(landmarks, side, &self.ctx) {
                Some(hand) => {
                    self.hands.apply(Some(&mut *avatar), side, &hand, pose.as_ref());
                    report.set_hand(side);
                }
                None => tracing::debug!("{:?} hand landmarks present but no hand solve", side),
            }
        }

        if report.is_empty() && has_landmarks(frame) {
            if self.unsolved_frames == 0 {
                tracing::warn!(
                    "Frame carries landmarks but no solved records; nothing is retargeted \
                     until the tracker attaches a `solved` block (tracker.solved_path)"
                );
            }
            self.unsolved_frames += 1;
        }

        report
    }
}

fn has_landmarks(frame: &DetectionFrame) -> bool {
    frame.face().is_some()
        || frame.pose().is_some()
        || Side::BOTH.into_iter().any(|side| frame.hand_for(side).is_some())
}
