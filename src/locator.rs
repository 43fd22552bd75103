//! Object-plane back-projection.
//!
//! A gaze ray leaving the subject's head is intersected with the floor /
//! table plane (`z = 0`) and the crossing point is expressed as a bearing
//! from the observer standing at the origin.

use crate::angle::{Angle, REFERENCE_PITCH};
use crate::gaze::GazeVector;
use crate::perception::HeadLocation;

/// Heads lower than this above the plane give no usable geometry.
const MIN_HEAD_HEIGHT_M: f64 = 1e-6;
/// Fixation points closer than this to the observer have no bearing.
const MIN_PLANE_RANGE_M: f64 = 1e-9;

/// Rule deciding whether the subject is looking at the object plane at all.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LookPolicy {
    /// Below the ray from the subject's head to the observer's feet:
    /// `pitch < atan(head.x / head.z)`. Depends on where the subject sits.
    GroundThreshold,
    /// Below a fixed pitch, whatever the subject's position.
    FixedPitch { cutoff: Angle },
}

impl Default for LookPolicy {
    fn default() -> Self {
        Self::GroundThreshold
    }
}

/// Where the gaze ray crosses the object plane, observer frame, plus the
/// orientation that points the observer at it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixationPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: Angle,
    pub pitch: Angle,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectPlaneLocator {
    policy: LookPolicy,
}

impl ObjectPlaneLocator {
    pub fn new(policy: LookPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LookPolicy {
        self.policy
    }

    /// Pitch below which the subject counts as looking at the plane, or
    /// `None` when the head location gives no usable geometry.
    pub fn threshold_pitch(&self, head: &HeadLocation) -> Option<Angle> {
        match self.policy {
            LookPolicy::FixedPitch { cutoff } => Some(cutoff),
            LookPolicy::GroundThreshold => {
                if head.z <= MIN_HEAD_HEIGHT_M {
                    return None;
                }
                Some(Angle::from_radians((head.x / head.z).atan()))
            }
        }
    }

    pub fn looking_at_plane(&self, gaze: &GazeVector, head: &HeadLocation) -> bool {
        self.threshold_pitch(head)
            .is_some_and(|threshold| gaze.pitch < threshold)
    }

    /// Back-project `gaze` from `head` onto the object plane.
    ///
    /// `None` when either input is missing, the subject is not looking at
    /// the plane, or the geometry is degenerate.
    pub fn locate(
        &self,
        gaze: Option<GazeVector>,
        head: Option<HeadLocation>,
    ) -> Option<FixationPoint> {
        let (gaze, head) = (gaze?, head?);
        if !gaze.is_finite() || !head.is_finite() || head.z <= MIN_HEAD_HEIGHT_M {
            return None;
        }
        if !self.looking_at_plane(&gaze, &head) {
            return None;
        }
        // a ray at or above level never reaches the plane
        if gaze.pitch.abs() >= REFERENCE_PITCH {
            return None;
        }

        let forward_offset = head.z * gaze.pitch.tan();
        let plane_x = head.x - forward_offset;
        let lateral_offset = forward_offset * gaze.yaw.tan();
        let plane_y = head.y + lateral_offset;
        if !plane_x.is_finite() || !plane_y.is_finite() {
            return None;
        }
        if plane_x.abs() < MIN_PLANE_RANGE_M && plane_y.abs() < MIN_PLANE_RANGE_M {
            return None;
        }

        Some(FixationPoint {
            x: plane_x,
            y: plane_y,
            z: 0.0,
            yaw: Angle::from_radians(plane_y.atan2(plane_x)),
            pitch: Angle::ZERO,
        })
    }
}
