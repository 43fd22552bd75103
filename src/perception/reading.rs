use serde::{Deserialize, Serialize};
use std::fmt;

use crate::angle::{Angle, REFERENCE_PITCH};

/// Platform identifier of a tracked subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub u64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject:{}", self.0)
    }
}

/// Raw per-subject angles exactly as the platform reports them.
///
/// `gaze_direction` is `[eye_yaw, eye_pitch]` and `head_angles` is
/// `[head_yaw, head_pitch, head_roll]`, all radians in the subject's frame.
/// The platform shortens these lists when the gaze is too steep to measure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GazeReading {
    pub gaze_direction: Vec<f64>,
    pub head_angles: Vec<f64>,
}

impl GazeReading {
    pub fn new(gaze_direction: Vec<f64>, head_angles: Vec<f64>) -> Self {
        Self {
            gaze_direction,
            head_angles,
        }
    }

    /// Reading whose combined eye + head direction is `(yaw, pitch)` in the
    /// crate's convention, split `head_share` to the head and the rest to
    /// the eyes.
    pub fn looking(yaw: Angle, pitch: Angle, head_share: f64) -> Self {
        let native_yaw = -yaw.radians();
        let native_pitch = (pitch - REFERENCE_PITCH).radians();
        let head_yaw = native_yaw * head_share;
        let head_pitch = native_pitch * head_share;
        Self {
            gaze_direction: vec![native_yaw - head_yaw, native_pitch - head_pitch],
            head_angles: vec![head_yaw, head_pitch, 0.0],
        }
    }
}

/// Subject head position in meters, relative to the ground point between
/// the observer's feet. `x` is forward, `y` lateral, `z` height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadLocation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl HeadLocation {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Observer head joint angles in native platform units: yaw positive to
/// the observer's left, pitch positive looking down.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlatformHeadAngles {
    pub yaw: f64,
    pub pitch: f64,
}
