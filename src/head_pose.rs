//! Observer viewing-axis readout.

use anyhow::{anyhow, Result};

use crate::angle::Angle;
use crate::perception::PerceptionSource;

/// Observer head orientation in the gaze sign convention.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewingAxis {
    pub yaw: Angle,
    pub pitch: Angle,
}

/// Reads the observer's own head orientation and remaps it from native
/// joint units: yaw passes through, pitch is sign-flipped (the platform
/// reports looking down as positive) and shifted by `pitch_offset`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadPoseReader {
    pitch_offset: Angle,
}

impl HeadPoseReader {
    pub fn new(pitch_offset: Angle) -> Self {
        Self { pitch_offset }
    }

    pub fn pitch_offset(&self) -> Angle {
        self.pitch_offset
    }

    /// Fresh read of the observer's viewing axis. Never cached.
    pub fn current_viewing_axis(&self, source: &mut dyn PerceptionSource) -> Result<ViewingAxis> {
        let native = source.observer_head_angles()?;
        if !native.yaw.is_finite() || !native.pitch.is_finite() {
            return Err(anyhow!(
                "{} reported non-finite observer head angles ({}, {})",
                source.name(),
                native.yaw,
                native.pitch
            ));
        }
        Ok(ViewingAxis {
            yaw: Angle::from_radians(native.yaw),
            pitch: self.pitch_offset - Angle::from_radians(native.pitch),
        })
    }
}
