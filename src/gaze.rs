//! Subject gaze estimation.
//!
//! Combines the eye and head contributions the platform reports into one
//! direction and, once a [`CalibrationBias`] exists, removes the observer's
//! own head motion and applies the measured pitch offset.

use anyhow::Result;

use crate::angle::{Angle, REFERENCE_PITCH};
use crate::calibration::CalibrationBias;
use crate::head_pose::HeadPoseReader;
use crate::perception::{GazeReading, PerceptionSource, SubjectId};

/// Direction a subject is looking. Yaw is positive to the subject's right;
/// pitch is [`REFERENCE_PITCH`] when level with the observer's head.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GazeVector {
    pub yaw: Angle,
    pub pitch: Angle,
}

impl GazeVector {
    pub fn new(yaw: Angle, pitch: Angle) -> Self {
        Self { yaw, pitch }
    }

    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }
}

/// Combine a raw platform reading. `None` when either component list is
/// too short, which the platform produces for gazes too steep to measure.
pub fn combine_reading(reading: &GazeReading) -> Option<GazeVector> {
    let (&[eye_yaw, eye_pitch, ..], &[head_yaw, head_pitch, ..]) = (
        reading.gaze_direction.as_slice(),
        reading.head_angles.as_slice(),
    ) else {
        return None;
    };
    let gaze = GazeVector {
        // the platform's yaw is mirrored relative to the subject's right
        yaw: Angle::from_radians(-(eye_yaw + head_yaw)),
        pitch: Angle::from_radians(eye_pitch + head_pitch) + REFERENCE_PITCH,
    };
    gaze.is_finite().then_some(gaze)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GazeEstimator {
    head_pose: HeadPoseReader,
}

impl GazeEstimator {
    pub fn new(head_pose: HeadPoseReader) -> Self {
        Self { head_pose }
    }

    pub fn head_pose(&self) -> &HeadPoseReader {
        &self.head_pose
    }

    /// Gaze relative to the observer's current viewing axis, uncorrected.
    ///
    /// `Ok(None)` means the subject could not be read this time and the
    /// caller should re-acquire the subject id.
    pub fn raw_gaze(
        &self,
        source: &mut dyn PerceptionSource,
        subject: SubjectId,
    ) -> Result<Option<GazeVector>> {
        let Some(reading) = source.gaze_and_head_angles(subject)? else {
            log::debug!("{}: no gaze reading", subject);
            return Ok(None);
        };
        let gaze = combine_reading(&reading);
        if gaze.is_none() {
            log::debug!("{}: malformed gaze reading {:?}", subject, reading);
        }
        Ok(gaze)
    }

    /// Gaze in the observer's fixed frame with the calibrated pitch offset
    /// added. `Ok(None)` under the same conditions as
    /// [`raw_gaze`](Self::raw_gaze).
    pub fn compensated_gaze(
        &self,
        source: &mut dyn PerceptionSource,
        subject: SubjectId,
        bias: &CalibrationBias,
    ) -> Result<Option<GazeVector>> {
        let Some(raw) = self.raw_gaze(source, subject)? else {
            return Ok(None);
        };
        let axis = self.head_pose.current_viewing_axis(source)?;
        Ok(Some(GazeVector {
            yaw: raw.yaw - axis.yaw,
            pitch: raw.pitch - axis.pitch + bias.pitch(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{PlatformHeadAngles, ScriptedPerception};

    const EPS: f64 = 1e-12;

    #[test]
    fn combines_eye_and_head() {
        let reading = GazeReading::new(vec![0.1, -0.2], vec![0.05, -0.1, 0.3]);
        let gaze = combine_reading(&reading).expect("well formed");
        assert!((gaze.yaw.radians() + 0.15).abs() < EPS);
        assert!((gaze.pitch.radians() - (REFERENCE_PITCH.radians() - 0.3)).abs() < EPS);
    }

    #[test]
    fn short_component_lists_are_rejected() {
        assert!(combine_reading(&GazeReading::new(vec![0.1], vec![0.0, 0.0, 0.0])).is_none());
        assert!(combine_reading(&GazeReading::new(vec![0.1, 0.2], vec![])).is_none());
    }

    #[test]
    fn non_finite_components_are_rejected() {
        let reading = GazeReading::new(vec![f64::NAN, 0.0], vec![0.0, 0.0, 0.0]);
        assert!(combine_reading(&reading).is_none());
    }

    #[test]
    fn looking_reading_round_trips() {
        let yaw = Angle::from_degrees(12.0);
        let pitch = Angle::from_degrees(40.0);
        let gaze = combine_reading(&GazeReading::looking(yaw, pitch, 0.6)).expect("gaze");
        assert!((gaze.yaw - yaw).radians().abs() < EPS);
        assert!((gaze.pitch - pitch).radians().abs() < EPS);
    }

    #[test]
    fn compensation_removes_observer_motion_and_adds_bias() -> Result<()> {
        let raw_pitch = Angle::from_degrees(50.0);
        let mut source = ScriptedPerception::new()
            .with_observer_angles(PlatformHeadAngles {
                yaw: 0.1,
                pitch: -0.05,
            })
            .with_fallback_gaze(GazeReading::looking(Angle::from_radians(0.4), raw_pitch, 0.5));
        let bias = CalibrationBias::from_accepted_pitches(&[Angle::from_degrees(93.0)])?;
        let estimator = GazeEstimator::default();

        let gaze = estimator
            .compensated_gaze(&mut source, SubjectId(1), &bias)?
            .expect("gaze");

        assert!((gaze.yaw.radians() - 0.3).abs() < 1e-9);
        let expected = raw_pitch.radians() - 0.05 + Angle::from_degrees(3.0).radians();
        assert!((gaze.pitch.radians() - expected).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn lost_subject_yields_none() -> Result<()> {
        let mut source = ScriptedPerception::new();
        source.push_lost();
        let estimator = GazeEstimator::default();
        assert!(estimator.raw_gaze(&mut source, SubjectId(1))?.is_none());
        Ok(())
    }

    #[test]
    fn positive_bias_raises_pitch() -> Result<()> {
        let raw_pitch = Angle::from_degrees(50.0);
        let mut source = ScriptedPerception::new()
            .with_fallback_gaze(GazeReading::looking(Angle::ZERO, raw_pitch, 0.5));
        let bias = CalibrationBias::from_accepted_pitches(&[Angle::from_degrees(93.0)])?;

        let gaze = GazeEstimator::default()
            .compensated_gaze(&mut source, SubjectId(1), &bias)?
            .expect("gaze");

        assert!((gaze.pitch.degrees() - 53.0).abs() < 1e-9);
        Ok(())
    }
}
