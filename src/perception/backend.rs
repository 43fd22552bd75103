use anyhow::Result;

use super::reading::{GazeReading, HeadLocation, PlatformHeadAngles, SubjectId};

/// Sensor platform that reports tracked subjects and the observer's own pose.
///
/// Lookups keyed by a [`SubjectId`] return `Ok(None)` when the platform no
/// longer resolves that subject. That outcome is transient and recovered by
/// re-acquiring an id. `Err` is reserved for failures of the platform itself.
pub trait PerceptionSource: Send {
    /// Source identifier.
    fn name(&self) -> &'static str;

    /// Subjects currently tracked, best candidate first. Empty when nobody
    /// is tracked.
    fn subject_ids(&mut self) -> Result<Vec<SubjectId>>;

    /// Raw eye-direction and head-orientation components for a subject.
    fn gaze_and_head_angles(&mut self, subject: SubjectId) -> Result<Option<GazeReading>>;

    /// Head position of a subject relative to the observer's ground point.
    fn head_location(&mut self, subject: SubjectId) -> Result<Option<HeadLocation>>;

    /// Observer head orientation in the platform's native units.
    fn observer_head_angles(&mut self) -> Result<PlatformHeadAngles>;

    /// Begin publishing gaze data. Called once before calibration.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Stop publishing gaze data. Called once the observation window closes.
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
