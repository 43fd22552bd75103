use anyhow::Result;
use std::collections::VecDeque;

use crate::perception::backend::PerceptionSource;
use crate::perception::reading::{GazeReading, HeadLocation, PlatformHeadAngles, SubjectId};

/// Replays queued readings. Used by tests to drive exact sequences.
///
/// Queued gaze readings and head locations are consumed one per call; once
/// a queue is empty the configured fallback is returned (none by default,
/// which reads as "subject lost").
#[derive(Debug, Default)]
pub struct ScriptedPerception {
    subjects: Vec<SubjectId>,
    absent_polls: u32,
    vanish_after: Option<u64>,
    subject_polls: u64,
    gaze: VecDeque<Option<GazeReading>>,
    fallback_gaze: Option<GazeReading>,
    locations: VecDeque<Option<HeadLocation>>,
    fallback_location: Option<HeadLocation>,
    observer: PlatformHeadAngles,
    gaze_reads: u64,
    started: bool,
    stopped: bool,
}

impl ScriptedPerception {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects(mut self, subjects: Vec<SubjectId>) -> Self {
        self.subjects = subjects;
        self
    }

    /// Report nobody tracked for the first `polls` subject queries.
    pub fn with_absent_polls(mut self, polls: u32) -> Self {
        self.absent_polls = polls;
        self
    }

    /// Report nobody tracked once `polls` subject queries have been made.
    pub fn with_vanish_after(mut self, polls: u64) -> Self {
        self.vanish_after = Some(polls);
        self
    }

    pub fn with_fallback_gaze(mut self, reading: GazeReading) -> Self {
        self.fallback_gaze = Some(reading);
        self
    }

    pub fn with_head_location(mut self, location: HeadLocation) -> Self {
        self.fallback_location = Some(location);
        self
    }

    pub fn with_observer_angles(mut self, angles: PlatformHeadAngles) -> Self {
        self.observer = angles;
        self
    }

    pub fn push_gaze(&mut self, reading: GazeReading) -> &mut Self {
        self.gaze.push_back(Some(reading));
        self
    }

    /// Queue a gaze lookup that fails to resolve the subject.
    pub fn push_lost(&mut self) -> &mut Self {
        self.gaze.push_back(None);
        self
    }

    pub fn push_location(&mut self, location: Option<HeadLocation>) -> &mut Self {
        self.locations.push_back(location);
        self
    }

    pub fn subject_polls(&self) -> u64 {
        self.subject_polls
    }

    pub fn gaze_reads(&self) -> u64 {
        self.gaze_reads
    }

    pub fn pending_gaze(&self) -> usize {
        self.gaze.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl PerceptionSource for ScriptedPerception {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn subject_ids(&mut self) -> Result<Vec<SubjectId>> {
        self.subject_polls += 1;
        if self
            .vanish_after
            .is_some_and(|polls| self.subject_polls > polls)
        {
            return Ok(Vec::new());
        }
        if self.absent_polls > 0 {
            self.absent_polls -= 1;
            return Ok(Vec::new());
        }
        Ok(self.subjects.clone())
    }

    fn gaze_and_head_angles(&mut self, _subject: SubjectId) -> Result<Option<GazeReading>> {
        self.gaze_reads += 1;
        Ok(match self.gaze.pop_front() {
            Some(reading) => reading,
            None => self.fallback_gaze.clone(),
        })
    }

    fn head_location(&mut self, _subject: SubjectId) -> Result<Option<HeadLocation>> {
        Ok(match self.locations.pop_front() {
            Some(location) => location,
            None => self.fallback_location,
        })
    }

    fn observer_head_angles(&mut self) -> Result<PlatformHeadAngles> {
        Ok(self.observer)
    }

    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stopped = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_drains_queue_then_falls_back() -> Result<()> {
        let fallback = GazeReading::new(vec![0.1, 0.2], vec![0.0, 0.0, 0.0]);
        let mut source = ScriptedPerception::new()
            .with_subjects(vec![SubjectId(1)])
            .with_fallback_gaze(fallback.clone());
        source.push_lost();

        assert_eq!(source.gaze_and_head_angles(SubjectId(1))?, None);
        assert_eq!(source.gaze_and_head_angles(SubjectId(1))?, Some(fallback));
        assert_eq!(source.gaze_reads(), 2);
        Ok(())
    }
}
