use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::angle::{Angle, REFERENCE_PITCH};
use crate::perception::backend::PerceptionSource;
use crate::perception::reading::{GazeReading, HeadLocation, PlatformHeadAngles, SubjectId};

/// Share of a gaze direction the simulated subject turns their head for.
const HEAD_SHARE: f64 = 0.7;

/// What the simulated subject is looking at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Focus {
    /// Eye contact with the observer.
    Observer,
    /// A point on the object plane, observer frame, meters.
    PlanePoint { x: f64, y: f64 },
    /// Somewhere above the observer.
    Away,
}

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub subject: SubjectId,
    pub head: HeadLocation,
    /// Systematic offset the platform adds to every measured pitch.
    pub pitch_error: Angle,
    /// Half-width of the uniform noise added to both gaze axes.
    pub noise: Angle,
    /// Probability that a gaze lookup fails to resolve the subject.
    pub dropout: f64,
    pub observer: PlatformHeadAngles,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            subject: SubjectId(1),
            head: HeadLocation::new(1.0, 0.0, 1.1),
            pitch_error: Angle::ZERO,
            noise: Angle::from_degrees(2.0),
            dropout: 0.05,
            observer: PlatformHeadAngles::default(),
            seed: 7,
        }
    }
}

/// Geometric stand-in for a person sitting across a table from the
/// observer. Produces the raw readings a real platform would report for
/// the current [`Focus`], including a systematic pitch error.
pub struct SimulatedSubject {
    config: SimulationConfig,
    rng: StdRng,
    focus: Focus,
    gaze_reads: u64,
}

impl SimulatedSubject {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            focus: Focus::Observer,
            gaze_reads: 0,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        log::debug!("simulated subject focus -> {:?}", focus);
        self.focus = focus;
    }

    pub fn look_at_observer(&mut self) {
        self.set_focus(Focus::Observer);
    }

    /// Look at the plane point `distance` meters from the observer along
    /// `bearing`.
    pub fn look_at_bearing(&mut self, bearing: Angle, distance: f64) {
        let b = bearing.radians();
        self.set_focus(Focus::PlanePoint {
            x: distance * b.cos(),
            y: distance * b.sin(),
        });
    }

    pub fn gaze_reads(&self) -> u64 {
        self.gaze_reads
    }

    /// True gaze direction for the current focus, in the crate's convention
    /// and free of observer motion.
    fn world_gaze(&self) -> (Angle, Angle) {
        let head = self.config.head;
        match self.focus {
            Focus::Observer => (Angle::ZERO, REFERENCE_PITCH),
            Focus::Away => (Angle::ZERO, REFERENCE_PITCH + Angle::from_degrees(35.0)),
            Focus::PlanePoint { x, y } => {
                let forward = head.x - x;
                let pitch = forward.atan2(head.z);
                let yaw = if forward.abs() < f64::EPSILON {
                    0.0
                } else {
                    ((y - head.y) / forward).atan()
                };
                (Angle::from_radians(yaw), Angle::from_radians(pitch))
            }
        }
    }

    fn jitter(&mut self) -> Angle {
        let half_width = self.config.noise.radians().abs();
        if half_width == 0.0 {
            return Angle::ZERO;
        }
        Angle::from_radians(self.rng.gen_range(-half_width..=half_width))
    }
}

impl PerceptionSource for SimulatedSubject {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn subject_ids(&mut self) -> Result<Vec<SubjectId>> {
        Ok(vec![self.config.subject])
    }

    fn gaze_and_head_angles(&mut self, subject: SubjectId) -> Result<Option<GazeReading>> {
        self.gaze_reads += 1;
        if subject != self.config.subject {
            return Ok(None);
        }
        if self.rng.gen_bool(self.config.dropout.clamp(0.0, 1.0)) {
            return Ok(None);
        }

        let (yaw, pitch) = self.world_gaze();
        let observer = self.config.observer;
        let raw_yaw = yaw + Angle::from_radians(observer.yaw) + self.jitter();
        let raw_pitch = pitch - Angle::from_radians(observer.pitch)
            + self.config.pitch_error
            + self.jitter();
        Ok(Some(GazeReading::looking(raw_yaw, raw_pitch, HEAD_SHARE)))
    }

    fn head_location(&mut self, subject: SubjectId) -> Result<Option<HeadLocation>> {
        if subject != self.config.subject {
            return Ok(None);
        }
        Ok(Some(self.config.head))
    }

    fn observer_head_angles(&mut self) -> Result<PlatformHeadAngles> {
        Ok(self.config.observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SimulationConfig {
        SimulationConfig {
            pitch_error: Angle::ZERO,
            noise: Angle::ZERO,
            dropout: 0.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn observer_focus_reads_reference_pitch() -> Result<()> {
        let mut subject = SimulatedSubject::new(quiet());
        let reading = subject
            .gaze_and_head_angles(SubjectId(1))?
            .expect("reading");
        let pitch = reading.gaze_direction[1] + reading.head_angles[1];
        assert!(pitch.abs() < 1e-12, "native pitch is relative to level");
        Ok(())
    }

    #[test]
    fn unknown_subject_is_not_resolved() -> Result<()> {
        let mut subject = SimulatedSubject::new(quiet());
        assert!(subject.gaze_and_head_angles(SubjectId(99))?.is_none());
        assert!(subject.head_location(SubjectId(99))?.is_none());
        Ok(())
    }
}
