//! Pitch-bias calibration.
//!
//! The platform's vertical gaze angle carries a per-person offset. While
//! the observer talks to the subject (who is then assumed to look at the
//! observer's head) gaze samples inside an acceptance cone are averaged and
//! the offset is their deviation from [`REFERENCE_PITCH`].

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

use crate::angle::{Angle, REFERENCE_PITCH};
use crate::expression::{Cue, ExpressionSink};
use crate::gaze::{GazeEstimator, GazeVector};
use crate::perception::{PerceptionSource, SubjectTracker};

/// Measured pitch offset of one subject. Only obtainable from accepted
/// samples, so holding one proves calibration ran.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationBias {
    pitch: Angle,
    samples: usize,
}

impl CalibrationBias {
    /// `mean(pitches) - REFERENCE_PITCH`. Fails on an empty slice.
    pub fn from_accepted_pitches(pitches: &[Angle]) -> Result<Self> {
        let mut sum = PitchSum::default();
        for &pitch in pitches {
            sum.add(pitch);
        }
        sum.bias()
    }

    /// Offset added to every compensated pitch reading.
    pub fn pitch(&self) -> Angle {
        self.pitch
    }

    /// Number of accepted samples the offset was averaged from.
    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// Running sum of accepted pitches.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PitchSum {
    sum: f64,
    count: usize,
}

impl PitchSum {
    pub fn add(&mut self, pitch: Angle) {
        self.sum += pitch.radians();
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn bias(&self) -> Result<CalibrationBias> {
        if self.count == 0 {
            return Err(anyhow!("no accepted gaze samples to calibrate from"));
        }
        let mean = Angle::from_radians(self.sum / self.count as f64);
        Ok(CalibrationBias {
            pitch: mean - REFERENCE_PITCH,
            samples: self.count,
        })
    }
}

/// Yaw/pitch window around "looking at the observer's head".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcceptanceCone {
    pub yaw: Angle,
    pub pitch: Angle,
}

impl Default for AcceptanceCone {
    fn default() -> Self {
        Self {
            yaw: Angle::from_degrees(15.0),
            pitch: Angle::from_degrees(20.0),
        }
    }
}

impl AcceptanceCone {
    pub fn accepts(&self, gaze: &GazeVector) -> bool {
        gaze.yaw.abs() < self.yaw && (gaze.pitch - REFERENCE_PITCH).abs() < self.pitch
    }
}

#[derive(Clone, Debug)]
pub struct CalibrationConfig {
    pub cone: AcceptanceCone,
    /// Accepted samples required before the bias is computed.
    pub min_samples: usize,
    /// Gaze reads taken while each prompt is spoken.
    pub samples_per_prompt: usize,
    pub sample_interval: Duration,
    /// Overall bound; calibration fails once it passes.
    pub timeout: Duration,
    /// Used to get the subject's attention before sampling.
    pub subject_name: Option<String>,
    pub prompts: Vec<String>,
    pub closing: String,
    /// Seed for prompt reshuffles; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            cone: AcceptanceCone::default(),
            min_samples: 10,
            samples_per_prompt: 10,
            sample_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            subject_name: None,
            prompts: default_prompts(),
            closing: "Okay, let's play!".to_string(),
            seed: None,
        }
    }
}

pub fn default_prompts() -> Vec<String> {
    [
        "Are you ready to play?",
        "Think of one of the objects on the table.",
        "Don't tell me which one.",
        "Just keep it in mind while we talk.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub struct PitchBiasCalibrator {
    config: CalibrationConfig,
    estimator: GazeEstimator,
    rng: StdRng,
}

impl PitchBiasCalibrator {
    pub fn new(config: CalibrationConfig, estimator: GazeEstimator) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            estimator,
            rng,
        }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Run the prompt-and-sample routine until enough accepted samples
    /// are collected. Blocks the caller for its duration.
    ///
    /// Subject loss mid-routine is recovered through `tracker`. Fails when
    /// the timeout passes first.
    pub fn calibrate(
        &mut self,
        source: &mut dyn PerceptionSource,
        sink: &mut dyn ExpressionSink,
        tracker: &mut SubjectTracker,
    ) -> Result<CalibrationBias> {
        if self.config.prompts.is_empty() {
            return Err(anyhow!("calibration needs at least one prompt"));
        }
        if self.config.min_samples == 0 {
            return Err(anyhow!("calibration min_samples must be >= 1"));
        }

        let deadline = Instant::now() + self.config.timeout;
        if tracker.subject_within(source, remaining(deadline))?.is_none() {
            return Err(self.non_convergence(PitchSum::default()));
        }
        sink.cue(Cue::Listening)?;

        if let Some(name) = self.config.subject_name.clone() {
            sink.speak(&format!("Hey {}?", name), false)?;
        }
        let mut sum = self.await_eye_contact(source, tracker, deadline, PitchSum::default())?;

        let mut prompts = self.config.prompts.clone();
        let mut round = 0u32;
        while sum.count() < self.config.min_samples {
            if round > 0 {
                prompts.shuffle(&mut self.rng);
                log::debug!("calibration round {}: prompts reshuffled", round + 1);
            }
            for prompt in &prompts {
                if Instant::now() >= deadline {
                    return Err(self.non_convergence(sum));
                }
                sink.speak(prompt, false)?;
                sum = self.sample_window(source, tracker, deadline, sum)?;
                log::debug!(
                    "calibration: {}/{} samples accepted",
                    sum.count(),
                    self.config.min_samples
                );
                if sum.count() >= self.config.min_samples {
                    break;
                }
            }
            round += 1;
        }

        let bias = sum.bias()?;
        log::info!(
            "calibrated pitch bias {} from {} samples over {} round(s)",
            bias.pitch(),
            bias.samples(),
            round.max(1)
        );
        sink.cue(Cue::Calibrated)?;
        sink.speak(&self.config.closing, true)?;
        Ok(bias)
    }

    /// Sample until the first accepted reading.
    fn await_eye_contact(
        &mut self,
        source: &mut dyn PerceptionSource,
        tracker: &mut SubjectTracker,
        deadline: Instant,
        mut sum: PitchSum,
    ) -> Result<PitchSum> {
        let before = sum.count();
        while sum.count() == before {
            if Instant::now() >= deadline {
                return Err(self.non_convergence(sum));
            }
            sum = self.sample_once(source, tracker, deadline, sum)?;
        }
        Ok(sum)
    }

    /// Take `samples_per_prompt` reads while a prompt is spoken.
    fn sample_window(
        &mut self,
        source: &mut dyn PerceptionSource,
        tracker: &mut SubjectTracker,
        deadline: Instant,
        mut sum: PitchSum,
    ) -> Result<PitchSum> {
        for _ in 0..self.config.samples_per_prompt {
            if Instant::now() >= deadline {
                break;
            }
            sum = self.sample_once(source, tracker, deadline, sum)?;
        }
        Ok(sum)
    }

    fn sample_once(
        &mut self,
        source: &mut dyn PerceptionSource,
        tracker: &mut SubjectTracker,
        deadline: Instant,
        mut sum: PitchSum,
    ) -> Result<PitchSum> {
        // the caller turns a missed deadline into non-convergence
        let Some(subject) = tracker.subject_within(source, remaining(deadline))? else {
            return Ok(sum);
        };
        match self.estimator.raw_gaze(source, subject)? {
            Some(gaze) if self.config.cone.accepts(&gaze) => sum.add(gaze.pitch),
            Some(_) => {}
            None => tracker.invalidate(),
        }
        if !self.config.sample_interval.is_zero() {
            std::thread::sleep(self.config.sample_interval);
        }
        Ok(sum)
    }

    fn non_convergence(&self, sum: PitchSum) -> anyhow::Error {
        anyhow!(
            "calibration did not converge: {} of {} samples accepted within {:?}",
            sum.count(),
            self.config.min_samples,
            self.config.timeout
        )
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
