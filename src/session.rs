//! Session orchestration.
//!
//! A session owns one Perception Source and one Expression Sink and runs
//! the three phases in order:
//!
//! 1. calibrate: measure the subject's pitch bias
//! 2. observe: sample, back-project and vote until the window closes
//! 3. announce: present the winning candidate(s)
//!
//! Everything runs on the caller's thread. The tick loop stops at the
//! window deadline, at the optional tick cap, or when the stop flag is
//! raised from elsewhere.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::calibration::{CalibrationBias, PitchBiasCalibrator};
use crate::confidence::{ConfidenceTable, NormalizedTable, Verdict};
use crate::config::SessionConfig;
use crate::expression::ExpressionSink;
use crate::gaze::GazeEstimator;
use crate::head_pose::HeadPoseReader;
use crate::locator::{FixationPoint, ObjectPlaneLocator};
use crate::perception::{PerceptionSource, SubjectTracker};

const NO_EVIDENCE_PHRASE: &str = "I couldn't tell which object you were thinking of.";

pub struct Session<P: PerceptionSource, E: ExpressionSink> {
    config: SessionConfig,
    perception: P,
    expression: E,
    tracker: SubjectTracker,
    estimator: GazeEstimator,
    locator: ObjectPlaneLocator,
    stop: Arc<AtomicBool>,
}

impl<P: PerceptionSource, E: ExpressionSink> Session<P, E> {
    pub fn new(config: SessionConfig, perception: P, expression: E) -> Result<Self> {
        // reject bad candidate sets before anyone is prompted
        ConfidenceTable::new(config.candidates.clone(), config.angle_tolerance)?;
        let estimator = GazeEstimator::new(HeadPoseReader::new(config.platform_pitch_offset));
        let locator = ObjectPlaneLocator::new(config.observation.look_policy);
        let tracker = SubjectTracker::new(config.subject_retry);
        Ok(Self {
            config,
            perception,
            expression,
            tracker,
            estimator,
            locator,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an externally owned stop flag (e.g. set from a signal handler).
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn perception(&self) -> &P {
        &self.perception
    }

    pub fn perception_mut(&mut self) -> &mut P {
        &mut self.perception
    }

    pub fn expression(&self) -> &E {
        &self.expression
    }

    pub fn tracker(&self) -> &SubjectTracker {
        &self.tracker
    }

    /// Calibrate, observe, announce.
    pub fn run(&mut self) -> Result<Verdict> {
        let bias = self.calibrate()?;
        let table = self.observe(&bias)?;
        self.announce(&table)
    }

    pub fn calibrate(&mut self) -> Result<CalibrationBias> {
        self.perception.start()?;
        let mut calibrator =
            PitchBiasCalibrator::new(self.config.calibration.clone(), self.estimator);
        calibrator.calibrate(&mut self.perception, &mut self.expression, &mut self.tracker)
    }

    /// Run the observation window and return the normalized table.
    pub fn observe(&mut self, bias: &CalibrationBias) -> Result<NormalizedTable> {
        let settings = self.config.observation.clone();
        let mut table =
            ConfidenceTable::new(self.config.candidates.clone(), self.config.angle_tolerance)?;
        let deadline = Instant::now() + settings.window;
        log::info!(
            "observing for {:?} ({} candidates, tolerance {})",
            settings.window,
            table.len(),
            table.tolerance()
        );

        let watched = self.watch(&mut table, bias, deadline);
        let stopped = self.perception.stop();
        watched?;
        stopped?;

        log::info!(
            "window closed after {} ticks, {} with a fixation",
            table.ticks(),
            table.fixations()
        );
        for (candidate, votes) in table.votes() {
            log::info!("  {}: {} votes", candidate, votes);
        }
        Ok(table.normalize())
    }

    fn watch(
        &mut self,
        table: &mut ConfidenceTable,
        bias: &CalibrationBias,
        deadline: Instant,
    ) -> Result<()> {
        let settings = &self.config.observation;
        let (max_ticks, tick_interval) = (settings.max_ticks, settings.tick_interval);
        while Instant::now() < deadline && !self.stop.load(Ordering::SeqCst) {
            if max_ticks.is_some_and(|max| table.ticks() >= max) {
                break;
            }
            self.tick(table, bias, deadline)?;
            if !tick_interval.is_zero() {
                std::thread::sleep(tick_interval);
            }
        }
        Ok(())
    }

    /// One sampling tick. Subject loss skips the tick and drops the
    /// subject id so the next tick re-acquires it. Re-acquisition never
    /// outlasts `deadline`.
    pub fn tick(
        &mut self,
        table: &mut ConfidenceTable,
        bias: &CalibrationBias,
        deadline: Instant,
    ) -> Result<Option<FixationPoint>> {
        let limit = deadline.saturating_duration_since(Instant::now());
        let Some(subject) = self.tracker.subject_within(&mut self.perception, limit)? else {
            log::warn!("no subject in view, skipping tick");
            table.record_tick(None);
            return Ok(None);
        };
        let Some(gaze) = self
            .estimator
            .compensated_gaze(&mut self.perception, subject, bias)?
        else {
            self.tracker.invalidate();
            table.record_tick(None);
            return Ok(None);
        };
        let head = self.perception.head_location(subject)?;
        if head.is_none() {
            self.tracker.invalidate();
        }

        let fixation = self.locator.locate(Some(gaze), head);
        let voted = table.record_tick(fixation.map(|point| point.yaw));
        if let Some(point) = &fixation {
            log::debug!(
                "fixation ({:.2}, {:.2}) bearing {} -> {} vote(s)",
                point.x,
                point.y,
                point.yaw,
                voted
            );
        }
        Ok(fixation)
    }

    /// Present the outcome through the Expression Sink.
    pub fn announce(&mut self, table: &NormalizedTable) -> Result<Verdict> {
        let verdict = table.verdict();
        match &verdict {
            Verdict::NoEvidence => {
                log::warn!("no evidence collected over {} ticks", table.ticks());
                self.expression.speak(NO_EVIDENCE_PHRASE, true)?;
            }
            Verdict::Guess(winners) => {
                for (candidate, value) in table.values() {
                    log::info!("  {}: {:.0}%", candidate, value * 100.0);
                }
                self.expression
                    .orient(None, Some(self.config.announce.presentation_pitch))?;
                for winner in winners {
                    let percent = (winner.confidence * 100.0).round();
                    log::info!("guess: {} ({}%)", winner.candidate, percent);
                    self.expression
                        .orient(Some(winner.candidate.bearing), winner.candidate.pitch)?;
                    self.expression.speak(
                        &format!(
                            "Are you thinking of the {}? I'm {}% confident.",
                            winner.candidate, percent
                        ),
                        true,
                    )?;
                    if !self.config.announce.dwell.is_zero() {
                        std::thread::sleep(self.config.announce.dwell);
                    }
                }
            }
        }
        Ok(verdict)
    }
}
