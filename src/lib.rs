//! Gaze Intent
//!
//! Infers which of several known objects a person is thinking about by
//! watching where they look.
//!
//! # Architecture
//!
//! A session runs three phases against one subject:
//!
//! 1. **Calibrate**: prompt for eye contact and average the pitch error of
//!    gaze samples that land inside an acceptance cone.
//! 2. **Observe**: every tick, compensate the subject's gaze for the
//!    observer's own head pose and the calibrated bias, back-project it
//!    onto the object plane, and vote for the candidates near the
//!    resulting bearing.
//! 3. **Announce**: normalize the votes and present the best guess(es).
//!
//! # Module Structure
//!
//! - `angle`: radian angles, wrap-around and conversions
//! - `perception`: Perception Source boundary, subject tracking, backends
//! - `expression`: Expression Sink boundary and backends
//! - `head_pose`, `gaze`, `calibration`, `locator`, `confidence`: pipeline stages
//! - `config`, `session`: configuration and orchestration

pub mod angle;
pub mod calibration;
pub mod confidence;
pub mod config;
pub mod expression;
pub mod gaze;
pub mod head_pose;
pub mod locator;
pub mod perception;
pub mod retry;
pub mod session;
pub mod ui;

pub use angle::{normalize_to_pi, Angle, REFERENCE_PITCH};
pub use calibration::{
    AcceptanceCone, CalibrationBias, CalibrationConfig, PitchBiasCalibrator, PitchSum,
};
pub use confidence::{Candidate, ConfidenceTable, NormalizedTable, Verdict, Winner};
pub use config::SessionConfig;
pub use expression::{Cue, ExpressionSink, LogSink, RecordingSink};
pub use gaze::{GazeEstimator, GazeVector};
pub use head_pose::{HeadPoseReader, ViewingAxis};
pub use locator::{FixationPoint, LookPolicy, ObjectPlaneLocator};
pub use perception::{
    GazeReading, HeadLocation, PerceptionSource, PlatformHeadAngles, ScriptedPerception,
    SimulatedSubject, SimulationConfig, SubjectId, SubjectTracker,
};
pub use retry::RetryPolicy;
pub use session::Session;
