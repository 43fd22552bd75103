//! Perception Source boundary.
//!
//! The sensing platform is reached only through [`PerceptionSource`]. The
//! rest of the crate never holds a global handle to it; each session owns
//! its source and lends it to the components that need a reading.

mod backend;
pub mod backends;
mod reading;
mod subject;

pub use backend::PerceptionSource;
pub use backends::{Focus, ScriptedPerception, SimulatedSubject, SimulationConfig};
pub use reading::{GazeReading, HeadLocation, PlatformHeadAngles, SubjectId};
pub use subject::SubjectTracker;
