pub mod scripted;
pub mod simulated;

pub use scripted::ScriptedPerception;
pub use simulated::{Focus, SimulatedSubject, SimulationConfig};
