pub mod logging;
pub mod recording;

pub use logging::LogSink;
pub use recording::{Expression, RecordingSink};
