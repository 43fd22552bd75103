//! Expression Sink boundary.
//!
//! Everything the observer says or does toward the subject goes through
//! [`ExpressionSink`]. Prompt wording has no meaning to the algorithms; it
//! exists to draw the subject's eyes.

mod backend;
pub mod backends;

pub use backend::{Cue, ExpressionSink};
pub use backends::{Expression, LogSink, RecordingSink};
