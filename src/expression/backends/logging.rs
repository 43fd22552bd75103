use anyhow::Result;

use crate::angle::Angle;
use crate::expression::backend::{Cue, ExpressionSink};

/// Writes every expression to the log instead of a body.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl ExpressionSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn speak(&mut self, text: &str, blocking: bool) -> Result<()> {
        log::info!("say{}: {}", if blocking { "" } else { " (async)" }, text);
        Ok(())
    }

    fn orient(&mut self, yaw: Option<Angle>, pitch: Option<Angle>) -> Result<()> {
        match (yaw, pitch) {
            (Some(yaw), Some(pitch)) => log::info!("orient yaw={} pitch={}", yaw, pitch),
            (Some(yaw), None) => log::info!("orient yaw={}", yaw),
            (None, Some(pitch)) => log::info!("orient pitch={}", pitch),
            (None, None) => {}
        }
        Ok(())
    }

    fn cue(&mut self, cue: Cue) -> Result<()> {
        log::info!("cue {:?}", cue);
        Ok(())
    }
}
