use anyhow::Result;

use crate::angle::Angle;
use crate::expression::backend::{Cue, ExpressionSink};

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Spoke { text: String, blocking: bool },
    Oriented { yaw: Option<Angle>, pitch: Option<Angle> },
    Cue(Cue),
}

/// Keeps every expression in order for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    expressions: Vec<Expression>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    /// Spoken phrases, in order.
    pub fn phrases(&self) -> Vec<&str> {
        self.expressions
            .iter()
            .filter_map(|expression| match expression {
                Expression::Spoke { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Yaw targets of orient calls that set a yaw, in order.
    pub fn yaw_targets(&self) -> Vec<Angle> {
        self.expressions
            .iter()
            .filter_map(|expression| match expression {
                Expression::Oriented { yaw, .. } => *yaw,
                _ => None,
            })
            .collect()
    }
}

impl ExpressionSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn speak(&mut self, text: &str, blocking: bool) -> Result<()> {
        self.expressions.push(Expression::Spoke {
            text: text.to_string(),
            blocking,
        });
        Ok(())
    }

    fn orient(&mut self, yaw: Option<Angle>, pitch: Option<Angle>) -> Result<()> {
        self.expressions.push(Expression::Oriented { yaw, pitch });
        Ok(())
    }

    fn cue(&mut self, cue: Cue) -> Result<()> {
        self.expressions.push(Expression::Cue(cue));
        Ok(())
    }
}
