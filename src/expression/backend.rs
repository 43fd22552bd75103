use anyhow::Result;

use crate::angle::Angle;

/// Non-verbal feedback the observer can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Calibration sampling has started.
    Listening,
    /// Calibration finished.
    Calibrated,
}

/// Observer embodiment: speech and viewing-axis control.
pub trait ExpressionSink: Send {
    /// Sink identifier.
    fn name(&self) -> &'static str;

    /// Say `text`. With `blocking == false` the call returns as soon as
    /// speech has started.
    fn speak(&mut self, text: &str, blocking: bool) -> Result<()>;

    /// Turn the viewing axis. `None` leaves that axis where it is.
    fn orient(&mut self, yaw: Option<Angle>, pitch: Option<Angle>) -> Result<()>;

    /// Optional visual feedback hook.
    fn cue(&mut self, _cue: Cue) -> Result<()> {
        Ok(())
    }
}
