//! Terminal progress for the demo binary.
//!
//! Each session phase is reported as a stage: a spinner on a terminal,
//! plain `==>` lines otherwise. Both go to stderr so stdout stays free for
//! the verdict.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UiMode {
    #[default]
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    /// Spinners only when stderr is a terminal and plain output was not asked for.
    pub fn is_pretty(&self) -> bool {
        match self.mode {
            UiMode::Plain => false,
            UiMode::Auto | UiMode::Pretty => self.is_tty,
        }
    }

    pub fn stage(&self, phase: Phase) -> StageGuard {
        let spinner = self.is_pretty().then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{}…", phase.doing()));
            spinner
        });
        if spinner.is_none() {
            eprintln!("==> {}", phase.doing());
        }
        StageGuard {
            phase,
            start: Instant::now(),
            spinner,
            outcome: None,
        }
    }
}

/// Session phases reported by the demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Calibrate,
    Observe,
    Announce,
}

impl Phase {
    fn doing(self) -> &'static str {
        match self {
            Phase::Calibrate => "waiting for eye contact",
            Phase::Observe => "watching the subject's gaze",
            Phase::Announce => "announcing the guess",
        }
    }

    fn done(self) -> &'static str {
        match self {
            Phase::Calibrate => "calibrated",
            Phase::Observe => "window closed",
            Phase::Announce => "announced",
        }
    }
}

/// Reports the phase as finished when dropped, with the outcome if one
/// was recorded. An unfinished phase (error path) is marked as such.
pub struct StageGuard {
    phase: Phase,
    start: Instant,
    spinner: Option<ProgressBar>,
    outcome: Option<String>,
}

impl StageGuard {
    /// Record what the phase produced, e.g. the measured bias.
    pub fn finish(mut self, outcome: impl std::fmt::Display) {
        self.outcome = Some(outcome.to_string());
    }

    fn summary(&self, elapsed: Duration) -> String {
        match &self.outcome {
            Some(outcome) => format!(
                "✔ {}: {} ({})",
                self.phase.done(),
                outcome,
                format_duration(elapsed)
            ),
            None => format!(
                "✘ {} interrupted ({})",
                self.phase.doing(),
                format_duration(elapsed)
            ),
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let message = self.summary(self.start.elapsed());
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_needs_a_terminal() {
        assert!(Ui::new(UiMode::Auto, true).is_pretty());
        assert!(!Ui::new(UiMode::Auto, false).is_pretty());
        assert!(!Ui::new(UiMode::Pretty, false).is_pretty());
        assert!(!Ui::new(UiMode::Plain, true).is_pretty());
    }

    #[test]
    fn durations_switch_units_at_one_second() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn summary_names_phase_and_outcome() {
        let mut guard = Ui::new(UiMode::Plain, false).stage(Phase::Calibrate);
        guard.outcome = Some("bias 3.0°".into());
        assert_eq!(
            guard.summary(Duration::from_millis(40)),
            "✔ calibrated: bias 3.0° (40ms)"
        );
        guard.outcome = None;
        assert_eq!(
            guard.summary(Duration::from_millis(40)),
            "✘ waiting for eye contact interrupted (40ms)"
        );
    }
}
