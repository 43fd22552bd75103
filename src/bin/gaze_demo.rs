//! gaze_demo - full session against a simulated subject
//!
//! The subject keeps eye contact through calibration, then stares at one
//! of the candidates for the whole observation window. Ctrl-C closes the
//! window early; whatever was collected so far is still announced.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use gaze_intent::perception::{SimulatedSubject, SimulationConfig};
use gaze_intent::ui::{Phase, Ui, UiMode};
use gaze_intent::{Angle, Candidate, LogSink, Session, SessionConfig, Verdict};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Session config (JSON, or TOML by extension). Falls back to GAZE_CONFIG.
    #[arg(long, env = "GAZE_CONFIG")]
    config: Option<PathBuf>,
    /// Override the observation window, in seconds.
    #[arg(long)]
    window_secs: Option<u64>,
    /// Index of the candidate the simulated subject looks at.
    #[arg(long, default_value_t = 0)]
    target: usize,
    /// Distance from the observer to the fixated point, meters.
    #[arg(long, default_value_t = 0.5)]
    distance: f64,
    /// Systematic pitch error of the simulated platform, degrees.
    #[arg(long, default_value_t = 0.0)]
    pitch_error_deg: f64,
    /// Seed for the simulated subject and prompt shuffling.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Progress output: auto, plain or pretty.
    #[arg(long, value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = Ui::new(args.ui, std::io::stderr().is_terminal());

    let mut cfg = match &args.config {
        Some(path) => SessionConfig::load_from(path)?,
        None => SessionConfig::from_candidates(demo_candidates())?,
    };
    if let Some(seconds) = args.window_secs {
        if seconds == 0 {
            return Err(anyhow!("window-secs must be >= 1"));
        }
        cfg.observation.window = Duration::from_secs(seconds);
    }
    if cfg.calibration.seed.is_none() {
        cfg.calibration.seed = Some(args.seed);
    }

    let target = cfg
        .candidates
        .get(args.target)
        .cloned()
        .ok_or_else(|| {
            anyhow!(
                "target index {} out of range ({} candidates)",
                args.target,
                cfg.candidates.len()
            )
        })?;

    let subject = SimulatedSubject::new(SimulationConfig {
        pitch_error: Angle::from_degrees(args.pitch_error_deg),
        seed: args.seed,
        ..SimulationConfig::default()
    });
    let mut session = Session::new(cfg, subject, LogSink::new())?;

    let stop = session.stop_flag();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .context("error setting Ctrl-C handler")?;

    let stage = ui.stage(Phase::Calibrate);
    session.perception_mut().look_at_observer();
    let bias = session.calibrate()?;
    stage.finish(format_args!(
        "bias {} from {} samples",
        bias.pitch(),
        bias.samples()
    ));

    let stage = ui.stage(Phase::Observe);
    log::info!("subject is looking at the {}", target);
    session
        .perception_mut()
        .look_at_bearing(target.bearing, args.distance);
    let table = session.observe(&bias)?;
    stage.finish(format_args!(
        "{} votes over {} ticks",
        table.total_votes(),
        table.ticks()
    ));

    let stage = ui.stage(Phase::Announce);
    let verdict = session.announce(&table)?;
    stage.finish(match &verdict {
        Verdict::NoEvidence => "no evidence".to_string(),
        Verdict::Guess(winners) => format!("{} candidate(s)", winners.len()),
    });

    match &verdict {
        Verdict::NoEvidence => println!("no guess"),
        Verdict::Guess(winners) => {
            for winner in winners {
                println!(
                    "{} ({:.0}%, {} votes)",
                    winner.candidate,
                    winner.confidence * 100.0,
                    winner.votes
                );
            }
        }
    }
    println!("{}", serde_json::to_string(&verdict)?);
    Ok(())
}

fn demo_candidates() -> Vec<Candidate> {
    [("cup", -40.0), ("book", 0.0), ("ball", 40.0)]
        .into_iter()
        .map(|(label, bearing)| {
            Candidate::new(Angle::from_degrees(bearing))
                .with_label(label)
                .with_pitch(Angle::from_degrees(-25.0))
        })
        .collect()
}
