use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::angle::Angle;
use crate::calibration::{default_prompts, AcceptanceCone, CalibrationConfig};
use crate::confidence::{Candidate, ConfidenceTable};
use crate::locator::LookPolicy;
use crate::retry::RetryPolicy;

const DEFAULT_ANGLE_TOLERANCE_DEG: f64 = 15.0;
const DEFAULT_WINDOW_SECS: u64 = 15;
const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
const DEFAULT_FIXED_PITCH_CUTOFF_DEG: f64 = 80.0;
const DEFAULT_MIN_SAMPLES: usize = 10;
const DEFAULT_SAMPLES_PER_PROMPT: usize = 10;
const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;
const DEFAULT_CALIBRATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_YAW_CONE_DEG: f64 = 15.0;
const DEFAULT_PITCH_CONE_DEG: f64 = 20.0;
const DEFAULT_CLOSING: &str = "Okay, let's play!";
const DEFAULT_SUBJECT_RETRY_INTERVAL_MS: u64 = 500;
const DEFAULT_SUBJECT_RETRY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRESENTATION_PITCH_DEG: f64 = 15.0;
const DEFAULT_DWELL_MS: u64 = 3000;

#[derive(Debug, Deserialize, Default)]
struct SessionConfigFile {
    candidates: Option<Vec<CandidateConfigFile>>,
    object_angles_file: Option<PathBuf>,
    angle_tolerance_deg: Option<f64>,
    observation: Option<ObservationConfigFile>,
    calibration: Option<CalibrationConfigFile>,
    subject: Option<SubjectConfigFile>,
    platform: Option<PlatformConfigFile>,
    announce: Option<AnnounceConfigFile>,
}

#[derive(Debug, Deserialize)]
struct CandidateConfigFile {
    yaw_deg: f64,
    pitch_deg: Option<f64>,
    label: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ObservationConfigFile {
    window_secs: Option<u64>,
    tick_interval_ms: Option<u64>,
    max_ticks: Option<u64>,
    look_policy: Option<String>,
    fixed_pitch_cutoff_deg: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct CalibrationConfigFile {
    min_samples: Option<usize>,
    samples_per_prompt: Option<usize>,
    sample_interval_ms: Option<u64>,
    timeout_secs: Option<u64>,
    yaw_cone_deg: Option<f64>,
    pitch_cone_deg: Option<f64>,
    subject_name: Option<String>,
    prompts: Option<Vec<String>>,
    closing: Option<String>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SubjectConfigFile {
    retry_interval_ms: Option<u64>,
    retry_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct PlatformConfigFile {
    pitch_offset_deg: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct AnnounceConfigFile {
    presentation_pitch_deg: Option<f64>,
    dwell_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub candidates: Vec<Candidate>,
    pub angle_tolerance: Angle,
    pub observation: ObservationSettings,
    pub calibration: CalibrationConfig,
    pub subject_retry: RetryPolicy,
    pub platform_pitch_offset: Angle,
    pub announce: AnnounceSettings,
}

#[derive(Debug, Clone)]
pub struct ObservationSettings {
    pub window: Duration,
    pub tick_interval: Duration,
    /// Optional cap on sampling ticks, on top of the window.
    pub max_ticks: Option<u64>,
    pub look_policy: LookPolicy,
}

#[derive(Debug, Clone)]
pub struct AnnounceSettings {
    /// Elevation to hold while presenting guesses.
    pub presentation_pitch: Angle,
    /// Pause after presenting each guess.
    pub dwell: Duration,
}

impl SessionConfig {
    /// Load from the file named by `GAZE_CONFIG` (if set), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("GAZE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a specific file, ignoring `GAZE_CONFIG` but still applying
    /// environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults plus environment overrides around a candidate set given in
    /// code.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Result<Self> {
        let mut cfg = Self::from_file(SessionConfigFile::default())?;
        cfg.candidates = candidates;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SessionConfigFile) -> Result<Self> {
        let mut candidates: Vec<Candidate> = file
            .candidates
            .unwrap_or_default()
            .into_iter()
            .map(|c| {
                let mut candidate = Candidate::new(Angle::from_degrees(c.yaw_deg));
                if let Some(pitch) = c.pitch_deg {
                    candidate = candidate.with_pitch(Angle::from_degrees(pitch));
                }
                if let Some(label) = c.label {
                    candidate = candidate.with_label(label);
                }
                candidate
            })
            .collect();
        if let Some(path) = &file.object_angles_file {
            candidates.extend(read_object_angles(path)?);
        }

        let angle_tolerance = Angle::from_degrees(
            file.angle_tolerance_deg
                .unwrap_or(DEFAULT_ANGLE_TOLERANCE_DEG),
        );

        let observation_file = file.observation.unwrap_or_default();
        let look_policy = parse_look_policy(
            observation_file.look_policy.as_deref().unwrap_or("ground_threshold"),
            observation_file
                .fixed_pitch_cutoff_deg
                .unwrap_or(DEFAULT_FIXED_PITCH_CUTOFF_DEG),
        )?;
        let observation = ObservationSettings {
            window: Duration::from_secs(
                observation_file.window_secs.unwrap_or(DEFAULT_WINDOW_SECS),
            ),
            tick_interval: Duration::from_millis(
                observation_file
                    .tick_interval_ms
                    .unwrap_or(DEFAULT_TICK_INTERVAL_MS),
            ),
            max_ticks: observation_file.max_ticks,
            look_policy,
        };

        let calibration_file = file.calibration.unwrap_or_default();
        let calibration = CalibrationConfig {
            cone: AcceptanceCone {
                yaw: Angle::from_degrees(
                    calibration_file.yaw_cone_deg.unwrap_or(DEFAULT_YAW_CONE_DEG),
                ),
                pitch: Angle::from_degrees(
                    calibration_file
                        .pitch_cone_deg
                        .unwrap_or(DEFAULT_PITCH_CONE_DEG),
                ),
            },
            min_samples: calibration_file.min_samples.unwrap_or(DEFAULT_MIN_SAMPLES),
            samples_per_prompt: calibration_file
                .samples_per_prompt
                .unwrap_or(DEFAULT_SAMPLES_PER_PROMPT),
            sample_interval: Duration::from_millis(
                calibration_file
                    .sample_interval_ms
                    .unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS),
            ),
            timeout: Duration::from_secs(
                calibration_file
                    .timeout_secs
                    .unwrap_or(DEFAULT_CALIBRATION_TIMEOUT_SECS),
            ),
            subject_name: calibration_file.subject_name,
            prompts: calibration_file.prompts.unwrap_or_else(default_prompts),
            closing: calibration_file
                .closing
                .unwrap_or_else(|| DEFAULT_CLOSING.to_string()),
            seed: calibration_file.seed,
        };

        let subject_file = file.subject.unwrap_or_default();
        let subject_retry = RetryPolicy::new(
            Duration::from_millis(
                subject_file
                    .retry_interval_ms
                    .unwrap_or(DEFAULT_SUBJECT_RETRY_INTERVAL_MS),
            ),
            Duration::from_secs(
                subject_file
                    .retry_timeout_secs
                    .unwrap_or(DEFAULT_SUBJECT_RETRY_TIMEOUT_SECS),
            ),
        );

        let platform_pitch_offset = Angle::from_degrees(
            file.platform
                .and_then(|platform| platform.pitch_offset_deg)
                .unwrap_or(0.0),
        );

        let announce_file = file.announce.unwrap_or_default();
        let announce = AnnounceSettings {
            presentation_pitch: Angle::from_degrees(
                announce_file
                    .presentation_pitch_deg
                    .unwrap_or(DEFAULT_PRESENTATION_PITCH_DEG),
            ),
            dwell: Duration::from_millis(announce_file.dwell_ms.unwrap_or(DEFAULT_DWELL_MS)),
        };

        Ok(Self {
            candidates,
            angle_tolerance,
            observation,
            calibration,
            subject_retry,
            platform_pitch_offset,
            announce,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(tolerance) = std::env::var("GAZE_ANGLE_TOLERANCE_DEG") {
            let degrees: f64 = tolerance
                .trim()
                .parse()
                .map_err(|_| anyhow!("GAZE_ANGLE_TOLERANCE_DEG must be a number of degrees"))?;
            self.angle_tolerance = Angle::from_degrees(degrees);
        }
        if let Ok(window) = std::env::var("GAZE_WINDOW_SECS") {
            let seconds: u64 = window.trim().parse().map_err(|_| {
                anyhow!("GAZE_WINDOW_SECS must be an integer number of seconds")
            })?;
            self.observation.window = Duration::from_secs(seconds);
        }
        if let Ok(min_samples) = std::env::var("GAZE_MIN_SAMPLES") {
            self.calibration.min_samples = min_samples
                .trim()
                .parse()
                .map_err(|_| anyhow!("GAZE_MIN_SAMPLES must be a positive integer"))?;
        }
        if let Ok(policy) = std::env::var("GAZE_LOOK_POLICY") {
            if !policy.trim().is_empty() {
                let cutoff = match self.observation.look_policy {
                    LookPolicy::FixedPitch { cutoff } => cutoff.degrees(),
                    LookPolicy::GroundThreshold => DEFAULT_FIXED_PITCH_CUTOFF_DEG,
                };
                self.observation.look_policy = parse_look_policy(policy.trim(), cutoff)?;
            }
        }
        if let Ok(timeout) = std::env::var("GAZE_CALIBRATION_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("GAZE_CALIBRATION_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.calibration.timeout = Duration::from_secs(seconds);
        }
        if let Ok(name) = std::env::var("GAZE_SUBJECT_NAME") {
            if !name.trim().is_empty() {
                self.calibration.subject_name = Some(name.trim().to_string());
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        ConfidenceTable::new(self.candidates.clone(), self.angle_tolerance)
            .context("invalid candidate configuration")?;
        if self.observation.window.is_zero() {
            return Err(anyhow!("observation window must be greater than zero"));
        }
        if self.calibration.min_samples == 0 {
            return Err(anyhow!("calibration min_samples must be >= 1"));
        }
        if self.calibration.samples_per_prompt == 0 {
            return Err(anyhow!("calibration samples_per_prompt must be >= 1"));
        }
        if self.calibration.prompts.is_empty() {
            return Err(anyhow!("calibration needs at least one prompt"));
        }
        if self.calibration.timeout.is_zero() {
            return Err(anyhow!("calibration timeout must be greater than zero"));
        }
        if self.calibration.cone.yaw <= Angle::ZERO || self.calibration.cone.pitch <= Angle::ZERO
        {
            return Err(anyhow!("calibration acceptance cone must be wider than zero"));
        }
        Ok(())
    }
}

/// Parse the legacy candidate file: one `yaw, pitch` pair per line, in
/// radians. Blank lines and `#` comments are skipped.
pub fn read_object_angles(path: &Path) -> Result<Vec<Candidate>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read object angles {}: {}", path.display(), e))?;
    parse_object_angles(&raw).with_context(|| format!("in {}", path.display()))
}

pub fn parse_object_angles(raw: &str) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split(',').map(str::trim);
        let (Some(yaw), Some(pitch), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(anyhow!(
                "line {}: expected `yaw, pitch`, got {:?}",
                index + 1,
                line
            ));
        };
        let yaw: f64 = yaw
            .parse()
            .map_err(|_| anyhow!("line {}: invalid yaw {:?}", index + 1, yaw))?;
        let pitch: f64 = pitch
            .parse()
            .map_err(|_| anyhow!("line {}: invalid pitch {:?}", index + 1, pitch))?;
        candidates.push(
            Candidate::new(Angle::from_radians(yaw)).with_pitch(Angle::from_radians(pitch)),
        );
    }
    Ok(candidates)
}

fn parse_look_policy(value: &str, cutoff_deg: f64) -> Result<LookPolicy> {
    match value {
        "ground_threshold" => Ok(LookPolicy::GroundThreshold),
        "fixed_pitch" => Ok(LookPolicy::FixedPitch {
            cutoff: Angle::from_degrees(cutoff_deg),
        }),
        other => Err(anyhow!(
            "unknown look policy {:?} (expected ground_threshold or fixed_pitch)",
            other
        )),
    }
}

fn read_config_file(path: &Path) -> Result<SessionConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_object_angles() -> Result<()> {
        let candidates = parse_object_angles("# yaw, pitch\n0.52, -0.1\n\n-0.35,0.0\n")?;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].bearing.radians(), 0.52);
        assert_eq!(candidates[0].pitch, Some(Angle::from_radians(-0.1)));
        assert_eq!(candidates[1].bearing.radians(), -0.35);
        Ok(())
    }

    #[test]
    fn legacy_parse_errors_name_the_line() {
        let err = parse_object_angles("0.1, 0.2\n0.3\n").expect_err("bad line");
        assert!(err.to_string().contains("line 2"));
        assert!(parse_object_angles("abc, 0.2").is_err());
        assert!(parse_object_angles("0.1, 0.2, 0.3").is_err());
    }

    #[test]
    fn look_policy_names() -> Result<()> {
        assert_eq!(
            parse_look_policy("ground_threshold", 80.0)?,
            LookPolicy::GroundThreshold
        );
        assert_eq!(
            parse_look_policy("fixed_pitch", 70.0)?,
            LookPolicy::FixedPitch {
                cutoff: Angle::from_degrees(70.0)
            }
        );
        assert!(parse_look_policy("sideways", 70.0).is_err());
        Ok(())
    }

    #[test]
    fn defaults_fill_missing_sections() -> Result<()> {
        let file: SessionConfigFile =
            serde_json::from_str(r#"{ "candidates": [ { "yaw_deg": 10.0 } ] }"#)?;
        let cfg = SessionConfig::from_file(file)?;
        cfg.validate()?;
        assert_eq!(cfg.candidates.len(), 1);
        assert!((cfg.angle_tolerance.degrees() - 15.0).abs() < 1e-9);
        assert_eq!(cfg.observation.window, Duration::from_secs(15));
        assert_eq!(cfg.observation.look_policy, LookPolicy::GroundThreshold);
        assert_eq!(cfg.calibration.min_samples, 10);
        assert_eq!(cfg.calibration.closing, "Okay, let's play!");
        assert!(!cfg.calibration.prompts.is_empty());
        Ok(())
    }

    #[test]
    fn validation_rejects_empty_candidates() -> Result<()> {
        let cfg = SessionConfig::from_file(SessionConfigFile::default())?;
        assert!(cfg.validate().is_err());
        Ok(())
    }
}
