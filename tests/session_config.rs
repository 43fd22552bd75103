use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};

use gaze_intent::config::SessionConfig;
use gaze_intent::{Angle, LookPolicy};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "GAZE_CONFIG",
        "GAZE_ANGLE_TOLERANCE_DEG",
        "GAZE_WINDOW_SECS",
        "GAZE_MIN_SAMPLES",
        "GAZE_LOOK_POLICY",
        "GAZE_CALIBRATION_TIMEOUT_SECS",
        "GAZE_SUBJECT_NAME",
    ] {
        std::env::remove_var(key);
    }
}

fn approx(angle: Angle, degrees: f64) -> bool {
    (angle.degrees() - degrees).abs() < 1e-9
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "candidates": [
            { "yaw_deg": -30.0, "label": "cup" },
            { "yaw_deg": 25.0, "pitch_deg": -20.0, "label": "ball" }
        ],
        "angle_tolerance_deg": 12.0,
        "observation": {
            "window_secs": 20,
            "tick_interval_ms": 50,
            "max_ticks": 400,
            "look_policy": "fixed_pitch",
            "fixed_pitch_cutoff_deg": 70.0
        },
        "calibration": {
            "min_samples": 6,
            "prompts": ["Look at me!"],
            "seed": 42
        },
        "platform": { "pitch_offset_deg": 2.5 }
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("GAZE_CONFIG", file.path());
    std::env::set_var("GAZE_WINDOW_SECS", "8");
    std::env::set_var("GAZE_SUBJECT_NAME", "Robin");

    let cfg = SessionConfig::load().expect("load config");

    assert_eq!(cfg.candidates.len(), 2);
    assert_eq!(cfg.candidates[0].label.as_deref(), Some("cup"));
    assert!(approx(cfg.candidates[0].bearing, -30.0));
    assert!(cfg.candidates[0].pitch.is_none());
    assert!(approx(cfg.candidates[1].pitch.expect("pitch"), -20.0));
    assert!(approx(cfg.angle_tolerance, 12.0));
    assert_eq!(cfg.observation.window, Duration::from_secs(8));
    assert_eq!(cfg.observation.tick_interval, Duration::from_millis(50));
    assert_eq!(cfg.observation.max_ticks, Some(400));
    match cfg.observation.look_policy {
        LookPolicy::FixedPitch { cutoff } => assert!(approx(cutoff, 70.0)),
        other => panic!("unexpected policy {:?}", other),
    }
    assert_eq!(cfg.calibration.min_samples, 6);
    assert_eq!(cfg.calibration.prompts, vec!["Look at me!".to_string()]);
    assert_eq!(cfg.calibration.seed, Some(42));
    assert_eq!(cfg.calibration.subject_name.as_deref(), Some("Robin"));
    assert_eq!(cfg.calibration.timeout, Duration::from_secs(30));
    assert!(approx(cfg.platform_pitch_offset, 2.5));

    clear_env();
}

#[test]
fn loads_toml_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
angle_tolerance_deg = 10.0

[[candidates]]
yaw_deg = 0.0

[[candidates]]
yaw_deg = 45.0
label = "block"

[calibration]
timeout_secs = 12
"#;
    file.write_all(toml.as_bytes()).expect("write config");

    let cfg = SessionConfig::load_from(file.path()).expect("load config");

    assert_eq!(cfg.candidates.len(), 2);
    assert_eq!(cfg.candidates[1].label.as_deref(), Some("block"));
    assert!(approx(cfg.angle_tolerance, 10.0));
    assert_eq!(cfg.calibration.timeout, Duration::from_secs(12));
    assert_eq!(cfg.observation.look_policy, LookPolicy::GroundThreshold);
    assert_eq!(cfg.observation.window, Duration::from_secs(15));

    clear_env();
}

#[test]
fn legacy_object_angles_file_adds_candidates() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut angles = NamedTempFile::new().expect("temp angles");
    angles
        .write_all(b"# yaw, pitch (radians)\n0.5, -0.3\n-0.5, -0.3\n")
        .expect("write angles");

    let mut file = NamedTempFile::new().expect("temp config");
    let json = format!(
        r#"{{ "object_angles_file": "{}" }}"#,
        angles.path().display()
    );
    file.write_all(json.as_bytes()).expect("write config");

    let cfg = SessionConfig::load_from(file.path()).expect("load config");

    assert_eq!(cfg.candidates.len(), 2);
    assert_eq!(cfg.candidates[0].bearing.radians(), 0.5);
    assert_eq!(cfg.candidates[1].pitch, Some(Angle::from_radians(-0.3)));

    clear_env();
}

#[test]
fn rejects_invalid_settings() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut duplicate = NamedTempFile::new().expect("temp config");
    duplicate
        .write_all(br#"{ "candidates": [ { "yaw_deg": 10.0 }, { "yaw_deg": 10.0 } ] }"#)
        .expect("write config");
    assert!(SessionConfig::load_from(duplicate.path()).is_err());

    let mut zero_window = NamedTempFile::new().expect("temp config");
    zero_window
        .write_all(br#"{ "candidates": [ { "yaw_deg": 0.0 } ], "observation": { "window_secs": 0 } }"#)
        .expect("write config");
    assert!(SessionConfig::load_from(zero_window.path()).is_err());

    let mut ok = NamedTempFile::new().expect("temp config");
    ok.write_all(br#"{ "candidates": [ { "yaw_deg": 0.0 } ] }"#)
        .expect("write config");
    std::env::set_var("GAZE_LOOK_POLICY", "straight_down");
    assert!(SessionConfig::load_from(ok.path()).is_err());
    std::env::set_var("GAZE_LOOK_POLICY", "fixed_pitch");
    std::env::set_var("GAZE_MIN_SAMPLES", "0");
    assert!(SessionConfig::load_from(ok.path()).is_err());
    std::env::remove_var("GAZE_MIN_SAMPLES");
    let cfg = SessionConfig::load_from(ok.path()).expect("fixed pitch policy");
    assert!(matches!(
        cfg.observation.look_policy,
        LookPolicy::FixedPitch { .. }
    ));

    clear_env();
}
