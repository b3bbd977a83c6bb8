use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use proctor_monitor::MonitorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PROCTOR_CONFIG",
        "PROCTOR_CAMERA_DEVICE",
        "PROCTOR_CAMERA_FACING",
        "PROCTOR_FRAME_RATE",
        "PROCTOR_OBJECT_MODEL",
        "PROCTOR_FACE_MODEL",
        "PROCTOR_TOAST_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "device": "/dev/video2",
            "width": 800,
            "height": 600,
            "frame_rate": 24,
            "facing": "environment"
        },
        "detectors": {
            "object_model": "models/objects.onnx",
            "face_model": "models/faces.onnx"
        },
        "alerts": {
            "toast_ms": 5000
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PROCTOR_CONFIG", file.path());
    std::env::set_var("PROCTOR_CAMERA_DEVICE", "stub://candidate");
    std::env::set_var("PROCTOR_TOAST_MS", "1500");

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://candidate");
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.camera.frame_rate, 24);
    assert_eq!(cfg.camera.facing, "environment");
    assert_eq!(cfg.detectors.object_model, "models/objects.onnx");
    assert_eq!(cfg.detectors.face_model, "models/faces.onnx");
    assert_eq!(cfg.alerts.toast_duration, Duration::from_millis(1500));

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://candidate");
    assert_eq!(cfg.camera.width, 640);
    assert_eq!(cfg.camera.height, 480);
    assert_eq!(cfg.camera.frame_rate, 30);
    assert_eq!(cfg.camera.facing, "user");
    assert_eq!(cfg.detectors.object_model, "stub://object-model");
    assert_eq!(cfg.detectors.face_model, "stub://face-model");
    assert_eq!(cfg.alerts.toast_duration, Duration::from_millis(3000));
}

#[test]
fn invalid_env_frame_rate_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PROCTOR_FRAME_RATE", "fast");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("PROCTOR_FRAME_RATE"));

    clear_env();
}

#[test]
fn zero_frame_rate_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PROCTOR_FRAME_RATE", "0");
    assert!(MonitorConfig::load().is_err());

    clear_env();
}
