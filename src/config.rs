use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::alert::DEFAULT_TOAST_DURATION;
use crate::capture::CameraConfig;

const DEFAULT_CAMERA_DEVICE: &str = "stub://candidate";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_CAMERA_FRAME_RATE: u32 = 30;
const DEFAULT_CAMERA_FACING: &str = "user";
const DEFAULT_OBJECT_MODEL: &str = "stub://object-model";
const DEFAULT_FACE_MODEL: &str = "stub://face-model";

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    camera: Option<CameraConfigFile>,
    detectors: Option<DetectorConfigFile>,
    alerts: Option<AlertConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    frame_rate: Option<u32>,
    facing: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    object_model: Option<String>,
    face_model: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    toast_ms: Option<u64>,
}

/// Detector model selection. `stub://` models load the scripted backends;
/// anything else is an ONNX path for the tract backend.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub object_model: String,
    pub face_model: String,
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    /// Toast lifetime, and the minimum interval before the same alert
    /// re-appears.
    pub toast_duration: Duration,
}

/// Full monitor configuration: defaults, overlaid by an optional JSON
/// config file (`PROCTOR_CONFIG`), overlaid by environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub camera: CameraConfig,
    pub detectors: DetectorSettings,
    pub alerts: AlertSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_file(MonitorConfigFile::default())
    }
}

impl MonitorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PROCTOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let camera = CameraConfig {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
            frame_rate: file
                .camera
                .as_ref()
                .and_then(|camera| camera.frame_rate)
                .unwrap_or(DEFAULT_CAMERA_FRAME_RATE),
            facing: file
                .camera
                .and_then(|camera| camera.facing)
                .unwrap_or_else(|| DEFAULT_CAMERA_FACING.to_string()),
        };
        let detectors = DetectorSettings {
            object_model: file
                .detectors
                .as_ref()
                .and_then(|detectors| detectors.object_model.clone())
                .unwrap_or_else(|| DEFAULT_OBJECT_MODEL.to_string()),
            face_model: file
                .detectors
                .and_then(|detectors| detectors.face_model)
                .unwrap_or_else(|| DEFAULT_FACE_MODEL.to_string()),
        };
        let alerts = AlertSettings {
            toast_duration: file
                .alerts
                .and_then(|alerts| alerts.toast_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TOAST_DURATION),
        };
        Self {
            camera,
            detectors,
            alerts,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("PROCTOR_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(facing) = std::env::var("PROCTOR_CAMERA_FACING") {
            if !facing.trim().is_empty() {
                self.camera.facing = facing;
            }
        }
        if let Ok(frame_rate) = std::env::var("PROCTOR_FRAME_RATE") {
            let parsed: u32 = frame_rate
                .parse()
                .map_err(|_| anyhow!("PROCTOR_FRAME_RATE must be an integer frame rate"))?;
            self.camera.frame_rate = parsed;
        }
        if let Ok(model) = std::env::var("PROCTOR_OBJECT_MODEL") {
            if !model.trim().is_empty() {
                self.detectors.object_model = model;
            }
        }
        if let Ok(model) = std::env::var("PROCTOR_FACE_MODEL") {
            if !model.trim().is_empty() {
                self.detectors.face_model = model;
            }
        }
        if let Ok(toast_ms) = std::env::var("PROCTOR_TOAST_MS") {
            let parsed: u64 = toast_ms
                .parse()
                .map_err(|_| anyhow!("PROCTOR_TOAST_MS must be an integer number of ms"))?;
            self.alerts.toast_duration = Duration::from_millis(parsed);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        if self.camera.frame_rate == 0 {
            return Err(anyhow!("camera frame_rate must be greater than zero"));
        }
        if !matches!(self.camera.facing.as_str(), "user" | "environment") {
            return Err(anyhow!(
                "camera facing must be \"user\" or \"environment\", got {:?}",
                self.camera.facing
            ));
        }
        if self.detectors.object_model.trim().is_empty()
            || self.detectors.face_model.trim().is_empty()
        {
            return Err(anyhow!("detector model paths must not be empty"));
        }
        if self.alerts.toast_duration.is_zero() {
            return Err(anyhow!("alert toast duration must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_session_contract() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.camera.height, 480);
        assert_eq!(cfg.camera.frame_rate, 30);
        assert_eq!(cfg.camera.facing, "user");
        assert_eq!(cfg.alerts.toast_duration, DEFAULT_TOAST_DURATION);
    }

    #[test]
    fn validate_rejects_zero_frame_rate() {
        let mut cfg = MonitorConfig::default();
        cfg.camera.frame_rate = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_facing() {
        let mut cfg = MonitorConfig::default();
        cfg.camera.facing = "sideways".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_model_path() {
        let mut cfg = MonitorConfig::default();
        cfg.detectors.face_model = "  ".to_string();
        assert!(cfg.validate().is_err());
    }
}
