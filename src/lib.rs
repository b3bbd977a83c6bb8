//! Exam Proctoring Monitor
//!
//! This crate implements the frame-detection pipeline and
//! violation-classification engine for an online examination tool.
//!
//! # Architecture
//!
//! Frames flow from the camera through the detection loop into the
//! classifier, which feeds the ledger and the alert throttle; the overlay
//! renderer hangs off the loop for visual feedback only.
//!
//! - `capture`: camera sources (V4L2, synthetic) producing `Frame`s
//! - `detect`: object and face detector backends behind `DetectorBackend`
//! - `classify`: pure per-frame violation classification
//! - `ledger`: shared atomic violation counters
//! - `alert`: throttling of user-visible notifications
//! - `overlay`: cosmetic bounding-box rendering
//! - `monitor`: lifecycle controller and detection loop
//!
//! # Resource discipline
//!
//! The lifecycle controller acquires the camera, then the object detector,
//! then the face detector. Every exit path (normal stop, acquisition
//! failure) releases them in reverse order, each exactly once. The loop
//! never has two iterations in flight, and the violation ledger is the only
//! shared mutable state between components.

use serde::{Deserialize, Serialize};

pub mod alert;
pub mod capture;
pub mod classify;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ledger;
pub mod monitor;
pub mod overlay;
pub mod ui;

pub use alert::{AlertThrottle, Notifier, DEFAULT_TOAST_DURATION};
pub use capture::{CameraConfig, CameraSource, CameraStats, CameraTrack};
pub use classify::{classify, MOBILE_LABELS, PROHIBITED_LABELS};
pub use config::{AlertSettings, DetectorSettings, MonitorConfig};
pub use detect::{
    DetectionCapability, DetectionList, DetectorBackend, DetectorHandle, DetectorSet,
    FaceDetection, ObjectDetection, Rect,
};
pub use frame::Frame;
pub use ledger::{LedgerSnapshot, ViolationLedger};
pub use monitor::{Monitor, MonitorHandle, MonitorState, MonitorStats};
pub use overlay::OverlayRenderer;

// -------------------- Violation Types --------------------

/// Exam-integrity violation kinds. Closed set; the ledger and the alert
/// throttle both index by it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    FaceNotVisible,
    MultipleFaces,
    MobileDetected,
    ProhibitedObject,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 4] = [
        ViolationKind::FaceNotVisible,
        ViolationKind::MultipleFaces,
        ViolationKind::MobileDetected,
        ViolationKind::ProhibitedObject,
    ];

    /// Stable snake_case label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::FaceNotVisible => "face_not_visible",
            ViolationKind::MultipleFaces => "multiple_faces",
            ViolationKind::MobileDetected => "mobile_detected",
            ViolationKind::ProhibitedObject => "prohibited_object",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            ViolationKind::FaceNotVisible => 0,
            ViolationKind::MultipleFaces => 1,
            ViolationKind::MobileDetected => 2,
            ViolationKind::ProhibitedObject => 3,
        }
    }
}

/// One classified violation for one frame. Emitted fresh every frame the
/// condition holds; never retained across frames.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViolationEvent {
    pub kind: ViolationKind,
    pub detail: String,
}

impl ViolationEvent {
    pub fn new(kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Alert title shown to the candidate.
    pub fn alert_title(&self) -> &'static str {
        match self.kind {
            ViolationKind::FaceNotVisible => "Face Not Visible",
            ViolationKind::MultipleFaces => "Multiple Faces Detected",
            ViolationKind::MobileDetected => "Mobile Phone Detected",
            ViolationKind::ProhibitedObject => "Prohibited Object Detected",
        }
    }

    /// Alert body shown to the candidate.
    pub fn alert_message(&self) -> String {
        match self.kind {
            ViolationKind::FaceNotVisible => "Please stay within camera view".to_string(),
            ViolationKind::MultipleFaces => "Only one person should be visible".to_string(),
            ViolationKind::MobileDetected => {
                "Mobile phones are not allowed during the test".to_string()
            }
            ViolationKind::ProhibitedObject => {
                format!("{} is not allowed during the test", self.detail)
            }
        }
    }
}

// -------------------- Errors --------------------

/// Error kinds surfaced by the monitor.
///
/// Acquisition-phase kinds (`CameraAccess`, `ModelLoad`) are fatal to the
/// session instance and recoverable only through a caller-driven reload.
/// `FrameNotReady` and `DetectionInference` are transient and never
/// propagate past the loop iteration that observed them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorErrorKind {
    CameraAccess,
    ModelLoad,
    FrameNotReady,
    DetectionInference,
}

impl MonitorErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            MonitorErrorKind::CameraAccess => "camera_access",
            MonitorErrorKind::ModelLoad => "model_load",
            MonitorErrorKind::FrameNotReady => "frame_not_ready",
            MonitorErrorKind::DetectionInference => "detection_inference",
        }
    }
}

/// Typed monitor error carried inside `anyhow::Error`.
///
/// Callers that need the kind downcast with `MonitorError::kind_of`.
#[derive(Clone, Debug)]
pub struct MonitorError {
    pub kind: MonitorErrorKind,
    pub message: String,
}

impl MonitorError {
    pub fn new(kind: MonitorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn camera_access(message: impl Into<String>) -> Self {
        Self::new(MonitorErrorKind::CameraAccess, message)
    }

    pub fn model_load(message: impl Into<String>) -> Self {
        Self::new(MonitorErrorKind::ModelLoad, message)
    }

    pub fn frame_not_ready(message: impl Into<String>) -> Self {
        Self::new(MonitorErrorKind::FrameNotReady, message)
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::new(MonitorErrorKind::DetectionInference, message)
    }

    /// Kind of `err` if it carries a `MonitorError`.
    pub fn kind_of(err: &anyhow::Error) -> Option<MonitorErrorKind> {
        err.downcast_ref::<MonitorError>().map(|e| e.kind)
    }
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for MonitorError {}
