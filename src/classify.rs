//! Violation classification rules.
//!
//! `classify` is a pure function from one frame's detections to violation
//! events. Every rule is evaluated independently; several can fire for the
//! same frame, and the classifier carries no state across frames.

use crate::detect::{FaceDetection, ObjectDetection};
use crate::{ViolationEvent, ViolationKind};

/// Object labels treated as a mobile phone.
pub const MOBILE_LABELS: [&str; 2] = ["cell phone", "mobile phone"];

/// Object labels treated as prohibited exam material.
pub const PROHIBITED_LABELS: [&str; 2] = ["book", "laptop"];

/// Map one frame's detections to zero or more violation events.
///
/// Rules, each independently evaluable:
/// - no face in view → `FaceNotVisible`
/// - more than one face → `MultipleFaces`
/// - each mobile-phone object → `MobileDetected` with the label as detail
/// - each prohibited object → `ProhibitedObject` with the label as detail
pub fn classify(objects: &[ObjectDetection], faces: &[FaceDetection]) -> Vec<ViolationEvent> {
    let mut events = Vec::new();

    if faces.is_empty() {
        events.push(ViolationEvent::new(
            ViolationKind::FaceNotVisible,
            "no face in frame",
        ));
    }
    if faces.len() > 1 {
        events.push(ViolationEvent::new(
            ViolationKind::MultipleFaces,
            format!("{} faces in frame", faces.len()),
        ));
    }

    for object in objects {
        let label = object.label.as_str();
        if MOBILE_LABELS.contains(&label) {
            events.push(ViolationEvent::new(ViolationKind::MobileDetected, label));
        }
        if PROHIBITED_LABELS.contains(&label) {
            events.push(ViolationEvent::new(ViolationKind::ProhibitedObject, label));
        }
    }

    events
}
