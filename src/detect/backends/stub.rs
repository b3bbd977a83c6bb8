//! Scripted backends for tests and the demo.
//!
//! These decode the scene markers the synthetic camera embeds into its
//! frames (see `capture::synthetic`): byte 0 carries the face count, byte 1
//! the object code. Real frames never carry markers, so the stub backends
//! are only meaningful against `stub://` camera devices.

use anyhow::Result;

use crate::capture::synthetic::{object_label, FACE_COUNT_MARKER, OBJECT_CODE_MARKER};
use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{DetectionList, FaceDetection, ObjectDetection, Rect};

const STUB_CONFIDENCE: f32 = 0.82;

/// Stub object detector: reports the single scripted object, if any.
#[derive(Default)]
pub struct StubObjectBackend;

impl StubObjectBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DetectorBackend for StubObjectBackend {
    fn name(&self) -> &'static str {
        "stub-object"
    }

    fn capability(&self) -> DetectionCapability {
        DetectionCapability::Objects
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionList> {
        let mut list = DetectionList::default();
        let Some(&code) = pixels.get(OBJECT_CODE_MARKER) else {
            return Ok(list);
        };
        if let Some(label) = object_label(code) {
            list.objects.push(ObjectDetection {
                label: label.to_string(),
                bbox: Rect::new(
                    width as f32 * 0.55,
                    height as f32 * 0.6,
                    width as f32 * 0.2,
                    height as f32 * 0.2,
                ),
                confidence: STUB_CONFIDENCE,
            });
        }
        Ok(list)
    }
}

/// Stub face detector: reports as many faces as the scene scripts.
#[derive(Default)]
pub struct StubFaceBackend;

impl StubFaceBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DetectorBackend for StubFaceBackend {
    fn name(&self) -> &'static str {
        "stub-face"
    }

    fn capability(&self) -> DetectionCapability {
        DetectionCapability::Faces
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionList> {
        let mut list = DetectionList::default();
        let Some(&count) = pixels.get(FACE_COUNT_MARKER) else {
            return Ok(list);
        };
        for i in 0..count {
            // Spread the scripted faces across the upper half of the frame.
            let offset = i as f32 * width as f32 * 0.25;
            list.faces.push(FaceDetection {
                bbox: Rect::new(
                    width as f32 * 0.1 + offset,
                    height as f32 * 0.15,
                    width as f32 * 0.18,
                    height as f32 * 0.25,
                ),
            });
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::synthetic::object_code;

    fn frame_pixels(faces: u8, object: Option<&str>) -> Vec<u8> {
        let mut pixels = vec![0u8; 640 * 480 * 3];
        pixels[FACE_COUNT_MARKER] = faces;
        pixels[OBJECT_CODE_MARKER] = object.map(object_code).unwrap_or(0);
        pixels
    }

    #[test]
    fn object_backend_reports_scripted_object() {
        let mut backend = StubObjectBackend::new();
        let list = backend
            .detect(&frame_pixels(1, Some("laptop")), 640, 480)
            .unwrap();
        assert_eq!(list.objects.len(), 1);
        assert_eq!(list.objects[0].label, "laptop");
        assert!(list.faces.is_empty());
    }

    #[test]
    fn object_backend_reports_nothing_for_clean_scene() {
        let mut backend = StubObjectBackend::new();
        let list = backend.detect(&frame_pixels(1, None), 640, 480).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn face_backend_reports_scripted_face_count() {
        let mut backend = StubFaceBackend::new();

        let none = backend.detect(&frame_pixels(0, None), 640, 480).unwrap();
        assert!(none.faces.is_empty());

        let two = backend.detect(&frame_pixels(2, None), 640, 480).unwrap();
        assert_eq!(two.faces.len(), 2);
        assert!(two.objects.is_empty());
    }

    #[test]
    fn backends_tolerate_truncated_frames() {
        let mut objects = StubObjectBackend::new();
        let mut faces = StubFaceBackend::new();
        assert!(objects.detect(&[], 0, 0).unwrap().is_empty());
        assert!(faces.detect(&[], 0, 0).unwrap().is_empty());
    }
}
