//! Cosmetic detection overlay.
//!
//! Draws one rectangle per face (green stroke) and one labelled rectangle
//! per object (red stroke) onto an RGBA canvas that the host UI composites
//! over the video surface. The previous overlay is cleared on every frame.
//! Drawing never affects classification or the ledger; anything that cannot
//! be drawn (empty canvas, out-of-range box) is skipped silently.

use image::{Rgba, RgbaImage};

use crate::detect::{FaceDetection, ObjectDetection, Rect};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const FACE_STROKE: Rgba<u8> = Rgba([0, 255, 0, 255]);
const OBJECT_STROKE: Rgba<u8> = Rgba([255, 0, 0, 255]);
const STROKE_WIDTH: i64 = 2;

const LABEL_HEIGHT: i64 = 12;
const LABEL_CHAR_WIDTH: i64 = 7;

/// Per-frame bounding-box renderer.
pub struct OverlayRenderer {
    canvas: RgbaImage,
}

impl OverlayRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
        }
    }

    /// Clear the previous overlay and draw this frame's detections.
    pub fn render(&mut self, objects: &[ObjectDetection], faces: &[FaceDetection]) {
        if self.canvas.width() == 0 || self.canvas.height() == 0 {
            return;
        }
        self.clear();

        for face in faces {
            self.stroke_rect(&face.bbox, FACE_STROKE);
        }
        for object in objects {
            self.stroke_rect(&object.bbox, OBJECT_STROKE);
            self.draw_label_tag(object);
            log::trace!(
                "overlay: {} at ({:.0},{:.0}) conf={:.2}",
                object.label,
                object.bbox.x,
                object.bbox.y,
                object.confidence
            );
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    fn stroke_rect(&mut self, rect: &Rect, color: Rgba<u8>) {
        if !rect.w.is_finite() || !rect.h.is_finite() || rect.w <= 0.0 || rect.h <= 0.0 {
            return;
        }
        let x0 = rect.x as i64;
        let y0 = rect.y as i64;
        let x1 = (rect.x + rect.w) as i64;
        let y1 = (rect.y + rect.h) as i64;

        for inset in 0..STROKE_WIDTH {
            self.horizontal_line(x0, x1, y0 + inset, color);
            self.horizontal_line(x0, x1, y1 - inset, color);
            self.vertical_line(x0 + inset, y0, y1, color);
            self.vertical_line(x1 - inset, y0, y1, color);
        }
    }

    /// Filled tag strip above the box marking a labelled object; the label
    /// text itself goes to the trace log.
    fn draw_label_tag(&mut self, object: &ObjectDetection) {
        let width = object.label.len() as i64 * LABEL_CHAR_WIDTH;
        let x0 = object.bbox.x as i64;
        let y1 = object.bbox.y as i64;
        let y0 = if y1 >= LABEL_HEIGHT { y1 - LABEL_HEIGHT } else { 0 };
        for y in y0..y1 {
            self.horizontal_line(x0, x0 + width, y, OBJECT_STROKE);
        }
    }

    fn horizontal_line(&mut self, x0: i64, x1: i64, y: i64, color: Rgba<u8>) {
        let (width, height) = (self.canvas.width() as i64, self.canvas.height() as i64);
        if y < 0 || y >= height {
            return;
        }
        for x in x0.max(0)..=x1.min(width - 1) {
            self.canvas.put_pixel(x as u32, y as u32, color);
        }
    }

    fn vertical_line(&mut self, x: i64, y0: i64, y1: i64, color: Rgba<u8>) {
        let (width, height) = (self.canvas.width() as i64, self.canvas.height() as i64);
        if x < 0 || x >= width {
            return;
        }
        for y in y0.max(0)..=y1.min(height - 1) {
            self.canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f32, y: f32) -> FaceDetection {
        FaceDetection {
            bbox: Rect::new(x, y, 40.0, 50.0),
        }
    }

    fn object(label: &str, x: f32, y: f32) -> ObjectDetection {
        ObjectDetection {
            label: label.to_string(),
            bbox: Rect::new(x, y, 60.0, 30.0),
            confidence: 0.8,
        }
    }

    #[test]
    fn faces_and_objects_use_distinct_stroke_colors() {
        let mut overlay = OverlayRenderer::new(640, 480);
        overlay.render(&[object("book", 200.0, 200.0)], &[face(20.0, 30.0)]);

        assert_eq!(*overlay.canvas().get_pixel(20, 30), FACE_STROKE);
        assert_eq!(*overlay.canvas().get_pixel(200, 200), OBJECT_STROKE);
    }

    #[test]
    fn render_clears_the_previous_frame() {
        let mut overlay = OverlayRenderer::new(640, 480);
        overlay.render(&[], &[face(20.0, 30.0)]);
        assert_eq!(*overlay.canvas().get_pixel(20, 30), FACE_STROKE);

        overlay.render(&[], &[]);
        assert_eq!(*overlay.canvas().get_pixel(20, 30), TRANSPARENT);
    }

    #[test]
    fn out_of_range_boxes_degrade_silently() {
        let mut overlay = OverlayRenderer::new(64, 64);
        overlay.render(
            &[object("laptop", -500.0, 1_000_000.0)],
            &[face(f32::NAN, 10.0), face(63.0, 63.0)],
        );
    }

    #[test]
    fn zero_size_canvas_never_panics() {
        let mut overlay = OverlayRenderer::new(0, 0);
        overlay.render(&[object("book", 1.0, 1.0)], &[face(1.0, 1.0)]);
    }

    #[test]
    fn label_tag_is_drawn_above_the_object_box() {
        let mut overlay = OverlayRenderer::new(640, 480);
        overlay.render(&[object("laptop", 100.0, 100.0)], &[]);
        assert_eq!(*overlay.canvas().get_pixel(105, 95), OBJECT_STROKE);
    }
}
