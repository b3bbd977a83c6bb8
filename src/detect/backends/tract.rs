#![cfg(feature = "backend-tract")]

//! Tract-based backend for ONNX inference (feature: backend-tract).
//!
//! Loads a local model file and runs it on RGB frames. The model is expected
//! to carry its own post-processing: output shape `[1, N, 6]` with rows
//! `(x, y, w, h, score, class)` for object models, `[1, N, 5]` without the
//! class column for face models. Rows below the confidence threshold are
//! dropped.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{DetectionList, FaceDetection, ObjectDetection, Rect};

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// COCO class labels, indexed by model class id.
const COCO_LABELS: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
    capability: DetectionCapability,
    width: u32,
    height: u32,
    confidence_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        capability: DetectionCapability,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            capability,
            width,
            height,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn decode_rows(&self, outputs: TVec<TValue>) -> Result<DetectionList> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let shape = view.shape();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(anyhow!("unexpected output shape {:?}", shape));
        }
        let columns = shape[2];
        let min_columns = match self.capability {
            DetectionCapability::Objects => 6,
            DetectionCapability::Faces => 5,
        };
        if columns < min_columns {
            return Err(anyhow!(
                "output rows carry {} columns, need {}",
                columns,
                min_columns
            ));
        }

        let mut list = DetectionList::default();
        for row in view.index_axis(tract_ndarray::Axis(0), 0).outer_iter() {
            let score = row[4];
            if !score.is_finite() || score < self.confidence_threshold {
                continue;
            }
            let bbox = Rect::new(row[0], row[1], row[2], row[3]);
            match self.capability {
                DetectionCapability::Objects => {
                    let class_id = row[5] as usize;
                    let label = COCO_LABELS
                        .get(class_id)
                        .copied()
                        .unwrap_or("unknown")
                        .to_string();
                    list.objects.push(ObjectDetection {
                        label,
                        bbox,
                        confidence: score,
                    });
                }
                DetectionCapability::Faces => {
                    list.faces.push(FaceDetection { bbox });
                }
            }
        }
        Ok(list)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn capability(&self) -> DetectionCapability {
        self.capability
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionList> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode_rows(outputs)
    }
}
