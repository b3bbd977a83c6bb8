//! Synthetic camera for tests and the demo.
//!
//! Device strings select a scripted scene:
//!
//! - `stub://empty-room`: no face in view
//! - `stub://candidate`: one compliant candidate (default for unknown names)
//! - `stub://two-faces`: a second person in view
//! - `stub://candidate-phone` / `stub://candidate-handset`: candidate plus a
//!   cell phone / mobile phone
//! - `stub://candidate-book`, `stub://candidate-laptop`: prohibited objects
//! - `stub://candidate-bottle`: a benign object
//! - `stub://denied`, `stub://absent`: open failures (permission denied,
//!   no device)
//!
//! Query parameters tune readiness behaviour: `?warmup=N` makes the first N
//! captures report `FrameNotReady` (stream not yet decodable), `?stall=N`
//! makes every N-th capture report `FrameNotReady`.
//!
//! The scene is embedded into the generated pixels as two marker bytes
//! (face count, object code); the stub detector backends decode the same
//! markers. The rest of the frame is pattern fill that varies per capture.

use anyhow::Result;

use super::camera::{CameraConfig, CameraStats};
use crate::frame::Frame;
use crate::MonitorError;

/// Byte offsets of the scene markers inside a synthetic frame.
pub(crate) const FACE_COUNT_MARKER: usize = 0;
pub(crate) const OBJECT_CODE_MARKER: usize = 1;

const OBJECT_LABELS: [&str; 5] = ["cell phone", "mobile phone", "book", "laptop", "bottle"];

/// Marker code for an object label; 0 means no object.
pub(crate) fn object_code(label: &str) -> u8 {
    OBJECT_LABELS
        .iter()
        .position(|&l| l == label)
        .map(|i| i as u8 + 1)
        .unwrap_or(0)
}

/// Object label for a marker code.
pub(crate) fn object_label(code: u8) -> Option<&'static str> {
    match code {
        0 => None,
        c => OBJECT_LABELS.get(c as usize - 1).copied(),
    }
}

const DEFAULT_WARMUP_FRAMES: u32 = 2;

#[derive(Clone, Copy, Debug)]
struct SceneSpec {
    faces: u8,
    object: Option<&'static str>,
}

fn scene_for(name: &str) -> SceneSpec {
    match name {
        "empty-room" => SceneSpec {
            faces: 0,
            object: None,
        },
        "two-faces" => SceneSpec {
            faces: 2,
            object: None,
        },
        "candidate-phone" => SceneSpec {
            faces: 1,
            object: Some("cell phone"),
        },
        "candidate-handset" => SceneSpec {
            faces: 1,
            object: Some("mobile phone"),
        },
        "candidate-book" => SceneSpec {
            faces: 1,
            object: Some("book"),
        },
        "candidate-laptop" => SceneSpec {
            faces: 1,
            object: Some("laptop"),
        },
        "candidate-bottle" => SceneSpec {
            faces: 1,
            object: Some("bottle"),
        },
        // "candidate" and anything unrecognised: one compliant candidate.
        _ => SceneSpec {
            faces: 1,
            object: None,
        },
    }
}

#[derive(Debug)]
pub(crate) struct SyntheticCamera {
    device: String,
    width: u32,
    height: u32,
    scene: SceneSpec,
    warmup_remaining: u32,
    stall_every: u64,
    polls: u64,
    frame_count: u64,
}

impl SyntheticCamera {
    pub(crate) fn open(config: &CameraConfig) -> Result<Self> {
        let target = config.device.trim_start_matches("stub://");
        let (name, params) = match target.split_once('?') {
            Some((name, params)) => (name, Some(params)),
            None => (target, None),
        };

        match name {
            "denied" => {
                return Err(MonitorError::camera_access("camera permission denied").into());
            }
            "absent" => {
                return Err(MonitorError::camera_access("no capture device available").into());
            }
            _ => {}
        }

        let mut warmup = DEFAULT_WARMUP_FRAMES;
        let mut stall = 0u64;
        if let Some(params) = params {
            for pair in params.split('&') {
                let Some((key, value)) = pair.split_once('=') else {
                    continue;
                };
                match key {
                    "warmup" => {
                        warmup = value.parse().map_err(|_| {
                            MonitorError::camera_access(format!(
                                "invalid warmup parameter in {}",
                                config.device
                            ))
                        })?;
                    }
                    "stall" => {
                        stall = value.parse().map_err(|_| {
                            MonitorError::camera_access(format!(
                                "invalid stall parameter in {}",
                                config.device
                            ))
                        })?;
                    }
                    _ => {}
                }
            }
        }

        log::info!("camera connected: {} (synthetic)", config.device);
        Ok(Self {
            device: config.device.clone(),
            width: config.width,
            height: config.height,
            scene: scene_for(name),
            warmup_remaining: warmup,
            stall_every: stall,
            polls: 0,
            frame_count: 0,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        self.polls += 1;

        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return Err(MonitorError::frame_not_ready("stream warming up").into());
        }
        if self.stall_every > 0 && self.polls % self.stall_every == 0 {
            return Err(MonitorError::frame_not_ready("frame not yet decodable").into());
        }

        self.frame_count += 1;
        let pixels = self.render_scene();
        Ok(Frame::new(pixels, self.width, self.height, self.frame_count))
    }

    /// Generate scene pixels: marker bytes up front, varying pattern fill
    /// behind them.
    fn render_scene(&self) -> Vec<u8> {
        let pixel_count = (self.width * self.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }

        if pixels.len() > OBJECT_CODE_MARKER {
            pixels[FACE_COUNT_MARKER] = self.scene.faces;
            pixels[OBJECT_CODE_MARKER] = self.scene.object.map(object_code).unwrap_or(0);
        }
        pixels
    }

    pub(crate) fn stop(&mut self) {
        log::debug!("synthetic camera released: {}", self.device);
    }

    pub(crate) fn is_healthy(&self) -> bool {
        true
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.device.clone(),
        }
    }
}
