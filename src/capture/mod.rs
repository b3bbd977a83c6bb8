//! Camera capture sources.
//!
//! This module provides the live-video side of the pipeline:
//! - Local V4L2 devices (feature: capture-v4l2)
//! - Synthetic `stub://` sources (tests, demo)
//!
//! The capture layer is responsible for:
//! - Opening the device at the configured resolution and frame rate
//! - Signalling readiness (`FrameNotReady` until the stream is decodable)
//! - Producing `Frame` instances, one at a time
//! - Tearing down the underlying track exactly once, idempotently
//!
//! The capture layer MUST NOT:
//! - Store captured frames to disk
//! - Retain frames beyond handoff to the detection loop

mod camera;
pub(crate) mod synthetic;
#[cfg(feature = "capture-v4l2")]
mod v4l2;

pub use camera::{CameraConfig, CameraSource, CameraStats, CameraTrack};
