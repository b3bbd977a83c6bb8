//! V4L2 camera backend (feature: capture-v4l2).
//!
//! Opens a local device node (e.g. /dev/video0) at the configured format and
//! streams RGB frames through a memory-mapped buffer queue. Open failures
//! surface as `CameraAccess`; per-capture failures surface as
//! `FrameNotReady` so the detection loop skips the iteration and the health
//! probe reports the stall.

use std::time::{Duration, Instant};

use anyhow::Result;
use ouroboros::self_referencing;

use super::camera::{CameraConfig, CameraStats};
use crate::frame::Frame;
use crate::MonitorError;

pub(crate) struct DeviceCamera {
    device: String,
    target_fps: u32,
    state: Option<DeviceCameraState>,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    last_error: Option<String>,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct DeviceCameraState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl DeviceCamera {
    pub(crate) fn open(config: &CameraConfig) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&config.device).map_err(|err| {
            MonitorError::camera_access(format!("open {} failed: {}", config.device, err))
        })?;

        let mut format = device.format().map_err(|err| {
            MonitorError::camera_access(format!("read format on {}: {}", config.device, err))
        })?;
        format.width = config.width;
        format.height = config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("failed to set format on {}: {}", config.device, err);
                device.format().map_err(|err| {
                    MonitorError::camera_access(format!(
                        "read format on {} after set failure: {}",
                        config.device, err
                    ))
                })?
            }
        };

        if config.frame_rate > 0 {
            let params = v4l::video::capture::Parameters::with_fps(config.frame_rate);
            if let Err(err) = device.set_params(&params) {
                log::warn!("failed to set fps on {}: {}", config.device, err);
            }
        }

        let state = DeviceCameraStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4).map_err(
                    |err| {
                        anyhow::Error::new(MonitorError::camera_access(format!(
                            "create buffer stream on {}: {}",
                            config.device, err
                        )))
                    },
                )
            },
        }
        .try_build()?;

        log::info!(
            "camera connected: {} ({}x{})",
            config.device,
            format.width,
            format.height
        );

        Ok(Self {
            device: config.device.clone(),
            target_fps: config.frame_rate,
            state: Some(state),
            frame_count: 0,
            last_frame_at: None,
            last_error: None,
            active_width: format.width,
            active_height: format.height,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let Some(state) = self.state.as_mut() else {
            return Err(MonitorError::camera_access("device released").into());
        };

        let buf = match state.with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
        {
            Ok(buf) => buf,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(
                    MonitorError::frame_not_ready(format!("capture failed: {}", err)).into(),
                );
            }
        };

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());
        self.last_error = None;

        Ok(Frame::new(
            buf,
            self.active_width,
            self.active_height,
            self.frame_count,
        ))
    }

    /// Release the stream and device node.
    pub(crate) fn stop(&mut self) {
        self.state = None;
    }

    pub(crate) fn is_healthy(&self) -> bool {
        if self.state.is_none() || self.last_error.is_some() {
            return false;
        }
        let Some(last_frame_at) = self.last_frame_at else {
            return true;
        };
        last_frame_at.elapsed() <= self.health_grace()
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.device.clone(),
        }
    }

    fn health_grace(&self) -> Duration {
        let base_ms = if self.target_fps == 0 {
            2_000
        } else {
            (1000 / self.target_fps).saturating_mul(6)
        };
        Duration::from_millis(base_ms.max(2_000) as u64)
    }
}
