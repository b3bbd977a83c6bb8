use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use super::synthetic::SyntheticCamera;
#[cfg(feature = "capture-v4l2")]
use super::v4l2::DeviceCamera;
use crate::frame::Frame;
use crate::{MonitorError, MonitorErrorKind};

/// How long `await_first_frame` polls before giving up on the stream.
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
const FIRST_FRAME_POLL: Duration = Duration::from_millis(5);

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g. "/dev/video0") or a `stub://` scene.
    pub device: String,
    /// Capture width in pixels.
    pub width: u32,
    /// Capture height in pixels.
    pub height: u32,
    /// Target frame rate (frames per second).
    pub frame_rate: u32,
    /// Advisory facing mode ("user" = candidate-facing).
    pub facing: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://candidate".to_string(),
            width: 640,
            height: 480,
            frame_rate: 30,
            facing: "user".to_string(),
        }
    }
}

/// Observer handle for the live media track.
///
/// Cloneable; all clones observe the same stop state. The track is stopped
/// exactly once, by `CameraSource::stop`.
#[derive(Clone, Debug)]
pub struct CameraTrack {
    stopped: Arc<AtomicBool>,
}

impl CameraTrack {
    fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
}

/// Live camera source.
///
/// Uses V4L2 for real devices, with a synthetic backend for `stub://`
/// devices. `open` corresponds to requesting camera access: it fails with a
/// `CameraAccess` error when permission is denied or no device is available.
pub struct CameraSource {
    backend: CameraBackend,
    track: CameraTrack,
}

impl std::fmt::Debug for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSource")
            .field("track", &self.track)
            .finish_non_exhaustive()
    }
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "capture-v4l2")]
    Device(DeviceCamera),
}

impl CameraSource {
    /// Request access to the configured device and bind the stream.
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let backend = if config.device.starts_with("stub://") {
            CameraBackend::Synthetic(SyntheticCamera::open(config)?)
        } else {
            #[cfg(feature = "capture-v4l2")]
            {
                CameraBackend::Device(DeviceCamera::open(config)?)
            }
            #[cfg(not(feature = "capture-v4l2"))]
            {
                return Err(MonitorError::camera_access(format!(
                    "device {} requires the capture-v4l2 feature",
                    config.device
                ))
                .into());
            }
        };
        log::info!(
            "camera open: {} ({}x{} @ {}fps, facing {})",
            config.device,
            config.width,
            config.height,
            config.frame_rate,
            config.facing
        );
        Ok(Self {
            backend,
            track: CameraTrack::new(),
        })
    }

    /// Block until the stream produces its first decodable frame.
    ///
    /// The probe frame is discarded; the detection loop starts from the next
    /// capture. Fails with `CameraAccess` if the stream never becomes
    /// decodable within the timeout.
    pub fn await_first_frame(&mut self) -> Result<()> {
        let deadline = Instant::now() + FIRST_FRAME_TIMEOUT;
        loop {
            match self.next_frame() {
                Ok(_) => return Ok(()),
                Err(err) if MonitorError::kind_of(&err) == Some(MonitorErrorKind::FrameNotReady) => {
                    if Instant::now() >= deadline {
                        return Err(MonitorError::camera_access(
                            "stream produced no decodable frame",
                        )
                        .into());
                    }
                    std::thread::sleep(FIRST_FRAME_POLL);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Capture the next frame.
    ///
    /// Returns a `FrameNotReady` error while the stream is not yet
    /// decodable; the caller skips that iteration without a detection call.
    pub fn next_frame(&mut self) -> Result<Frame> {
        if self.track.is_stopped() {
            return Err(MonitorError::camera_access("camera track is stopped").into());
        }
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::Device(source) => source.next_frame(),
        }
    }

    /// Stop the underlying track and release the device.
    ///
    /// Idempotent: the track is destroyed on the first call, later calls are
    /// no-ops.
    pub fn stop(&mut self) {
        if self.track.is_stopped() {
            return;
        }
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.stop(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::Device(source) => source.stop(),
        }
        self.track.stop();
        log::info!("camera stopped: {}", self.stats().device);
    }

    /// Observer handle for the underlying track.
    pub fn track(&self) -> CameraTrack {
        self.track.clone()
    }

    pub fn is_healthy(&self) -> bool {
        if self.track.is_stopped() {
            return false;
        }
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::Device(source) => source.is_healthy(),
        }
    }

    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::Device(source) => source.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config(device: &str) -> CameraConfig {
        CameraConfig {
            device: device.to_string(),
            ..CameraConfig::default()
        }
    }

    #[test]
    fn denied_device_fails_with_camera_access() {
        let err = CameraSource::open(&stub_config("stub://denied")).unwrap_err();
        assert_eq!(
            MonitorError::kind_of(&err),
            Some(MonitorErrorKind::CameraAccess)
        );
    }

    #[test]
    fn absent_device_fails_with_camera_access() {
        let err = CameraSource::open(&stub_config("stub://absent")).unwrap_err();
        assert_eq!(
            MonitorError::kind_of(&err),
            Some(MonitorErrorKind::CameraAccess)
        );
    }

    #[test]
    fn warmup_frames_report_not_ready_then_flow() {
        let mut source = CameraSource::open(&stub_config("stub://candidate?warmup=2")).unwrap();

        for _ in 0..2 {
            let err = source.next_frame().unwrap_err();
            assert_eq!(
                MonitorError::kind_of(&err),
                Some(MonitorErrorKind::FrameNotReady)
            );
        }
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.seq(), 1);
    }

    #[test]
    fn await_first_frame_consumes_warmup() {
        let mut source = CameraSource::open(&stub_config("stub://candidate?warmup=3")).unwrap();
        source.await_first_frame().unwrap();
        assert!(source.next_frame().is_ok());
    }

    #[test]
    fn stop_is_idempotent_and_destroys_track_once() {
        let mut source = CameraSource::open(&stub_config("stub://candidate?warmup=0")).unwrap();
        let track = source.track();
        assert!(!track.is_stopped());

        source.stop();
        assert!(track.is_stopped());
        source.stop();
        assert!(track.is_stopped());

        let err = source.next_frame().unwrap_err();
        assert_eq!(
            MonitorError::kind_of(&err),
            Some(MonitorErrorKind::CameraAccess)
        );
        assert!(!source.is_healthy());
    }

    #[test]
    fn stalling_source_interleaves_not_ready_frames() {
        let mut source =
            CameraSource::open(&stub_config("stub://candidate?warmup=0&stall=3")).unwrap();

        let mut captured = 0;
        let mut skipped = 0;
        for _ in 0..9 {
            match source.next_frame() {
                Ok(_) => captured += 1,
                Err(err) => {
                    assert_eq!(
                        MonitorError::kind_of(&err),
                        Some(MonitorErrorKind::FrameNotReady)
                    );
                    skipped += 1;
                }
            }
        }
        assert_eq!(captured, 6);
        assert_eq!(skipped, 3);
    }
}
