//! Lifecycle controller and detection loop.
//!
//! `Monitor` owns the camera and detector handles for one exam session.
//! `start` acquires resources in order (camera, object detector, face
//! detector) and transitions `Idle → Initializing → Running`; any
//! acquisition failure releases what was already acquired in reverse order,
//! lands in `Error`, and leaves recovery to a caller-driven reload. `run`
//! drives the detection loop until a stop is signalled; `stop` is
//! idempotent and safe to signal at any point, including while `start` is
//! still in flight.
//!
//! The loop never has two iterations in flight. Within one iteration the
//! object and face detectors run concurrently, and the iteration's results
//! are applied only if no stop was signalled while inference ran.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::alert::{AlertThrottle, Notifier};
use crate::capture::CameraSource;
use crate::classify::classify;
use crate::config::MonitorConfig;
use crate::detect::{DetectionList, DetectorSet};
use crate::ledger::ViolationLedger;
use crate::overlay::OverlayRenderer;
use crate::{MonitorError, MonitorErrorKind};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Lifecycle states of a monitoring session.
///
/// `Error` is terminal for the session instance; the only way back to
/// `Idle` is constructing a fresh `Monitor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Initializing,
    Running,
    Error,
    Stopped,
}

/// Cloneable stop signal for a monitor.
///
/// `stop` only signals; the owning side performs the actual teardown after
/// the current iteration completes.
#[derive(Clone)]
pub struct MonitorHandle {
    stop_flag: Arc<AtomicBool>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }
}

/// Loop counters for health logging and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonitorStats {
    /// Iterations that ran detection and applied results.
    pub frames_processed: u64,
    /// Iterations skipped because the frame surface was not yet decodable.
    pub iterations_skipped: u64,
}

enum IterationOutcome {
    Processed,
    Skipped,
    Discarded,
}

/// Lifecycle controller plus detection loop for one session.
pub struct Monitor {
    config: MonitorConfig,
    ledger: Arc<ViolationLedger>,
    notifier: Box<dyn Notifier>,
    throttle: AlertThrottle,
    overlay: OverlayRenderer,
    camera: Option<CameraSource>,
    detectors: Option<DetectorSet>,
    stop_flag: Arc<AtomicBool>,
    state: MonitorState,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        ledger: Arc<ViolationLedger>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let overlay = OverlayRenderer::new(config.camera.width, config.camera.height);
        let throttle = AlertThrottle::new(config.alerts.toast_duration);
        Self {
            config,
            ledger,
            notifier,
            throttle,
            overlay,
            camera: None,
            detectors: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            state: MonitorState::Idle,
            stats: MonitorStats::default(),
        }
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            stop_flag: self.stop_flag.clone(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn ledger(&self) -> &Arc<ViolationLedger> {
        &self.ledger
    }

    pub fn overlay(&self) -> &OverlayRenderer {
        &self.overlay
    }

    pub fn camera_acquired(&self) -> bool {
        self.camera.is_some()
    }

    pub fn detectors_loaded(&self) -> bool {
        self.detectors.is_some()
    }

    /// Acquire the camera, wait for the first decodable frame, load both
    /// detectors, and transition to `Running`.
    ///
    /// On failure every resource acquired up to that point has already been
    /// released when the error is returned, and the state is `Error`.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            MonitorState::Idle => {}
            state => return Err(anyhow!("cannot start monitor from state {:?}", state)),
        }

        self.state = MonitorState::Initializing;
        if let Err(err) = self.initialize() {
            self.state = MonitorState::Error;
            log::error!("monitor initialization failed: {err:#}");
            return Err(err);
        }

        if self.stop_flag.load(Ordering::Acquire) {
            // stop() raced start(); unwind through the normal teardown path
            // without entering the loop.
            self.shutdown();
            return Ok(());
        }

        self.state = MonitorState::Running;
        log::info!("monitoring active");
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        let mut camera = CameraSource::open(&self.config.camera)?;
        if let Err(err) = camera.await_first_frame() {
            Self::release_partial(camera, None);
            return Err(err);
        }

        let detectors = match DetectorSet::load(
            &self.config.detectors,
            self.config.camera.width,
            self.config.camera.height,
        ) {
            Ok(detectors) => detectors,
            Err(err) => {
                Self::release_partial(camera, None);
                return Err(err);
            }
        };

        self.camera = Some(camera);
        self.detectors = Some(detectors);
        Ok(())
    }

    /// Release partially-acquired resources in reverse acquisition order;
    /// runs before an initialization error is reported to the caller.
    fn release_partial(mut camera: CameraSource, detectors: Option<DetectorSet>) {
        if let Some(mut detectors) = detectors {
            detectors.dispose();
        }
        camera.stop();
    }

    /// Drive the detection loop until a stop is signalled, then tear down.
    ///
    /// Per-iteration failures are logged and never terminate the session;
    /// only the stop signal ends the loop.
    pub fn run(&mut self) -> Result<()> {
        if self.state != MonitorState::Running {
            return Err(anyhow!("monitor is not running (state {:?})", self.state));
        }

        let tick = Duration::from_millis(1000 / u64::from(self.config.camera.frame_rate.max(1)));
        let mut last_health_log = Instant::now();

        while !self.stop_flag.load(Ordering::Acquire) {
            let iteration_started = Instant::now();
            match self.run_iteration() {
                Ok(IterationOutcome::Processed) => self.stats.frames_processed += 1,
                Ok(IterationOutcome::Skipped) => self.stats.iterations_skipped += 1,
                Ok(IterationOutcome::Discarded) => break,
                Err(err) => log::warn!("detection iteration failed: {err:#}"),
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                self.log_health();
                last_health_log = Instant::now();
            }

            // One iteration in flight at a time; pace to the capture rate.
            let elapsed = iteration_started.elapsed();
            if elapsed < tick {
                std::thread::sleep(tick - elapsed);
            }
        }

        self.shutdown();
        Ok(())
    }

    /// One scheduled unit of work: capture, detect concurrently, classify,
    /// apply, draw.
    fn run_iteration(&mut self) -> Result<IterationOutcome> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| MonitorError::camera_access("camera not acquired"))?;
        let frame = match camera.next_frame() {
            Ok(frame) => frame,
            Err(err) if MonitorError::kind_of(&err) == Some(MonitorErrorKind::FrameNotReady) => {
                // Retried on the next tick without consuming a detection call.
                return Ok(IterationOutcome::Skipped);
            }
            Err(err) => return Err(err),
        };

        let detectors = self
            .detectors
            .as_mut()
            .ok_or_else(|| MonitorError::inference("detectors not loaded"))?;
        let detections = detectors.detect_pair(&frame)?;

        // stop() may have been signalled while inference was in flight; the
        // final iteration's results are dropped, not applied.
        if self.stop_flag.load(Ordering::Acquire) {
            return Ok(IterationOutcome::Discarded);
        }

        self.apply_detections(&detections);
        self.overlay.render(&detections.objects, &detections.faces);
        Ok(IterationOutcome::Processed)
    }

    fn apply_detections(&mut self, detections: &DetectionList) {
        let events = classify(&detections.objects, &detections.faces);
        let now = Instant::now();
        for event in &events {
            // The ledger counts every violation frame; the throttle only
            // gates what the candidate sees.
            self.ledger.increment(event.kind);
            if self.throttle.allow(event.kind, now) {
                self.notifier.toast(
                    event.alert_title(),
                    &event.alert_message(),
                    self.config.alerts.toast_duration,
                );
            }
        }
    }

    /// Signal the loop to terminate and release resources. Idempotent, and
    /// safe to call before `start` completes or after an error.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        self.shutdown();
    }

    /// Release detectors then camera, each exactly once.
    fn shutdown(&mut self) {
        if let Some(mut detectors) = self.detectors.take() {
            detectors.dispose();
        }
        if let Some(mut camera) = self.camera.take() {
            camera.stop();
        }
        if self.state != MonitorState::Error {
            self.state = MonitorState::Stopped;
        }
    }

    fn log_health(&self) {
        if let Some(camera) = &self.camera {
            let stats = camera.stats();
            log::info!(
                "camera health={} frames={} device={} violations={}",
                camera.is_healthy(),
                stats.frames_captured,
                stats.device,
                self.ledger.total()
            );
        }
    }
}
