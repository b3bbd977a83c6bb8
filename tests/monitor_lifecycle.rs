use std::sync::{Arc, Mutex};
use std::time::Duration;

use proctor_monitor::{
    CameraConfig, Monitor, MonitorConfig, MonitorError, MonitorErrorKind, MonitorState, Notifier,
    ViolationKind, ViolationLedger,
};

/// Notifier that records every toast; shared with the test through an Arc.
#[derive(Clone, Default)]
struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    fn toasts(&self) -> Vec<(String, String)> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn toast(&mut self, title: &str, message: &str, _duration: Duration) {
        self.toasts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    fn blocking_alert(&mut self, _title: &str, _message: &str) -> bool {
        false
    }
}

fn config(device: &str) -> MonitorConfig {
    let mut cfg = MonitorConfig::default();
    cfg.camera = CameraConfig {
        device: device.to_string(),
        frame_rate: 250,
        ..CameraConfig::default()
    };
    cfg
}

fn run_session(device: &str, session: Duration) -> (Monitor, Arc<ViolationLedger>, RecordingNotifier) {
    let ledger = Arc::new(ViolationLedger::new());
    let notifier = RecordingNotifier::default();
    let mut monitor = Monitor::new(config(device), ledger.clone(), Box::new(notifier.clone()));
    let handle = monitor.handle();

    monitor.start().expect("monitor should start");
    assert_eq!(monitor.state(), MonitorState::Running);

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(session);
        handle.stop();
    });
    monitor.run().expect("detection loop should exit cleanly");
    stopper.join().expect("stop timer thread");

    assert_eq!(monitor.state(), MonitorState::Stopped);
    (monitor, ledger, notifier)
}

#[test]
fn camera_permission_denied_reaches_error_without_detectors() {
    let ledger = Arc::new(ViolationLedger::new());
    let mut monitor = Monitor::new(
        config("stub://denied"),
        ledger.clone(),
        Box::new(RecordingNotifier::default()),
    );

    let err = monitor.start().unwrap_err();
    assert_eq!(
        MonitorError::kind_of(&err),
        Some(MonitorErrorKind::CameraAccess)
    );
    assert_eq!(monitor.state(), MonitorState::Error);
    assert!(!monitor.camera_acquired());
    assert!(!monitor.detectors_loaded());
    assert_eq!(ledger.total(), 0);
}

#[test]
fn model_load_failure_releases_the_camera() {
    let mut cfg = config("stub://candidate");
    cfg.detectors.object_model = "stub://fail".to_string();

    let mut monitor = Monitor::new(
        cfg,
        Arc::new(ViolationLedger::new()),
        Box::new(RecordingNotifier::default()),
    );

    let err = monitor.start().unwrap_err();
    assert_eq!(
        MonitorError::kind_of(&err),
        Some(MonitorErrorKind::ModelLoad)
    );
    assert_eq!(monitor.state(), MonitorState::Error);
    assert!(!monitor.camera_acquired());
    assert!(!monitor.detectors_loaded());
}

#[test]
fn empty_room_counts_one_face_not_visible_per_frame() {
    let (monitor, ledger, _notifier) = run_session("stub://empty-room", Duration::from_millis(100));

    let frames = monitor.stats().frames_processed;
    assert!(frames > 0);
    assert_eq!(ledger.count(ViolationKind::FaceNotVisible), frames);
    assert_eq!(ledger.count(ViolationKind::MultipleFaces), 0);
    assert_eq!(ledger.count(ViolationKind::MobileDetected), 0);
    assert_eq!(ledger.count(ViolationKind::ProhibitedObject), 0);
}

#[test]
fn phone_scene_counts_mobile_only_and_throttles_toasts() {
    let (monitor, ledger, notifier) =
        run_session("stub://candidate-phone", Duration::from_millis(100));

    let frames = monitor.stats().frames_processed;
    assert!(frames > 1);
    assert_eq!(ledger.count(ViolationKind::MobileDetected), frames);
    assert_eq!(ledger.count(ViolationKind::FaceNotVisible), 0);
    assert_eq!(ledger.count(ViolationKind::MultipleFaces), 0);

    // The ledger counted every frame, but a 100ms session fits inside one
    // 3000ms toast window: the alert fired exactly once.
    let toasts = notifier.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].0, "Mobile Phone Detected");
    assert_eq!(toasts[0].1, "Mobile phones are not allowed during the test");
}

#[test]
fn two_face_scene_counts_multiple_faces_per_frame() {
    let (monitor, ledger, _notifier) = run_session("stub://two-faces", Duration::from_millis(100));

    let frames = monitor.stats().frames_processed;
    assert!(frames > 0);
    assert_eq!(ledger.count(ViolationKind::MultipleFaces), frames);
    assert_eq!(ledger.count(ViolationKind::FaceNotVisible), 0);
}

#[test]
fn compliant_candidate_records_no_violations() {
    let (_monitor, ledger, notifier) = run_session("stub://candidate", Duration::from_millis(100));
    assert_eq!(ledger.total(), 0);
    assert!(notifier.toasts().is_empty());
}

#[test]
fn ledger_is_frozen_once_the_session_stopped() {
    let (monitor, ledger, _notifier) = run_session("stub://empty-room", Duration::from_millis(50));

    let after_stop = ledger.total();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(ledger.total(), after_stop);
    drop(monitor);
    assert_eq!(ledger.total(), after_stop);
}

#[test]
fn stop_is_idempotent_after_a_completed_session() {
    let (mut monitor, _ledger, _notifier) =
        run_session("stub://candidate", Duration::from_millis(50));

    monitor.stop();
    monitor.stop();
    assert_eq!(monitor.state(), MonitorState::Stopped);
}
