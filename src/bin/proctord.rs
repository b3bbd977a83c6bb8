//! proctord - exam proctoring monitor daemon
//!
//! This daemon:
//! 1. Loads configuration (JSON config file + environment overrides)
//! 2. Acquires the camera and loads both detector models
//! 3. Runs the detection loop until Ctrl-C
//! 4. Prints the violation ledger summary on exit
//!
//! An acquisition failure surfaces a blocking retry prompt; retrying
//! rebuilds the whole lifecycle controller (Error → Idle via reload).

use std::sync::{Arc, Mutex};

use anyhow::Result;

use proctor_monitor::ui::{ConsoleNotifier, Ui};
use proctor_monitor::{
    Monitor, MonitorConfig, MonitorHandle, MonitorState, Notifier, ViolationKind, ViolationLedger,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = MonitorConfig::load()?;
    let ui = Ui::from_env();

    // One Ctrl-C handler for the process; each reload swaps in the handle of
    // the currently active monitor.
    let active: Arc<Mutex<Option<MonitorHandle>>> = Arc::new(Mutex::new(None));
    {
        let active = active.clone();
        ctrlc::set_handler(move || {
            if let Ok(slot) = active.lock() {
                if let Some(handle) = slot.as_ref() {
                    handle.stop();
                }
            }
        })?;
    }

    log::info!(
        "proctord starting: device={} {}x{} @ {}fps",
        cfg.camera.device,
        cfg.camera.width,
        cfg.camera.height,
        cfg.camera.frame_rate
    );

    loop {
        let ledger = Arc::new(ViolationLedger::new());
        let mut monitor = Monitor::new(
            cfg.clone(),
            ledger.clone(),
            Box::new(ConsoleNotifier::new()),
        );
        if let Ok(mut slot) = active.lock() {
            *slot = Some(monitor.handle());
        }

        let started = {
            let _stage = ui.stage("Initializing camera and detection models");
            monitor.start()
        };

        if let Err(err) = started {
            log::error!("monitor failed to start: {err:#}");
            let retry = ConsoleNotifier::new().blocking_alert(
                "Camera Setup Failed",
                "Please ensure camera permissions are granted and try again.",
            );
            if retry {
                continue;
            }
            return Err(err);
        }

        if monitor.state() == MonitorState::Running {
            ui.status("Monitoring active. Press Ctrl-C to finish the session");
            monitor.run()?;
        }

        let stats = monitor.stats();
        log::info!(
            "session finished: {} frames processed, {} skipped",
            stats.frames_processed,
            stats.iterations_skipped
        );

        ui.status(&format!(
            "Session complete: {} violation frames recorded",
            ledger.total()
        ));
        for kind in ViolationKind::ALL {
            ui.status(&format!("  {:<18} {}", kind.label(), ledger.count(kind)));
        }
        return Ok(());
    }
}
