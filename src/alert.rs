//! User-facing alerts.
//!
//! The throttle is a display-only concern: it keeps a continuously-true
//! violation from re-raising the same notification every frame, while the
//! ledger keeps counting at full per-frame cadence underneath. The
//! `Notifier` trait is the seam to the host UI layer; the monitor never
//! talks to a concrete UI directly.

use std::time::{Duration, Instant};

use crate::ViolationKind;

/// Default toast lifetime, and therefore the default minimum interval
/// between two showings of the same alert.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Host UI notification seam.
pub trait Notifier: Send {
    /// Transient, non-blocking notification.
    fn toast(&mut self, title: &str, message: &str, duration: Duration);

    /// Blocking notification with a retry action. Returns true when the
    /// user asked to retry.
    fn blocking_alert(&mut self, title: &str, message: &str) -> bool;
}

/// Notifier that writes toasts to the log and declines retries.
/// Useful headless (tests, demo).
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&mut self, title: &str, message: &str, _duration: Duration) {
        log::warn!("alert: {}: {}", title, message);
    }

    fn blocking_alert(&mut self, title: &str, message: &str) -> bool {
        log::error!("{}: {}", title, message);
        false
    }
}

/// Per-kind rate limit for user-visible notifications.
pub struct AlertThrottle {
    interval: Duration,
    last_shown: [Option<Instant>; ViolationKind::ALL.len()],
}

impl AlertThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_shown: [None; ViolationKind::ALL.len()],
        }
    }

    /// Whether an alert for `kind` may be shown at `now`. Records the
    /// showing when it answers true.
    pub fn allow(&mut self, kind: ViolationKind, now: Instant) -> bool {
        let slot = &mut self.last_shown[kind.index()];
        match slot {
            Some(last) if now.duration_since(*last) < self.interval => false,
            _ => {
                *slot = Some(now);
                true
            }
        }
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}
