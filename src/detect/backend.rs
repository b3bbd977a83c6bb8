use anyhow::Result;

use crate::detect::result::DetectionList;

/// What a detector backend produces.
///
/// The monitor loads exactly one backend per capability: a general-purpose
/// object detector and a face detector. There is no partial-degradation
/// mode; both must load or the session fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionCapability {
    Objects,
    Faces,
}

/// Detector backend trait.
///
/// Implementations must treat the pixel slice as read-only and ephemeral:
/// no pixels stored beyond the `detect` call, no disk writes, no network.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// The capability this backend provides.
    fn capability(&self) -> DetectionCapability;

    /// Run detection on one frame's pixels.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionList>;

    /// Optional warm-up hook, invoked once after load.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
