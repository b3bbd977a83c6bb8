mod backend;
mod backends;
mod handle;
mod result;

pub use backend::{DetectionCapability, DetectorBackend};
pub use backends::{StubFaceBackend, StubObjectBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use handle::{DetectorHandle, DetectorSet};
pub use result::{DetectionList, FaceDetection, ObjectDetection, Rect};
