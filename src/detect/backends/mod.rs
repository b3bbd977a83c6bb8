pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::{StubFaceBackend, StubObjectBackend};

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
