//! Loaded detector handles.
//!
//! `DetectorHandle` owns one loaded backend and guards its lifecycle: load
//! once, detect many times, dispose exactly once. `DetectorSet` is the pair
//! the monitor runs per frame, loaded in acquisition order (objects, then
//! faces) and disposed in reverse.

use std::thread;

use anyhow::Result;

use crate::config::DetectorSettings;
use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::backends::{StubFaceBackend, StubObjectBackend};
use crate::detect::result::DetectionList;
use crate::frame::Frame;
use crate::MonitorError;

fn build_backend(
    model: &str,
    capability: DetectionCapability,
    width: u32,
    height: u32,
) -> Result<Box<dyn DetectorBackend>> {
    if let Some(scene) = model.strip_prefix("stub://") {
        if scene == "fail" {
            return Err(MonitorError::model_load(format!(
                "stub model {} is configured to fail",
                model
            ))
            .into());
        }
        return Ok(match capability {
            DetectionCapability::Objects => Box::new(StubObjectBackend::new()),
            DetectionCapability::Faces => Box::new(StubFaceBackend::new()),
        });
    }

    #[cfg(feature = "backend-tract")]
    {
        use crate::detect::backends::TractBackend;
        return Ok(Box::new(TractBackend::new(
            model, capability, width, height,
        )?));
    }

    #[cfg(not(feature = "backend-tract"))]
    {
        let _ = (width, height);
        Err(MonitorError::model_load(format!(
            "loading {} requires the backend-tract feature",
            model
        ))
        .into())
    }
}

/// One loaded detector model.
pub struct DetectorHandle {
    capability: DetectionCapability,
    model: String,
    backend: Option<Box<dyn DetectorBackend>>,
}

impl std::fmt::Debug for DetectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorHandle")
            .field("capability", &self.capability)
            .field("model", &self.model)
            .field("disposed", &self.backend.is_none())
            .finish()
    }
}

impl DetectorHandle {
    /// Load and warm up the backend for `model`.
    ///
    /// Fails with a `ModelLoad` error; nothing is left allocated on failure.
    pub fn load(
        model: &str,
        capability: DetectionCapability,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let mut backend = build_backend(model, capability, width, height).map_err(|err| {
            match MonitorError::kind_of(&err) {
                Some(_) => err,
                None => MonitorError::model_load(format!("{model}: {err:#}")).into(),
            }
        })?;
        backend
            .warm_up()
            .map_err(|err| MonitorError::model_load(format!("{model} warm-up failed: {err:#}")))?;

        log::info!(
            "detector loaded: {} ({:?} via {})",
            model,
            capability,
            backend.name()
        );
        Ok(Self {
            capability,
            model: model.to_string(),
            backend: Some(backend),
        })
    }

    pub fn capability(&self) -> DetectionCapability {
        self.capability
    }

    /// Run the backend against one frame.
    ///
    /// Failures (including detect-after-dispose) surface as
    /// `DetectionInference`, which the loop treats as non-fatal.
    pub fn detect(&mut self, frame: &Frame) -> Result<DetectionList> {
        let Some(backend) = self.backend.as_mut() else {
            return Err(
                MonitorError::inference(format!("{} detector is disposed", self.model)).into(),
            );
        };
        backend
            .detect(frame.pixels(), frame.width(), frame.height())
            .map_err(|err| {
                MonitorError::inference(format!("{} inference failed: {err:#}", self.model)).into()
            })
    }

    /// Release the backend's native resources. Idempotent; the backend is
    /// destroyed on the first call.
    pub fn dispose(&mut self) {
        if let Some(backend) = self.backend.take() {
            log::debug!("detector disposed: {} ({})", self.model, backend.name());
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.backend.is_none()
    }
}

/// The object + face detector pair for one session.
#[derive(Debug)]
pub struct DetectorSet {
    object: DetectorHandle,
    face: DetectorHandle,
}

impl DetectorSet {
    /// Load both detectors in acquisition order: objects, then faces.
    ///
    /// If the face detector fails after the object detector loaded, the
    /// object detector is disposed before the error is reported.
    pub fn load(settings: &DetectorSettings, width: u32, height: u32) -> Result<Self> {
        let mut object = DetectorHandle::load(
            &settings.object_model,
            DetectionCapability::Objects,
            width,
            height,
        )?;
        let face = match DetectorHandle::load(
            &settings.face_model,
            DetectionCapability::Faces,
            width,
            height,
        ) {
            Ok(face) => face,
            Err(err) => {
                object.dispose();
                return Err(err);
            }
        };
        Ok(Self { object, face })
    }

    /// Run both detectors against `frame` concurrently and wait for both.
    pub fn detect_pair(&mut self, frame: &Frame) -> Result<DetectionList> {
        let object = &mut self.object;
        let face = &mut self.face;

        let (objects, faces) = thread::scope(|scope| {
            let object_task = scope.spawn(|| object.detect(frame));
            let face_task = scope.spawn(|| face.detect(frame));
            (join_detect(object_task), join_detect(face_task))
        });

        let mut list = objects?;
        list.faces = faces?.faces;
        Ok(list)
    }

    /// Dispose both handles in reverse acquisition order: face, then object.
    /// Idempotent.
    pub fn dispose(&mut self) {
        self.face.dispose();
        self.object.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.object.is_disposed() && self.face.is_disposed()
    }
}

fn join_detect(task: thread::ScopedJoinHandle<'_, Result<DetectionList>>) -> Result<DetectionList> {
    task.join()
        .map_err(|_| MonitorError::inference("detector thread panicked"))?
}
