//! Stand-in engine pieces for tests. No ONNX runtime, no downloads.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::engine::error::{EngineError, Result};
use crate::engine::{ModelKind, RemovalOptions, Remover, SessionFactory, pipeline};

/// Remover that returns the input with every pixel made transparent.
pub struct InstantRemover {
    pub model: ModelKind,
}

impl Remover for InstantRemover {
    fn model(&self) -> ModelKind {
        self.model
    }

    fn remove(&self, input: &[u8], _options: &RemovalOptions) -> Result<Vec<u8>> {
        let mut image = image::load_from_memory(input)?.to_rgba8();
        for pixel in image.pixels_mut() {
            pixel[3] = 0;
        }
        pipeline::encode_png(&image)
    }
}

/// Remover that fails every run with a fixed message.
pub struct FailingRemover {
    pub model: ModelKind,
    pub message: String,
}

impl Remover for FailingRemover {
    fn model(&self) -> ModelKind {
        self.model
    }

    fn remove(&self, _input: &[u8], _options: &RemovalOptions) -> Result<Vec<u8>> {
        Err(EngineError::inference(self.message.clone()))
    }
}

/// Remover whose run panics instead of returning.
pub struct PanickingRemover {
    pub model: ModelKind,
}

impl Remover for PanickingRemover {
    fn model(&self) -> ModelKind {
        self.model
    }

    fn remove(&self, _input: &[u8], _options: &RemovalOptions) -> Result<Vec<u8>> {
        panic!("mask head exploded");
    }
}

/// Opens the gate a `GatedRemover` is waiting on.
pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub fn open(&self) {
        let (open, signal) = &*self.0;
        *open.lock() = true;
        signal.notify_all();
    }
}

/// Remover that blocks until its gate opens, then echoes the input back.
/// Lets a test hold the busy state for as long as it needs.
pub struct GatedRemover {
    pub model: ModelKind,
    gate: Arc<(Mutex<bool>, Condvar)>,
}

impl GatedRemover {
    pub fn new(model: ModelKind) -> (Self, Gate) {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let remover = Self {
            model,
            gate: gate.clone(),
        };
        (remover, Gate(gate))
    }
}

impl Remover for GatedRemover {
    fn model(&self) -> ModelKind {
        self.model
    }

    fn remove(&self, input: &[u8], _options: &RemovalOptions) -> Result<Vec<u8>> {
        let (open, signal) = &*self.gate;
        let mut open = open.lock();
        while !*open {
            signal.wait(&mut open);
        }
        let image = image::load_from_memory(input)?.to_rgba8();
        pipeline::encode_png(&image)
    }
}

/// Factory that delegates to a closure and counts how often it built.
pub struct MockFactory {
    pub builds: Arc<AtomicUsize>,
    make: Box<dyn Fn(ModelKind) -> Result<Arc<dyn Remover>> + Send + Sync>,
}

impl MockFactory {
    pub fn new(
        make: impl Fn(ModelKind) -> Result<Arc<dyn Remover>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            builds: Arc::new(AtomicUsize::new(0)),
            make: Box::new(make),
        }
    }

    /// Factory whose sessions finish instantly.
    pub fn instant() -> Self {
        Self::new(|model| Ok(Arc::new(InstantRemover { model })))
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl SessionFactory for MockFactory {
    fn build(&self, model: ModelKind) -> Result<Arc<dyn Remover>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        (self.make)(model)
    }
}
