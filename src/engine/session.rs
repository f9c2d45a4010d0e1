//! ONNX sessions and the manager that owns the active one.
//!
//! Building a session resolves the model weights (downloading them on first
//! use) and commits an ONNX Runtime session over them. The manager swaps
//! models build-first: the old session stays active until its replacement
//! exists, so a failed switch leaves everything as it was.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::catalog::{ModelKind, OutputHead};
use super::error::{EngineError, Result};
use super::{download, matting, pipeline, RemovalOptions, Remover, SessionFactory};
use crate::log_info;

/// A live ONNX Runtime session bound to one catalog entry.
pub struct OnnxRemover {
    kind: ModelKind,
    // Session::run needs exclusive access.
    session: Mutex<Session>,
}

impl OnnxRemover {
    /// Resolve the weights for `kind` and commit a session over them.
    pub fn load(kind: ModelKind) -> Result<Self> {
        let weights = download::ensure_weights(kind)?;
        let session = build_session(&weights)
            .map_err(|source| EngineError::model("session build", source))?;
        log_info!("Session ready for model '{}'", kind.identifier());
        Ok(Self {
            kind,
            session: Mutex::new(session),
        })
    }

    /// Run the model and return the first output's data and shape.
    fn infer(&self, tensor: Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input = Value::from_array(tensor)
            .map_err(|source| EngineError::model("input tensor creation", source))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|source| EngineError::model("inference", source))?;

        let keys: Vec<_> = outputs.keys().collect();
        let first_key = keys
            .first()
            .ok_or_else(|| EngineError::inference("model produced no outputs"))?;
        let prediction = outputs
            .get(first_key)
            .ok_or_else(|| EngineError::inference("first model output not found"))?
            .try_extract_array::<f32>()
            .map_err(|source| EngineError::model("output extraction", source))?;

        let shape = prediction.shape().to_vec();
        let data = prediction.view().to_owned().into_raw_vec_and_offset().0;
        Ok((data, shape))
    }
}

fn build_session(weights: &Path) -> ort::Result<Session> {
    let threads = std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(1);
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(threads)?
        .commit_from_file(weights)
}

/// Predictions come back as `[batch, channel, height, width]`.
fn plane_dimensions(shape: &[usize]) -> Result<(u32, u32)> {
    if let &[_, _, height, width] = shape {
        Ok((height as u32, width as u32))
    } else {
        Err(EngineError::inference(format!(
            "unexpected output shape {shape:?}"
        )))
    }
}

impl Remover for OnnxRemover {
    fn model(&self) -> ModelKind {
        self.kind
    }

    fn remove(&self, input: &[u8], options: &RemovalOptions) -> Result<Vec<u8>> {
        let original = image::load_from_memory(input)?.to_rgba8();
        let (orig_w, orig_h) = original.dimensions();
        let spec = self.kind.spec();

        let tensor = pipeline::preprocess(&original, &spec);
        let (data, shape) = self.infer(tensor)?;
        let (height, width) = plane_dimensions(&shape)?;

        match spec.head {
            OutputHead::Saliency { sigmoid } => {
                let matte = pipeline::saliency_matte(&data, height, width, sigmoid);
                let mut matte = pipeline::resize_matte(&matte, orig_w, orig_h);
                if options.alpha_matting {
                    matte = matting::refine(&matte);
                }
                pipeline::encode_png(&pipeline::apply_matte(&original, &matte))
            }
            OutputHead::Garment => {
                let cutouts: Vec<RgbaImage> = pipeline::garment_masks(&data, height, width)
                    .iter()
                    .map(|mask| {
                        let mut mask = pipeline::resize_matte(mask, orig_w, orig_h);
                        if options.alpha_matting {
                            mask = matting::refine(&mask);
                        }
                        pipeline::apply_matte(&original, &mask)
                    })
                    .collect();
                pipeline::encode_png(&pipeline::stack_vertical(&cutouts))
            }
        }
    }
}

/// Builds live ONNX sessions.
pub struct OnnxFactory;

impl SessionFactory for OnnxFactory {
    fn build(&self, model: ModelKind) -> Result<Arc<dyn Remover>> {
        Ok(Arc::new(OnnxRemover::load(model)?))
    }
}

/// Owns the active session and the identity of the selected model.
pub struct SessionManager {
    factory: Box<dyn SessionFactory>,
    current: ModelKind,
    session: Option<Arc<dyn Remover>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_factory(Box::new(OnnxFactory))
    }

    pub fn with_factory(factory: Box<dyn SessionFactory>) -> Self {
        Self {
            factory,
            current: ModelKind::default(),
            session: None,
        }
    }

    /// The selected model: the last one successfully set, or the default.
    pub fn current(&self) -> ModelKind {
        self.current
    }

    /// The live session, if one has been built.
    pub fn session(&self) -> Option<Arc<dyn Remover>> {
        self.session.clone()
    }

    /// Build a session for `model` and make it active.
    ///
    /// Always builds, even when `model` is already selected. The previous
    /// session stays in place when the build fails.
    pub fn set_model(&mut self, model: ModelKind) -> Result<Arc<dyn Remover>> {
        let built = self.factory.build(model)?;
        self.current = model;
        self.session = Some(built.clone());
        Ok(built)
    }

    /// The active session, building one for the selected model on first use.
    pub fn acquire(&mut self) -> Result<Arc<dyn Remover>> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        self.set_model(self.current)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
