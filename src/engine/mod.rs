//! The background-removal engine: model catalog, weight download, ONNX
//! sessions, and the matte pipeline that turns predictions into cutouts.

pub mod catalog;
pub mod download;
pub mod error;
pub mod matting;
pub mod pipeline;
pub mod session;

pub use catalog::ModelKind;
pub use error::{EngineError, Result};
pub use session::{OnnxFactory, SessionManager};

use std::sync::Arc;

/// Knobs for a single removal run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemovalOptions {
    /// Refine matte edges with trimap-based feathering.
    pub alpha_matting: bool,
}

/// A ready-to-run background remover bound to one model.
///
/// Sessions are shared across threads behind an `Arc`, so a removal keeps
/// running on its clone even while the manager swaps the active session.
pub trait Remover: Send + Sync {
    /// Catalog entry this session was built for.
    fn model(&self) -> ModelKind;

    /// Decode `input`, drop its background, and encode the cutout as PNG.
    fn remove(&self, input: &[u8], options: &RemovalOptions) -> Result<Vec<u8>>;
}

/// Diagnostic formatting only, so `Result<Arc<dyn Remover>, _>` supports
/// `unwrap_err` in tests.
impl std::fmt::Debug for dyn Remover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remover").field("model", &self.model()).finish()
    }
}

/// Builds sessions for the manager.
pub trait SessionFactory {
    fn build(&self, model: ModelKind) -> Result<Arc<dyn Remover>>;
}
