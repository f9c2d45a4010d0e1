//! ClearCut: background removal for still images with pretrained ONNX
//! segmentation models.
//!
//! The [`engine`] module is the headless core (model catalog, weight
//! downloads, inference, matting). [`state::Studio`] drives it from the
//! UI thread and [`app::ClearCutApp`] is the eframe shell on top.

pub mod app;
pub mod engine;
pub mod io;
pub mod logger;
pub mod mocks;
pub mod notify;
pub mod preview;
pub mod state;
