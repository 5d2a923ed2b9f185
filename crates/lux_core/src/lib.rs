//! Lux Core - Scene description and model files.
//!
//! This crate provides:
//!
//! - **Scene description types**: `SceneDescription`, `CameraDescription`,
//!   `TriangleDescription`
//! - **Model loading**: the plain-text model format and JSON
//!
//! # Example
//!
//! ```ignore
//! use lux_core::load_model;
//!
//! let model = load_model("cornellbox.ml.txt")?;
//! println!("Loaded {} triangles, {} iterations at {}x{}",
//!     model.triangles.len(),
//!     model.iterations,
//!     model.width,
//!     model.height);
//! ```

pub mod description;
pub mod model;

// Re-export commonly used types
pub use description::{CameraDescription, SceneDescription, TriangleDescription};
pub use model::{load_model, parse_model, ModelError, ModelResult};
