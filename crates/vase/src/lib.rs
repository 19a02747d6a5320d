//! Parametric vase mesh generation.
//!
//! This crate turns a [`VaseParameters`] set into an indexed triangle mesh
//! ready for rendering or export to a printable solid:
//! - Periodic radial and vertical waveforms
//! - Linear or exponential twist
//! - Seeded surface noise
//! - User formulas overriding radius and height per surface point
//! - Straight rim tabs at the top and bottom
//! - Smooth per-vertex normals
//!
//! # Architecture
//!
//! ```text
//! VaseParameters
//!     │ validate
//!     ▼
//! FormulaCache ──► FormulaPair (radius, vertical)
//!     │
//!     ▼
//! build_surface (waveform + noise_source + formulas) ──► grid Mesh
//!     │
//!     ▼
//! extrude_tabs (optional) ──► compute normals ──► Mesh
//! ```
//!
//! Generation is synchronous and keeps no shared state besides the formula
//! cache owned by a [`VaseGenerator`], so independent generators can run on
//! separate threads.

pub mod cache;
pub mod error;
pub mod formula;
pub mod generator;
pub mod mesh;
pub mod noise_source;
pub mod normals;
pub mod surface;
pub mod tabs;
pub mod waveform;

pub use cache::{FormulaCache, FormulaPair};
pub use error::GenerateError;
pub use formula::{CompiledFormula, EvalError, FormulaError, SurfaceSample};
pub use generator::{Generation, GenerationStats, VaseGenerator, generate};
pub use mesh::Mesh;
pub use noise_source::NoiseSource;
pub use vase_config::{
    NoiseType, ParameterError, TwistDirection, TwistRate, VaseParameters, WaveType,
};
