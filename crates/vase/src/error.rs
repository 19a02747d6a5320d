//! Error types for mesh generation.

use vase_config::ParameterError;

/// Errors returned before generation starts.
///
/// Formula problems never show up here; they are recovered inside the
/// pipeline and reported through `GenerationStats`.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Invalid vase parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
}
