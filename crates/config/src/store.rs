//! JSON interchange for parameter sets.

use tracing::{debug, warn};

use crate::{ParameterError, VaseParameters};

/// Errors that can occur while importing or exporting parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to decode parameters: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode parameters: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Imported parameters are invalid: {0}")]
    Invalid(#[from] ParameterError),
}

impl VaseParameters {
    /// Decode a parameter set from its JSON encoding.
    ///
    /// Missing keys fall back to defaults and unknown keys are ignored. The
    /// result is validated before it is returned.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let params: VaseParameters = serde_json::from_str(text).map_err(ConfigError::Decode)?;
        params.validate()?;
        Ok(params)
    }

    /// Encode the parameter set as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Encode)
    }
}

/// Holds the current parameter set on behalf of a host.
///
/// Imports are all-or-nothing: a failed import leaves the stored parameters
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    current: VaseParameters,
}

impl ParameterStore {
    pub fn new(params: VaseParameters) -> Self {
        Self { current: params }
    }

    /// Current parameter set
    pub fn current(&self) -> &VaseParameters {
        &self.current
    }

    /// Replace the stored parameters after validating them.
    pub fn set(&mut self, params: VaseParameters) -> Result<(), ParameterError> {
        params.validate()?;
        self.current = params;
        Ok(())
    }

    /// Replace the stored parameters with a decoded JSON parameter set.
    pub fn import_json(&mut self, text: &str) -> Result<(), ConfigError> {
        match VaseParameters::from_json(text) {
            Ok(params) => {
                debug!("Imported parameter set ({} bytes)", text.len());
                self.current = params;
                Ok(())
            }
            Err(e) => {
                warn!("Parameter import rejected, keeping current set: {}", e);
                Err(e)
            }
        }
    }

    /// Encode the stored parameters as JSON.
    pub fn export_json(&self) -> Result<String, ConfigError> {
        self.current.to_json()
    }

    /// Restore the documented defaults.
    pub fn reset(&mut self) {
        self.current = VaseParameters::default();
    }
}
