use crate::{Correction, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Output of the text-correction model for one source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// The model's own fully corrected text.
    pub corrected: String,
    pub corrections: Vec<Correction>,
}

impl ModelOutput {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An original text together with what the model made of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub text: String,
    #[serde(alias = "modelOutput")]
    pub model_output: ModelOutput,
}

impl AnnotationRequest {
    pub fn new(text: impl Into<String>, model_output: ModelOutput) -> Self {
        Self {
            text: text.into(),
            model_output,
        }
    }

    /// Decode a request; missing or null fields are reported as invalid input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
