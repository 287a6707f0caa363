use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnnotateError>;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("text is {len} chars long, limit is {limit}")]
    TooLarge { len: usize, limit: usize },

    #[error("{} correction(s) could not be located (indices {:?})", .indices.len(), .indices)]
    Unlocated { indices: Vec<usize> },

    #[error("invalid redaction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AnnotateError {
    fn from(err: serde_json::Error) -> Self {
        AnnotateError::InvalidInput(err.to_string())
    }
}
