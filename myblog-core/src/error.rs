use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("query error: {0}")]
    Query(String),

    #[error("update error: {0}")]
    Update(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BlogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::NotFound(_))
    }
}

impl From<mongodb::error::Error> for BlogError {
    fn from(err: mongodb::error::Error) -> Self {
        BlogError::Query(err.to_string())
    }
}

impl From<object_store::Error> for BlogError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => BlogError::NotFound(path),
            other => BlogError::Upstream(other.to_string()),
        }
    }
}

impl From<image::ImageError> for BlogError {
    fn from(err: image::ImageError) -> Self {
        BlogError::Internal(format!("image processing failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
