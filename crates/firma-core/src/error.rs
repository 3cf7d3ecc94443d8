use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirmaError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("No document is loaded")]
    NoDocument,

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Signature not found: {0}")]
    SignatureNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for FirmaError {
    fn from(e: lopdf::Error) -> Self {
        FirmaError::OperationError(e.to_string())
    }
}
