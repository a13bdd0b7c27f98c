use thiserror::Error;

/// Failures inside the export pipeline.
///
/// The dispatcher logs these and collapses them into a single user-facing
/// message; they are never returned to the client verbatim.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Rasterizing the rendered surface failed (not mounted, unreadable snapshot, empty image).
    #[error("capture failed: {0}")]
    Capture(String),

    /// Packing the document or image into output bytes failed.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// Handing the finished artifact to the delivery backend failed.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        ExportError::Encoding(e.to_string())
    }
}

impl From<lopdf::Error> for ExportError {
    fn from(e: lopdf::Error) -> Self {
        ExportError::Encoding(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ExportError {
    fn from(e: tokio::task::JoinError) -> Self {
        ExportError::Encoding(format!("encoder task aborted: {e}"))
    }
}
