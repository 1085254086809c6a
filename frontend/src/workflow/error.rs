#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Unsupported media type: {0:?}")]
    InvalidMediaType(String),
    #[error("No image selected")]
    NoImageSelected,
}
