//! HTTP clients for the classifier and the knowledge base.

mod knowledge;
mod prediction;

pub use knowledge::{HttpKnowledgeClient, KnowledgeService, knowledge_search_url};
pub use prediction::{HttpPredictionClient, PredictionService};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error: {status} - {body}")]
    Service { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    MalformedResponse(String),
    #[error("Record not found")]
    NotFound,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
