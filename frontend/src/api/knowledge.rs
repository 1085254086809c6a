use async_trait::async_trait;
use gloo_net::http::Request;
use shared::KnowledgeRecord;

use super::{ClientError, is_success};

const SEARCH_PATH: &str = "/kb/search";

#[async_trait(?Send)]
pub trait KnowledgeService {
    /// Looks up reference information for one disease.
    async fn lookup(&self, disease_name: &str) -> Result<KnowledgeRecord, ClientError>;
}

pub struct HttpKnowledgeClient {
    base_url: String,
}

impl HttpKnowledgeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

pub fn knowledge_search_url(base_url: &str, disease_name: &str) -> String {
    format!(
        "{}{}?disease={}",
        base_url.trim_end_matches('/'),
        SEARCH_PATH,
        urlencoding::encode(disease_name)
    )
}

#[async_trait(?Send)]
impl KnowledgeService for HttpKnowledgeClient {
    async fn lookup(&self, disease_name: &str) -> Result<KnowledgeRecord, ClientError> {
        let url = knowledge_search_url(&self.base_url, disease_name);

        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        parse_knowledge(status, &body)
    }
}

pub(crate) fn parse_knowledge(status: u16, body: &str) -> Result<KnowledgeRecord, ClientError> {
    if status == 404 {
        return Err(ClientError::NotFound);
    }
    if !is_success(status) {
        return Err(ClientError::Service {
            status,
            body: body.to_string(),
        });
    }

    // The service answers an unknown disease with an empty or null body.
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(ClientError::NotFound);
    }

    serde_json::from_str(trimmed).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}
