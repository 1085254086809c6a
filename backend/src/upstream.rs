use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::config::GatewayConfig;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream request timed out: {0}")]
    Timeout(String),
    #[error("Upstream request failed: {0}")]
    Transport(String),
    #[error("Invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// An image accepted from the browser, ready to forward.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Upstream status, content type and body, passed back to the browser unchanged.
#[derive(Debug)]
pub struct Relayed {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Relayed {
    async fn read(response: reqwest::Response) -> Result<Self, UpstreamError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    classifier_url: Url,
    knowledge_base_url: Url,
}

impl UpstreamClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            http,
            classifier_url: config.classifier_url.clone(),
            knowledge_base_url: config.knowledge_base_url.clone(),
        })
    }

    pub fn predict_url(&self) -> Result<Url, UpstreamError> {
        Ok(self.classifier_url.join("predict")?)
    }

    pub fn knowledge_url(&self, disease: &str) -> Result<Url, UpstreamError> {
        let mut url = self.knowledge_base_url.join("kb/search")?;
        url.set_query(Some(&format!("disease={}", urlencoding::encode(disease))));
        Ok(url)
    }

    pub async fn predict(&self, upload: Upload) -> Result<Relayed, UpstreamError> {
        let url = self.predict_url()?;
        log::info!(
            "Forwarding {} ({} bytes) to {}",
            upload.file_name,
            upload.bytes.len(),
            url
        );

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.media_type)?;
        let form = Form::new().part("file", part);

        let response = self.http.post(url).multipart(form).send().await?;
        Relayed::read(response).await
    }

    pub async fn search_knowledge(&self, disease: &str) -> Result<Relayed, UpstreamError> {
        let url = self.knowledge_url(disease)?;
        log::info!("Looking up '{}' at {}", disease, url);

        let response = self.http.get(url).send().await?;
        Relayed::read(response).await
    }
}
