use async_trait::async_trait;
use gloo_file::Blob;
use gloo_net::http::Request;
use shared::PredictionSet;

use super::{ClientError, is_success};
use crate::workflow::ImagePayload;

const PREDICT_PATH: &str = "/predict";
const UPLOAD_FIELD: &str = "file";

#[async_trait(?Send)]
pub trait PredictionService {
    /// Submits one image to the classifier. Never retries.
    async fn predict(&self, image: &ImagePayload) -> Result<PredictionSet, ClientError>;
}

pub struct HttpPredictionClient {
    base_url: String,
}

impl HttpPredictionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, PREDICT_PATH)
    }
}

#[async_trait(?Send)]
impl PredictionService for HttpPredictionClient {
    async fn predict(&self, image: &ImagePayload) -> Result<PredictionSet, ClientError> {
        let blob = Blob::new_with_options(image.bytes(), Some(image.media_type()));
        let form_data = web_sys::FormData::new()
            .map_err(|e| ClientError::Network(format!("FormData unavailable: {:?}", e)))?;
        form_data
            .append_with_blob_and_filename(UPLOAD_FIELD, &web_sys::Blob::from(blob), image.file_name())
            .map_err(|e| ClientError::Network(format!("Failed to attach image: {:?}", e)))?;

        let request = Request::post(&self.endpoint())
            .body(form_data)
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        parse_predictions(status, &body)
    }
}

pub(crate) fn parse_predictions(status: u16, body: &str) -> Result<PredictionSet, ClientError> {
    if !is_success(status) {
        return Err(ClientError::Service {
            status,
            body: body.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}
