use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::{StatusCode, header};
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use shared::PredictionSet;
use std::path::PathBuf;

use crate::config::GatewayConfig;
use crate::upstream::{Relayed, Upload, UpstreamClient, UpstreamError};

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    disease: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: PathBuf) {
    configure_api(cfg);
    cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
}

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/kb/search").route(web::get().to(handle_kb_search)));
}

fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: message.into(),
    })
}

fn upstream_failure(service: &str, err: &UpstreamError) -> HttpResponse {
    error!("{} request failed: {}", service, err);
    let status = match err {
        UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    };
    error_response(status, format!("{} unavailable", service))
}

fn relay(relayed: Relayed) -> HttpResponse {
    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    if let Some(content_type) = relayed.content_type {
        builder.insert_header((header::CONTENT_TYPE, content_type));
    }
    builder.body(relayed.body)
}

fn log_predictions(relayed: &Relayed) {
    if !relayed.is_success() {
        warn!("Classifier responded with status {}", relayed.status);
        return;
    }
    match serde_json::from_slice::<PredictionSet>(&relayed.body) {
        Ok(predictions) => match predictions.primary() {
            Some(top) => info!(
                "Classifier returned {} prediction(s), primary '{}' at {:.2}",
                predictions.len(),
                top.disease_name,
                top.confidence
            ),
            None => info!("Classifier returned no predictions"),
        },
        Err(e) => warn!("Classifier body is not a prediction list: {}", e),
    }
}

async fn handle_predict(
    config: web::Data<GatewayConfig>,
    upstream: web::Data<UpstreamClient>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload.try_next().await? {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            if bytes.len() + data.len() > config.max_upload_bytes {
                warn!(
                    "Rejecting {}: larger than {} bytes",
                    file_name, config.max_upload_bytes
                );
                return Ok(error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Image exceeds {} bytes", config.max_upload_bytes),
                ));
            }
            bytes.extend_from_slice(&data);
        }

        if upload.is_none() && !bytes.is_empty() {
            upload = Some((file_name, bytes));
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "No image file provided"));
    };

    let format = match image::guess_format(&bytes) {
        Ok(format) => format,
        Err(e) => {
            warn!("Rejecting {}: not a recognised image ({})", file_name, e);
            return Ok(error_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Uploaded file is not a supported image",
            ));
        }
    };

    let upload = Upload {
        file_name,
        media_type: format.to_mime_type().to_string(),
        bytes,
    };

    match upstream.predict(upload).await {
        Ok(relayed) => {
            log_predictions(&relayed);
            Ok(relay(relayed))
        }
        Err(e) => Ok(upstream_failure("Classifier", &e)),
    }
}

async fn handle_kb_search(
    upstream: web::Data<UpstreamClient>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let Some(disease) = query
        .disease
        .as_deref()
        .filter(|disease| !disease.trim().is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'disease' parameter");
    };

    match upstream.search_knowledge(disease).await {
        Ok(relayed) => {
            if relayed.status == StatusCode::NOT_FOUND.as_u16() {
                info!("No knowledge base entry for '{}'", disease);
            } else if !relayed.is_success() {
                warn!("Knowledge base responded with status {}", relayed.status);
            }
            relay(relayed)
        }
        Err(e) => upstream_failure("Knowledge base", &e),
    }
}
