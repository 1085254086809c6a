mod config;
mod routes;
mod upstream;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use config::GatewayConfig;
use routes::configure_routes;
use std::env;
use upstream::UpstreamClient;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = GatewayConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let upstream = UpstreamClient::new(&config).map_err(|e| {
        log::error!("Failed to build upstream client: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    log::info!("Classifier at {}", config.classifier_url);
    log::info!("Knowledge base at {}", config.knowledge_base_url);
    log::info!("Serving frontend from {}", config.frontend_dir.display());

    let bind_address = config.bind_address();
    log::info!("Starting server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(upstream.clone()))
            .configure(|cfg| configure_routes(cfg, config.frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
