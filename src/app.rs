use crate::{config::Config, ort_service::OrtModelService, server::HttpServer};
use std::sync::Arc;

pub async fn start_app(config: Config) -> anyhow::Result<()> {
    let model_service = match OrtModelService::new(&config.model) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to initialize model service: {}", e);
            return Err(e.into());
        }
    };

    let server = HttpServer::new(model_service, &config.server).await?;
    tracing::info!("Listening on {}", config.server.get_address());

    server.run().await
}
