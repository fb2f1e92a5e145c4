use crate::{
    acquisition::AcquisitionSurface, config::ServerConfig, render::ClassificationView,
    roster::SupportedRoster, routes::api_routes, telemetry::Metrics,
};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct SharedState {
    pub surface: Arc<AcquisitionSurface>,
    pub roster: Arc<SupportedRoster>,
    pub metrics: Arc<Metrics>,
    pub classification_endpoint: Arc<str>,
}

impl SharedState {
    pub fn view(&self) -> ClassificationView {
        let image = self.surface.displayed_image();
        let state = self.surface.orchestrator().state();
        ClassificationView::from_state(
            image.as_ref().map(|image| image.as_str()),
            self.surface.is_drag_active(),
            &state,
        )
    }
}

pub fn build_router(state: SharedState) -> Router {
    let metrics_layer = HttpMetricsLayerBuilder::new().build();

    Router::new()
        .merge(api_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .layer(metrics_layer)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(state: SharedState, config: &ServerConfig) -> anyhow::Result<Self> {
        let router = build_router(state);
        let listener = TcpListener::bind(config.get_address()).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        mut shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            Ok(())
        });

        Ok(server_handle)
    }
}
