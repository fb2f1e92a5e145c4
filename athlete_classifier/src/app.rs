use crate::acquisition::AcquisitionSurface;
use crate::classifier::HttpClassificationService;
use crate::config::Config;
use crate::orchestrator::RequestOrchestrator;
use crate::roster::SupportedRoster;
use crate::server::{HttpServer, SharedState};
use crate::telemetry::Metrics;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub fn build_state(config: &Config) -> Result<SharedState, Box<dyn Error>> {
    let roster = match SupportedRoster::new(config.roster.clone()) {
        Ok(roster) => Arc::new(roster),
        Err(e) => {
            tracing::error!("Invalid roster configuration: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let service = match HttpClassificationService::new(&config.classification_service) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to initialize classification client: {:?}", e);
            return Err(Box::new(e));
        }
    };
    let classification_endpoint: Arc<str> = service.endpoint().into();

    let orchestrator = Arc::new(RequestOrchestrator::new(service));
    let surface = Arc::new(AcquisitionSurface::new(orchestrator));
    let metrics = Arc::new(Metrics::new()?);

    Ok(SharedState {
        surface,
        roster,
        metrics,
        classification_endpoint,
    })
}

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let state = build_state(&config)?;
    tracing::info!(
        "Forwarding classifications to {}",
        state.classification_endpoint
    );

    let server = HttpServer::new(state, &config.server).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
