#![allow(dead_code)]

use athlete_classifier::{
    classifier::HttpClassificationService,
    config::{ClassificationServiceConfig, ResponseValidation},
    orchestrator::RequestOrchestrator,
};
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::{json, Value};
use std::{io::Cursor, sync::Arc};
use wiremock::MockServer;

pub const CLASSIFY_PATH: &str = "/classify_image";

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Jpeg).unwrap();
    cursor.into_inner()
}

pub fn serena_response() -> Value {
    json!([
        {"athlete": "Serena Williams", "confidence": 0.94},
        {"athlete": "Roger Federer", "confidence": 0.05}
    ])
}

pub fn service_config(endpoint: String) -> ClassificationServiceConfig {
    ClassificationServiceConfig {
        endpoint,
        request_timeout_secs: None,
        validation: ResponseValidation::Passthrough,
    }
}

pub fn endpoint_of(server: &MockServer) -> String {
    format!("{}{}", server.uri(), CLASSIFY_PATH)
}

pub fn orchestrator_for(config: &ClassificationServiceConfig) -> Arc<RequestOrchestrator> {
    let service = HttpClassificationService::new(config).unwrap();
    Arc::new(RequestOrchestrator::new(Arc::new(service)))
}

/// An endpoint on a port nobody is listening on.
pub async fn offline_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, CLASSIFY_PATH)
}
