use crate::{
    config::{ClassificationServiceConfig, ResponseValidation},
    payload::ImagePayload,
    prediction::PredictionSet,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Classification request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Classification service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Invalid classification response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("Prediction {index} rejected: {reason}")]
    Validation { index: usize, reason: String },
}

#[async_trait]
pub trait ClassificationService: Send + Sync + 'static {
    async fn classify(&self, image: &ImagePayload) -> Result<PredictionSet, ClassificationError>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    image_data: &'a str,
}

/// Talks to the external classification service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClassificationService {
    http: Client,
    endpoint: String,
    validation: ResponseValidation,
}

impl HttpClassificationService {
    pub fn new(config: &ClassificationServiceConfig) -> Result<Self, ClassificationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.get_request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            validation: config.validation,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ClassificationService for HttpClassificationService {
    #[instrument(skip(self, image), fields(endpoint = %self.endpoint, content_type = image.content_type()))]
    async fn classify(&self, image: &ImagePayload) -> Result<PredictionSet, ClassificationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ClassifyRequest {
                image_data: image.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Classification service responded with {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Status { status, body });
        }

        let body = response.bytes().await?;
        let predictions: PredictionSet = serde_json::from_slice(&body)?;

        if self.validation == ResponseValidation::Strict {
            validate(&predictions)?;
        }

        tracing::debug!("Received {} predictions", predictions.len());
        Ok(predictions)
    }
}

pub fn validate(predictions: &PredictionSet) -> Result<(), ClassificationError> {
    for (index, prediction) in predictions.iter().enumerate() {
        if prediction.athlete.trim().is_empty() {
            return Err(ClassificationError::Validation {
                index,
                reason: "empty athlete label".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&prediction.confidence) {
            return Err(ClassificationError::Validation {
                index,
                reason: format!("confidence {} outside 0..=1", prediction.confidence),
            });
        }
    }
    Ok(())
}
