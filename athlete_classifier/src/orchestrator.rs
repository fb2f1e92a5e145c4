use crate::{
    classifier::ClassificationService, payload::ImagePayload, prediction::PredictionSet,
};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::sync::watch;
use tracing::instrument;

pub const CLASSIFICATION_FAILED_MESSAGE: &str = "Error during classification. Please try again.";

/// Lifecycle of the most recent classification cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded(PredictionSet),
    Failed(String),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn predictions(&self) -> Option<&PredictionSet> {
        match self {
            RequestState::Succeeded(predictions) => Some(predictions),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Pending => "pending",
            RequestState::Succeeded(_) => "succeeded",
            RequestState::Failed(_) => "failed",
        }
    }
}

/// A classification that has been marked Pending but not sent yet.
#[derive(Debug)]
pub struct PendingClassification {
    id: u64,
    image: ImagePayload,
}

impl PendingClassification {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn image(&self) -> &ImagePayload {
        &self.image
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The response belonged to the latest request and is now the state.
    Applied { state: RequestState, elapsed: Duration },
    /// A newer request was started before this one resolved.
    Superseded { elapsed: Duration },
}

impl Completion {
    pub fn outcome(&self) -> &'static str {
        match self {
            Completion::Applied { state, .. } => state.as_str(),
            Completion::Superseded { .. } => "superseded",
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Completion::Applied { elapsed, .. } | Completion::Superseded { elapsed } => *elapsed,
        }
    }
}

/// Sole owner of [`RequestState`]. Everyone else observes it through
/// [`RequestOrchestrator::subscribe`].
pub struct RequestOrchestrator {
    service: Arc<dyn ClassificationService>,
    state: watch::Sender<RequestState>,
    latest_request: AtomicU64,
}

impl RequestOrchestrator {
    pub fn new(service: Arc<dyn ClassificationService>) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            service,
            state,
            latest_request: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    /// Marks a new cycle as Pending and clears the previous outcome.
    /// Returns `None` without touching state when there is no image.
    pub fn begin(&self, image: Option<ImagePayload>) -> Option<PendingClassification> {
        let image = image?;
        let mut id = 0;
        // Id allocation and the Pending transition share the watch lock so a
        // completion can never land between them.
        self.state.send_modify(|state| {
            id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
            *state = RequestState::Pending;
        });
        tracing::debug!(request_id = id, "Classification pending");
        Some(PendingClassification { id, image })
    }

    #[instrument(skip(self, pending), fields(request_id = pending.id))]
    pub async fn complete(&self, pending: PendingClassification) -> Completion {
        let started = Instant::now();
        let next = match self.service.classify(&pending.image).await {
            Ok(predictions) => RequestState::Succeeded(predictions),
            Err(e) => {
                tracing::error!("Error during classification: {}", e);
                RequestState::Failed(CLASSIFICATION_FAILED_MESSAGE.to_string())
            }
        };
        let elapsed = started.elapsed();

        let mut applied = None;
        self.state.send_if_modified(|state| {
            if self.latest_request.load(Ordering::SeqCst) != pending.id {
                return false;
            }
            *state = next.clone();
            applied = Some(next);
            true
        });

        match applied {
            Some(state) => {
                tracing::info!(
                    outcome = state.as_str(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Classification finished"
                );
                Completion::Applied { state, elapsed }
            }
            None => {
                tracing::debug!("Discarding response of superseded classification");
                Completion::Superseded { elapsed }
            }
        }
    }

    /// Runs one full classification cycle for `image`.
    pub async fn classify(&self, image: Option<ImagePayload>) -> Option<Completion> {
        let pending = self.begin(image)?;
        Some(self.complete(pending).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classifier::ClassificationError, prediction::Prediction};
    use async_trait::async_trait;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use parking_lot::Mutex;
    use std::{collections::HashMap, io::Cursor};
    use tokio::sync::Notify;

    fn payload(shade: u8) -> ImagePayload {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(4, 4, Rgb([shade, shade, shade]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        ImagePayload::from_bytes(cursor.get_ref(), None).unwrap()
    }

    fn predictions(items: &[(&str, f64)]) -> PredictionSet {
        items
            .iter()
            .map(|(athlete, confidence)| Prediction {
                athlete: athlete.to_string(),
                confidence: *confidence,
            })
            .collect::<Vec<_>>()
            .into()
    }

    /// Answers with a fixed prediction set, or fails when none is given.
    struct MockService {
        response: Option<PredictionSet>,
        calls: Mutex<usize>,
    }

    impl MockService {
        fn new(response: Option<PredictionSet>) -> Self {
            Self {
                response,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ClassificationService for MockService {
        async fn classify(&self, _image: &ImagePayload) -> Result<PredictionSet, ClassificationError> {
            *self.calls.lock() += 1;
            match &self.response {
                Some(predictions) => Ok(predictions.clone()),
                None => Err(ClassificationError::Status {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: "upstream down".to_string(),
                }),
            }
        }
    }

    /// Holds each response until its gate is opened.
    struct GatedService {
        gates: HashMap<String, (Arc<Notify>, PredictionSet)>,
    }

    #[async_trait]
    impl ClassificationService for GatedService {
        async fn classify(&self, image: &ImagePayload) -> Result<PredictionSet, ClassificationError> {
            let (gate, predictions) = &self.gates[image.as_str()];
            gate.notified().await;
            Ok(predictions.clone())
        }
    }

    #[tokio::test]
    async fn test_missing_image_is_a_noop() {
        let service = Arc::new(MockService::new(Some(predictions(&[("Virat Kohli", 0.8)]))));
        let orchestrator = RequestOrchestrator::new(service.clone());

        assert!(orchestrator.classify(None).await.is_none());
        assert_eq!(orchestrator.state(), RequestState::Idle);
        assert_eq!(*service.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_begin_sets_pending_before_the_request_resolves() {
        let service = Arc::new(MockService::new(None));
        let orchestrator = RequestOrchestrator::new(service.clone());
        let mut observer = orchestrator.subscribe();

        let pending = orchestrator.begin(Some(payload(1))).unwrap();

        assert_eq!(orchestrator.state(), RequestState::Pending);
        assert!(observer.has_changed().unwrap());
        assert!(observer.borrow_and_update().is_pending());
        assert_eq!(*service.calls.lock(), 0);

        orchestrator.complete(pending).await;
        assert_eq!(
            orchestrator.state(),
            RequestState::Failed(CLASSIFICATION_FAILED_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_new_cycle_clears_previous_results() {
        let expected = predictions(&[("Serena Williams", 0.94), ("Roger Federer", 0.05)]);
        let orchestrator =
            RequestOrchestrator::new(Arc::new(MockService::new(Some(expected.clone()))));

        let completion = orchestrator.classify(Some(payload(2))).await.unwrap();
        assert_eq!(completion.outcome(), "succeeded");
        assert_eq!(orchestrator.state().predictions(), Some(&expected));

        let pending = orchestrator.begin(Some(payload(3))).unwrap();
        assert_eq!(orchestrator.state(), RequestState::Pending);
        assert!(orchestrator.state().predictions().is_none());
        orchestrator.complete(pending).await;
    }

    #[tokio::test]
    async fn test_new_cycle_clears_previous_error() {
        let failing = RequestOrchestrator::new(Arc::new(MockService::new(None)));
        failing.classify(Some(payload(4))).await;
        assert_eq!(failing.state().error(), Some(CLASSIFICATION_FAILED_MESSAGE));

        failing.begin(Some(payload(5)));
        assert_eq!(failing.state().error(), None);
        assert!(failing.state().is_pending());
    }

    #[tokio::test]
    async fn test_later_request_wins_when_earlier_resolves_last() {
        let first = payload(10);
        let second = payload(20);
        let first_gate = Arc::new(Notify::new());
        let second_gate = Arc::new(Notify::new());
        let service = GatedService {
            gates: HashMap::from([
                (
                    first.as_str().to_string(),
                    (first_gate.clone(), predictions(&[("Lionel Messi", 0.7)])),
                ),
                (
                    second.as_str().to_string(),
                    (second_gate.clone(), predictions(&[("Virat Kohli", 0.9)])),
                ),
            ]),
        };
        let orchestrator = RequestOrchestrator::new(Arc::new(service));

        let first_pending = orchestrator.begin(Some(first)).unwrap();
        let second_pending = orchestrator.begin(Some(second)).unwrap();
        assert!(second_pending.id() > first_pending.id());

        second_gate.notify_one();
        let second_done = orchestrator.complete(second_pending).await;
        assert_eq!(second_done.outcome(), "succeeded");

        first_gate.notify_one();
        let first_done = orchestrator.complete(first_pending).await;
        assert_eq!(first_done.outcome(), "superseded");

        assert_eq!(
            orchestrator.state(),
            RequestState::Succeeded(predictions(&[("Virat Kohli", 0.9)]))
        );
    }

    #[tokio::test]
    async fn test_superseded_response_does_not_end_newer_pending() {
        let first = payload(30);
        let second = payload(40);
        let first_gate = Arc::new(Notify::new());
        let second_gate = Arc::new(Notify::new());
        let service = GatedService {
            gates: HashMap::from([
                (
                    first.as_str().to_string(),
                    (first_gate.clone(), predictions(&[("Maria Sharapova", 0.6)])),
                ),
                (
                    second.as_str().to_string(),
                    (second_gate.clone(), predictions(&[("Roger Federer", 0.8)])),
                ),
            ]),
        };
        let orchestrator = RequestOrchestrator::new(Arc::new(service));

        let first_pending = orchestrator.begin(Some(first)).unwrap();
        let second_pending = orchestrator.begin(Some(second)).unwrap();

        first_gate.notify_one();
        orchestrator.complete(first_pending).await;
        assert!(orchestrator.state().is_pending());

        second_gate.notify_one();
        orchestrator.complete(second_pending).await;
        assert_eq!(
            orchestrator.state().predictions().unwrap().top().unwrap().athlete,
            "Roger Federer"
        );
    }

    #[test]
    fn test_state_serializes_with_status_tag() {
        let json = serde_json::to_value(RequestState::Failed("boom".to_string())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["value"], "boom");
    }
}
