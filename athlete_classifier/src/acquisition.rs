use crate::{
    orchestrator::{Completion, PendingClassification, RequestOrchestrator},
    payload::{ImagePayload, PayloadError},
};
use bytes::Bytes;
use parking_lot::RwLock;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::instrument;

/// A file picked through the file dialog.
#[derive(Debug, Clone)]
pub enum SelectedFile {
    Path(PathBuf),
    Bytes {
        bytes: Bytes,
        content_type: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct DroppedItem {
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct DropEvent {
    pub items: Vec<DroppedItem>,
}

#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// The image is displayed and its classification is Pending.
    Accepted(PendingClassification),
    /// Nothing changed.
    Ignored,
}

impl AcquisitionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcquisitionOutcome::Accepted(_))
    }
}

/// Turns file selections and drops into image payloads and hands each one to
/// the orchestrator. Invalid input is dropped without a visible error.
pub struct AcquisitionSurface {
    orchestrator: Arc<RequestOrchestrator>,
    displayed: RwLock<Option<ImagePayload>>,
    drag_active: AtomicBool,
}

impl AcquisitionSurface {
    pub fn new(orchestrator: Arc<RequestOrchestrator>) -> Self {
        Self {
            orchestrator,
            displayed: RwLock::new(None),
            drag_active: AtomicBool::new(false),
        }
    }

    pub fn orchestrator(&self) -> &Arc<RequestOrchestrator> {
        &self.orchestrator
    }

    pub fn displayed_image(&self) -> Option<ImagePayload> {
        self.displayed.read().clone()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active.load(Ordering::SeqCst)
    }

    pub fn drag_over(&self) {
        self.drag_active.store(true, Ordering::SeqCst);
    }

    pub fn drag_leave(&self) {
        self.drag_active.store(false, Ordering::SeqCst);
    }

    #[instrument(skip(self, file))]
    pub async fn select_from_file_dialog(&self, file: SelectedFile) -> AcquisitionOutcome {
        let payload = match file {
            SelectedFile::Path(path) => ImagePayload::from_file(&path).await,
            SelectedFile::Bytes {
                bytes,
                content_type,
            } => ImagePayload::from_bytes(&bytes, content_type.as_deref()),
        };
        self.publish(payload)
    }

    #[instrument(skip(self, event), fields(items = event.items.len()))]
    pub fn select_from_drop(&self, event: DropEvent) -> AcquisitionOutcome {
        self.drag_leave();

        let Some(item) = event.items.into_iter().next() else {
            tracing::debug!("Drop without items ignored");
            return AcquisitionOutcome::Ignored;
        };

        self.publish(ImagePayload::from_declared_image(
            &item.bytes,
            &item.content_type,
        ))
    }

    /// Convenience for callers that want to wait for the whole cycle.
    pub async fn finish(&self, outcome: AcquisitionOutcome) -> Option<Completion> {
        match outcome {
            AcquisitionOutcome::Accepted(pending) => Some(self.orchestrator.complete(pending).await),
            AcquisitionOutcome::Ignored => None,
        }
    }

    fn publish(&self, payload: Result<ImagePayload, PayloadError>) -> AcquisitionOutcome {
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!("Ignoring unusable image input: {}", e);
                return AcquisitionOutcome::Ignored;
            }
        };

        // The displayed image and the latest request id change together, so
        // the newest request always belongs to the image on screen.
        let mut displayed = self.displayed.write();
        *displayed = Some(payload.clone());
        match self.orchestrator.begin(Some(payload)) {
            Some(pending) => AcquisitionOutcome::Accepted(pending),
            None => AcquisitionOutcome::Ignored,
        }
    }
}
