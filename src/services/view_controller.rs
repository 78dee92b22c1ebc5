//! View state machine for the classifier screen.
//!
//! ```text
//!   Idle ──upload──▶ Loading ──ok──▶ Success
//!    ▲                 │  └──err──▶ Error
//!    └─────reset───────┴──────────────┘
//! ```
//!
//! Each upload gets a fresh `RequestId`. A response is only applied while
//! its request is still the one being shown; anything that finishes after a
//! reset or a newer upload is dropped.

use crate::error::{failure_message, ClassifyError};
use crate::models::classify_types::{ClassificationResult, Status};
use crate::models::image_types::{ImageFile, ImagePreview};
use crate::models::view_types::ViewSnapshot;
use crate::services::classifier::Classifier;
use crate::services::preview_service::{self, PreviewStore};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading {
        request: RequestId,
        preview: ImagePreview,
    },
    Success {
        result: ClassificationResult,
        preview: ImagePreview,
    },
    Error {
        message: String,
    },
}

#[derive(Debug)]
pub struct ViewController {
    state: ViewState,
    last_request: u64,
    previews: PreviewStore,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            state: ViewState::Idle,
            last_request: 0,
            previews: PreviewStore::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn status(&self) -> Status {
        match self.state {
            ViewState::Idle => Status::Idle,
            ViewState::Loading { .. } => Status::Loading,
            ViewState::Success { .. } => Status::Success,
            ViewState::Error { .. } => Status::Error,
        }
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Enter `Loading` with a new preview, dropping whatever was shown before.
    pub fn begin_upload(&mut self, preview_data_url: String) -> RequestId {
        self.clear();
        self.last_request += 1;
        let request = RequestId(self.last_request);
        let preview = self.previews.register(preview_data_url);
        self.state = ViewState::Loading { request, preview };
        request
    }

    /// Swap the preview shown for `request`, keeping the same preview handle.
    /// Returns false when the request is no longer loading.
    pub fn replace_preview(&mut self, request: RequestId, data_url: String) -> bool {
        match &mut self.state {
            ViewState::Loading { request: r, preview } if *r == request => {
                preview.data_url = data_url;
                true
            }
            _ => false,
        }
    }

    /// Apply the classifier's answer for `request`. Returns false when the
    /// request is no longer current and the outcome was discarded.
    pub fn complete(
        &mut self,
        request: RequestId,
        outcome: Result<ClassificationResult, ClassifyError>,
    ) -> bool {
        let preview = match std::mem::replace(&mut self.state, ViewState::Idle) {
            ViewState::Loading { request: r, preview } if r == request => preview,
            other => {
                self.state = other;
                tracing::debug!(request = request.0, "discarding stale classification outcome");
                return false;
            }
        };

        self.state = match outcome {
            Ok(result) => ViewState::Success { result, preview },
            Err(err) => {
                let message = failure_message(&err);
                tracing::warn!(request = request.0, "classification failed: {}", message);
                self.previews.release(preview);
                ViewState::Error { message }
            }
        };
        true
    }

    pub fn reset(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        match std::mem::replace(&mut self.state, ViewState::Idle) {
            ViewState::Loading { preview, .. } | ViewState::Success { preview, .. } => {
                self.previews.release(preview)
            }
            ViewState::Idle | ViewState::Error { .. } => {}
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        match &self.state {
            ViewState::Idle => ViewSnapshot::idle(),
            ViewState::Loading { preview, .. } => ViewSnapshot {
                status: Status::Loading,
                result: None,
                error: None,
                image_preview: Some(preview.data_url.clone()),
            },
            ViewState::Success { result, preview } => ViewSnapshot {
                status: Status::Success,
                result: Some(result.clone()),
                error: None,
                image_preview: Some(preview.data_url.clone()),
            },
            ViewState::Error { message } => ViewSnapshot {
                status: Status::Error,
                result: None,
                error: Some(message.clone()),
                image_preview: None,
            },
        }
    }
}

/// Drives a `ViewController` against a `Classifier` and publishes every
/// state change on a watch channel.
#[derive(Clone)]
pub struct ClassificationSession {
    controller: Arc<Mutex<ViewController>>,
    classifier: Arc<dyn Classifier>,
    updates: Arc<watch::Sender<ViewSnapshot>>,
    preview_max_edge: u32,
}

impl ClassificationSession {
    pub fn new(classifier: Arc<dyn Classifier>, preview_max_edge: u32) -> Self {
        let (updates, _) = watch::channel(ViewSnapshot::idle());
        Self {
            controller: Arc::new(Mutex::new(ViewController::new())),
            classifier,
            updates: Arc::new(updates),
            preview_max_edge,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.controller.lock().await.snapshot()
    }

    pub async fn status(&self) -> Status {
        self.controller.lock().await.status()
    }

    pub async fn live_previews(&self) -> usize {
        self.controller.lock().await.previews().live_count()
    }

    /// Show `file`, classify it and return the view as it stands afterwards.
    /// The view enters `Loading` with the original bytes as preview; the
    /// downsized preview is rendered while the classifier runs.
    pub async fn upload_image(&self, file: ImageFile) -> ViewSnapshot {
        let file = Arc::new(file);

        let request = {
            let mut controller = self.controller.lock().await;
            let request = controller.begin_upload(preview_service::original_data_url(&file));
            self.publish(&controller);
            request
        };
        tracing::info!(file = %file.file_name, request = request.0, "classifying image");

        let max_edge = self.preview_max_edge;
        let preview_file = file.clone();
        let render = tokio::task::spawn_blocking(move || {
            preview_service::render_preview(&preview_file, max_edge)
        });

        let (rendered, outcome) = tokio::join!(render, self.classifier.classify(&file));

        let mut controller = self.controller.lock().await;
        match rendered {
            Ok(data_url) => {
                controller.replace_preview(request, data_url);
            }
            Err(e) => tracing::error!("preview task failed, keeping original image: {}", e),
        }
        if controller.complete(request, outcome) {
            self.publish(&controller);
        }
        controller.snapshot()
    }

    pub async fn reset(&self) -> ViewSnapshot {
        let mut controller = self.controller.lock().await;
        controller.reset();
        self.publish(&controller);
        controller.snapshot()
    }

    fn publish(&self, controller: &ViewController) {
        self.updates.send_replace(controller.snapshot());
    }
}
