//! Per-concept card state: image generation and editing, text refinement and
//! the copied-hex indicator. A card never touches the shared concept list; a
//! successful refinement is handed back to the caller as a replacement.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use lumina_gateway::{GatewayError, GatewayResult};
use lumina_schema::{CardOperation, Concept, GeneratedImage, ImageData, RequestState};
use tokio::time::Instant;
use uuid::Uuid;

use crate::clipboard::Clipboard;

pub const IMAGE_FAILED_MESSAGE: &str = "Failed to generate image. Please try again.";
pub const EDIT_FAILED_MESSAGE: &str = "Failed to edit image.";
pub const REFINE_FAILED_MESSAGE: &str = "Failed to refine concept.";
pub const CLIPBOARD_FAILED_MESSAGE: &str = "Could not access the clipboard.";

pub const COPY_FEEDBACK_WINDOW: Duration = Duration::from_secs(2);

/// Work a card wants done by the gateway.
#[derive(Debug, Clone)]
pub struct CardRequest {
    pub trace_id: Uuid,
    pub index: usize,
    /// Card revision at dispatch; completions for an older revision are dropped.
    pub revision: u64,
    pub kind: CardRequestKind,
}

#[derive(Debug, Clone)]
pub enum CardRequestKind {
    GenerateImage { visual_description: String },
    EditImage { image: ImageData, instruction: String },
    Refine { concept: Concept, feedback: String },
}

impl CardRequest {
    pub fn operation(&self) -> CardOperation {
        match self.kind {
            CardRequestKind::GenerateImage { .. } => CardOperation::GenerateImage,
            CardRequestKind::EditImage { .. } => CardOperation::EditImage,
            CardRequestKind::Refine { .. } => CardOperation::Refine,
        }
    }
}

#[derive(Debug)]
pub enum CardOutcome {
    ImageGenerated(GatewayResult<ImageData>),
    ImageEdited(GatewayResult<ImageData>),
    Refined(GatewayResult<Concept>),
}

impl CardOutcome {
    /// A failed outcome for `operation`, used when the call never produced one.
    pub fn failed(operation: CardOperation, error: GatewayError) -> Self {
        match operation {
            CardOperation::GenerateImage => CardOutcome::ImageGenerated(Err(error)),
            CardOperation::EditImage => CardOutcome::ImageEdited(Err(error)),
            CardOperation::Refine => CardOutcome::Refined(Err(error)),
        }
    }

    pub fn operation(&self) -> CardOperation {
        match self {
            CardOutcome::ImageGenerated(_) => CardOperation::GenerateImage,
            CardOutcome::ImageEdited(_) => CardOperation::EditImage,
            CardOutcome::Refined(_) => CardOperation::Refine,
        }
    }
}

/// What applying an outcome did to the card.
#[derive(Debug, Clone, PartialEq)]
pub enum CardUpdate {
    ImageStored { edited: bool },
    /// The caller must install this concept in the list; the image is already gone.
    ConceptRefined(Concept),
    Failed { operation: CardOperation, error: String },
    Stale { operation: CardOperation },
}

#[derive(Debug, Default, Clone, Copy)]
struct OperationTracker {
    state: RequestState,
    pending: usize,
}

impl OperationTracker {
    fn start(&mut self) {
        self.pending += 1;
        self.state = RequestState::InFlight;
    }

    fn finish(&mut self, state: RequestState) {
        self.pending = self.pending.saturating_sub(1);
        self.state = if self.pending > 0 {
            RequestState::InFlight
        } else {
            state
        };
    }
}

#[derive(Debug, Clone)]
struct CopiedHex {
    hex: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct ConceptCard {
    index: usize,
    revision: u64,
    image: Option<GeneratedImage>,
    image_op: OperationTracker,
    edit_op: OperationTracker,
    refine_op: OperationTracker,
    error: Option<String>,
    copied: Option<CopiedHex>,
    copy_window: Duration,
}

impl ConceptCard {
    pub fn new(index: usize) -> Self {
        Self::with_copy_window(index, COPY_FEEDBACK_WINDOW)
    }

    pub fn with_copy_window(index: usize, copy_window: Duration) -> Self {
        Self {
            index,
            revision: 0,
            image: None,
            image_op: OperationTracker::default(),
            edit_op: OperationTracker::default(),
            refine_op: OperationTracker::default(),
            error: None,
            copied: None,
            copy_window,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn image(&self) -> Option<&GeneratedImage> {
        self.image.as_ref()
    }

    pub fn image_state(&self) -> RequestState {
        self.image_op.state
    }

    pub fn edit_state(&self) -> RequestState {
        self.edit_op.state
    }

    pub fn refine_state(&self) -> RequestState {
        self.refine_op.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.image_op.pending + self.edit_op.pending + self.refine_op.pending > 0
    }

    /// Always allowed; overlapping requests resolve in arrival order.
    pub fn begin_generate_image(&mut self, concept: &Concept) -> CardRequest {
        self.error = None;
        self.image_op.start();
        self.request(CardRequestKind::GenerateImage {
            visual_description: concept.visual_description.clone(),
        })
    }

    /// `None` without an image or with a blank instruction.
    pub fn begin_edit_image(&mut self, instruction: &str) -> Option<CardRequest> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return None;
        }
        let image = self.image.as_ref()?.image.clone();
        self.error = None;
        self.edit_op.start();
        Some(self.request(CardRequestKind::EditImage {
            image,
            instruction: instruction.to_string(),
        }))
    }

    /// `None` with blank feedback.
    pub fn begin_refine(&mut self, concept: &Concept, feedback: &str) -> Option<CardRequest> {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return None;
        }
        self.error = None;
        self.refine_op.start();
        Some(self.request(CardRequestKind::Refine {
            concept: concept.clone(),
            feedback: feedback.to_string(),
        }))
    }

    fn request(&self, kind: CardRequestKind) -> CardRequest {
        CardRequest {
            trace_id: Uuid::new_v4(),
            index: self.index,
            revision: self.revision,
            kind,
        }
    }

    pub fn apply(&mut self, revision: u64, outcome: CardOutcome) -> CardUpdate {
        let operation = outcome.operation();
        if revision != self.revision {
            let tracker = self.tracker_mut(operation);
            let settled = if tracker.state == RequestState::InFlight {
                RequestState::Idle
            } else {
                tracker.state
            };
            tracker.finish(settled);
            return CardUpdate::Stale { operation };
        }

        match outcome {
            CardOutcome::ImageGenerated(result) | CardOutcome::ImageEdited(result) => {
                let edited = operation == CardOperation::EditImage;
                match result {
                    Ok(image) => {
                        self.image = Some(GeneratedImage::new(self.index, image));
                        self.tracker_mut(operation).finish(RequestState::Succeeded);
                        CardUpdate::ImageStored { edited }
                    }
                    Err(err) => {
                        tracing::warn!(index = self.index, %operation, error = %err, "image request failed");
                        let message = if edited {
                            EDIT_FAILED_MESSAGE
                        } else {
                            IMAGE_FAILED_MESSAGE
                        };
                        self.fail(operation, message)
                    }
                }
            }
            CardOutcome::Refined(Ok(concept)) => {
                self.revision += 1;
                self.image = None;
                self.image_op = OperationTracker {
                    state: RequestState::Idle,
                    pending: self.image_op.pending,
                };
                self.refine_op.finish(RequestState::Succeeded);
                CardUpdate::ConceptRefined(concept)
            }
            CardOutcome::Refined(Err(err)) => {
                tracing::warn!(index = self.index, error = %err, "refinement failed");
                self.fail(operation, REFINE_FAILED_MESSAGE)
            }
        }
    }

    fn fail(&mut self, operation: CardOperation, message: &str) -> CardUpdate {
        self.tracker_mut(operation).finish(RequestState::Failed);
        self.error = Some(message.to_string());
        CardUpdate::Failed {
            operation,
            error: message.to_string(),
        }
    }

    fn tracker_mut(&mut self, operation: CardOperation) -> &mut OperationTracker {
        match operation {
            CardOperation::GenerateImage => &mut self.image_op,
            CardOperation::EditImage => &mut self.edit_op,
            CardOperation::Refine => &mut self.refine_op,
        }
    }

    /// Copies `hex` and shows the copied marker for the card's copy window.
    pub fn copy_color_hex(&mut self, hex: &str, clipboard: &dyn Clipboard) -> bool {
        if let Err(err) = clipboard.set_text(hex) {
            tracing::warn!(index = self.index, error = %err, "clipboard write failed");
            self.error = Some(CLIPBOARD_FAILED_MESSAGE.to_string());
            return false;
        }
        self.copied = Some(CopiedHex {
            hex: hex.to_string(),
            expires_at: Instant::now() + self.copy_window,
        });
        true
    }

    pub fn copied_hex(&self) -> Option<&str> {
        self.copied
            .as_ref()
            .filter(|c| Instant::now() < c.expires_at)
            .map(|c| c.hex.as_str())
    }

    /// Drops an expired marker; returns whether one was cleared.
    pub fn expire_copied(&mut self) -> bool {
        let expired = self
            .copied
            .as_ref()
            .is_some_and(|c| Instant::now() >= c.expires_at);
        if expired {
            self.copied = None;
        }
        expired
    }

    /// Writes the current image as `<concept-name>-logo.<ext>` inside `dir`.
    pub fn save_image(&self, concept: &Concept, dir: &Path) -> Result<PathBuf> {
        let generated = self
            .image
            .as_ref()
            .ok_or_else(|| anyhow!("concept '{}' has no generated image", concept.name))?;
        let bytes = generated.image.decode()?;
        let path = dir.join(concept.asset_file_name(generated.image.file_extension()));
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write image: {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved concept image");
        Ok(path)
    }
}
