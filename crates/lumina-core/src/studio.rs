use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use lumina_bus::BusPublisher;
use lumina_gateway::{ConceptGateway, GatewayError, GatewayResult, TransportKind};
use lumina_schema::{Concept, StudioEvent};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::card::{CardOutcome, CardRequest, CardRequestKind, CardUpdate, ConceptCard, COPY_FEEDBACK_WINDOW};
use crate::clipboard::Clipboard;
use crate::form::{FormInput, GenerationForm, SubmitOutcome};

/// A finished gateway call waiting to be applied on the owner's loop.
#[derive(Debug)]
pub enum Completion {
    Submitted {
        trace_id: Uuid,
        result: GatewayResult<Vec<Concept>>,
    },
    Card {
        trace_id: Uuid,
        generation: u64,
        index: usize,
        revision: u64,
        outcome: CardOutcome,
    },
}

/// Owns the form and its cards. Gateway calls run on spawned tasks and report
/// back through [`Completion`]s; all state changes happen in [`Studio::apply`].
pub struct Studio {
    gateway: Arc<dyn ConceptGateway>,
    clipboard: Arc<dyn Clipboard>,
    publisher: Option<BusPublisher>,
    form: GenerationForm,
    cards: Vec<ConceptCard>,
    copy_window: Duration,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl Studio {
    pub fn new(gateway: Arc<dyn ConceptGateway>, clipboard: Arc<dyn Clipboard>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            clipboard,
            publisher: None,
            form: GenerationForm::new(),
            cards: Vec::new(),
            copy_window: COPY_FEEDBACK_WINDOW,
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    pub fn with_publisher(mut self, publisher: BusPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_copy_window(mut self, copy_window: Duration) -> Self {
        self.copy_window = copy_window;
        self
    }

    pub fn form(&self) -> &GenerationForm {
        &self.form
    }

    pub fn concepts(&self) -> &[Concept] {
        self.form.concepts()
    }

    pub fn cards(&self) -> &[ConceptCard] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&ConceptCard> {
        self.cards.get(index)
    }

    /// Number of dispatched calls whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Starts a concept generation. Returns `false` when the input is
    /// incomplete or another generation is still running.
    pub fn submit(&mut self, input: &FormInput) -> bool {
        let Some(ticket) = self.form.begin_submit(input) else {
            return false;
        };

        let gateway = self.gateway.clone();
        let tx = self.completions_tx.clone();
        let trace_id = ticket.trace_id;
        tokio::spawn(async move {
            let FormInput {
                business_name,
                industry,
                style,
            } = ticket.input;
            tracing::info!(%trace_id, %business_name, %industry, %style, "requesting concepts");
            let call = tokio::spawn(async move {
                gateway
                    .generate_concepts(&business_name, &industry, &style)
                    .await
            });
            let result = call.await.unwrap_or_else(|e| {
                tracing::error!(%trace_id, error = %e, "concept request task panicked");
                Err(task_failed(e))
            });
            let _ = tx.send(Completion::Submitted { trace_id, result });
        });
        self.in_flight += 1;
        true
    }

    /// Installs `concepts` as a fresh list with new cards and returns its generation.
    pub fn load_concepts(&mut self, concepts: Vec<Concept>) -> u64 {
        let count = concepts.len();
        let generation = self.form.replace_concepts(concepts);
        self.reset_cards(count);
        tracing::info!(generation, count, "concept list loaded");
        generation
    }

    fn reset_cards(&mut self, count: usize) {
        let window = self.copy_window;
        self.cards = (0..count)
            .map(|index| ConceptCard::with_copy_window(index, window))
            .collect();
    }

    pub fn generate_image(&mut self, index: usize) -> bool {
        let Some(concept) = self.form.concepts().get(index).cloned() else {
            return false;
        };
        let Some(card) = self.cards.get_mut(index) else {
            return false;
        };
        let request = card.begin_generate_image(&concept);
        self.dispatch(request);
        true
    }

    pub fn edit_image(&mut self, index: usize, instruction: &str) -> bool {
        let Some(request) = self
            .cards
            .get_mut(index)
            .and_then(|card| card.begin_edit_image(instruction))
        else {
            return false;
        };
        self.dispatch(request);
        true
    }

    pub fn refine_text(&mut self, index: usize, feedback: &str) -> bool {
        let Some(concept) = self.form.concepts().get(index).cloned() else {
            return false;
        };
        let Some(request) = self
            .cards
            .get_mut(index)
            .and_then(|card| card.begin_refine(&concept, feedback))
        else {
            return false;
        };
        self.dispatch(request);
        true
    }

    fn dispatch(&mut self, request: CardRequest) {
        let gateway = self.gateway.clone();
        let tx = self.completions_tx.clone();
        let generation = self.form.generation();
        let operation = request.operation();
        let CardRequest {
            trace_id,
            index,
            revision,
            kind,
        } = request;
        tokio::spawn(async move {
            let call = tokio::spawn(async move {
                match kind {
                    CardRequestKind::GenerateImage { visual_description } => {
                        tracing::debug!(%trace_id, index, "requesting image");
                        CardOutcome::ImageGenerated(gateway.generate_image(&visual_description).await)
                    }
                    CardRequestKind::EditImage { image, instruction } => {
                        tracing::debug!(%trace_id, index, %instruction, "requesting image edit");
                        CardOutcome::ImageEdited(gateway.edit_image(&image, &instruction).await)
                    }
                    CardRequestKind::Refine { concept, feedback } => {
                        tracing::debug!(%trace_id, index, %feedback, "requesting refinement");
                        CardOutcome::Refined(gateway.refine_concept(&concept, &feedback).await)
                    }
                }
            });
            let outcome = call.await.unwrap_or_else(|e| {
                tracing::error!(%trace_id, index, %operation, error = %e, "card request task panicked");
                CardOutcome::failed(operation, task_failed(e))
            });
            let _ = tx.send(Completion::Card {
                trace_id,
                generation,
                index,
                revision,
                outcome,
            });
        });
        self.in_flight += 1;
    }

    /// Copies a swatch hex from card `index` and publishes `HexCopied`.
    pub async fn copy_color_hex(&mut self, index: usize, hex: &str) -> bool {
        let Some(card) = self.cards.get_mut(index) else {
            return false;
        };
        if !card.copy_color_hex(hex, self.clipboard.as_ref()) {
            return false;
        }
        self.publish(StudioEvent::HexCopied {
            index,
            hex: hex.to_string(),
        })
        .await;
        true
    }

    /// Clears expired copy markers; returns whether any card changed.
    pub fn expire_copied(&mut self) -> bool {
        self.cards
            .iter_mut()
            .fold(false, |changed, card| card.expire_copied() || changed)
    }

    pub fn save_image(&self, index: usize, dir: &Path) -> Result<PathBuf> {
        let concept = self
            .form
            .concepts()
            .get(index)
            .ok_or_else(|| anyhow!("no concept at index {index}"))?;
        let card = self
            .cards
            .get(index)
            .ok_or_else(|| anyhow!("no card at index {index}"))?;
        card.save_image(concept, dir)
    }

    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.try_recv().ok()
    }

    /// Applies one completion and returns the event it produced.
    pub async fn apply(&mut self, completion: Completion) -> Option<StudioEvent> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let event = match completion {
            Completion::Submitted { trace_id, result } => self.apply_submit(trace_id, result),
            Completion::Card {
                trace_id,
                generation,
                index,
                revision,
                outcome,
            } => Some(self.apply_card(trace_id, generation, index, revision, outcome)),
        }?;
        self.publish(event.clone()).await;
        Some(event)
    }

    fn apply_submit(
        &mut self,
        trace_id: Uuid,
        result: GatewayResult<Vec<Concept>>,
    ) -> Option<StudioEvent> {
        match self.form.finish_submit(trace_id, result)? {
            SubmitOutcome::Generated { generation, count } => {
                self.reset_cards(count);
                Some(StudioEvent::ConceptsGenerated {
                    trace_id,
                    generation,
                    count,
                    at: Utc::now(),
                })
            }
            SubmitOutcome::Failed { error } => Some(StudioEvent::GenerationFailed {
                trace_id,
                error,
                at: Utc::now(),
            }),
        }
    }

    fn apply_card(
        &mut self,
        trace_id: Uuid,
        generation: u64,
        index: usize,
        revision: u64,
        outcome: CardOutcome,
    ) -> StudioEvent {
        let operation = outcome.operation();
        let current = self.form.generation();
        let card = match self.cards.get_mut(index) {
            Some(card) if generation == current => card,
            _ => {
                tracing::info!(%trace_id, generation, current, index, %operation, "discarding completion for replaced concept list");
                return StudioEvent::StaleDiscarded {
                    trace_id,
                    generation,
                    index,
                    operation,
                };
            }
        };

        match card.apply(revision, outcome) {
            CardUpdate::ImageStored { edited } => StudioEvent::ImageReady {
                trace_id,
                generation,
                index,
                edited,
            },
            CardUpdate::ConceptRefined(concept) => {
                self.form.update_concept(generation, index, concept.clone());
                StudioEvent::ConceptUpdated {
                    trace_id,
                    generation,
                    index,
                    concept,
                }
            }
            CardUpdate::Failed { operation, error } => StudioEvent::CardFailed {
                trace_id,
                generation,
                index,
                operation,
                error,
            },
            CardUpdate::Stale { operation } => {
                tracing::info!(%trace_id, index, revision, %operation, "discarding completion for refined concept");
                StudioEvent::StaleDiscarded {
                    trace_id,
                    generation,
                    index,
                    operation,
                }
            }
        }
    }

    /// Waits for every dispatched call and applies it.
    pub async fn settle(&mut self) -> Vec<StudioEvent> {
        let mut events = Vec::new();
        while self.in_flight > 0 {
            let Some(completion) = self.completions_rx.recv().await else {
                break;
            };
            if let Some(event) = self.apply(completion).await {
                events.push(event);
            }
        }
        events
    }

    async fn publish(&self, event: StudioEvent) {
        if let Some(publisher) = &self.publisher {
            if let Err(err) = publisher.publish(event).await {
                tracing::warn!(error = %err, "failed to publish studio event");
            }
        }
    }
}

/// A gateway call that died before answering still completes, so `in_flight`
/// always drains.
fn task_failed(err: JoinError) -> GatewayError {
    GatewayError::transport(TransportKind::Other, format!("gateway task panicked: {err}"))
}
