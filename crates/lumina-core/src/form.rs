//! Top-level generation form: input validation, the single in-flight
//! submission and the authoritative concept list.

use lumina_gateway::GatewayResult;
use lumina_schema::{Concept, RequestState};
use uuid::Uuid;

pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate concepts. Please check your API key and try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub business_name: String,
    pub industry: String,
    pub style: String,
}

impl FormInput {
    pub fn new(
        business_name: impl Into<String>,
        industry: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            business_name: business_name.into(),
            industry: industry.into(),
            style: style.into(),
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.business_name.trim().is_empty() && !self.industry.trim().is_empty()
    }

    fn trimmed(&self) -> Self {
        Self {
            business_name: self.business_name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            style: self.style.trim().to_string(),
        }
    }
}

/// Issued when a submission is accepted; the caller runs it against the gateway.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub trace_id: Uuid,
    pub input: FormInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Generated { generation: u64, count: usize },
    Failed { error: String },
}

#[derive(Debug, Default)]
pub struct GenerationForm {
    state: RequestState,
    error: Option<String>,
    concepts: Vec<Concept>,
    generation: u64,
    pending: Option<Uuid>,
}

impl GenerationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    /// Identifies the current concept list; bumps every time the list is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn can_submit(&self) -> bool {
        !self.state.is_in_flight()
    }

    /// `None` when the input is incomplete or a submission is already running.
    /// Prior results stay visible until a new list is confirmed.
    pub fn begin_submit(&mut self, input: &FormInput) -> Option<SubmitTicket> {
        if !input.is_submittable() {
            tracing::debug!("submit skipped: business name and industry are required");
            return None;
        }
        if !self.can_submit() {
            tracing::debug!("submit skipped: generation already in flight");
            return None;
        }

        let trace_id = Uuid::new_v4();
        self.state = RequestState::InFlight;
        self.error = None;
        self.pending = Some(trace_id);
        Some(SubmitTicket {
            trace_id,
            input: input.trimmed(),
        })
    }

    pub fn finish_submit(
        &mut self,
        trace_id: Uuid,
        result: GatewayResult<Vec<Concept>>,
    ) -> Option<SubmitOutcome> {
        if self.pending != Some(trace_id) {
            tracing::debug!(%trace_id, "ignoring completion for unknown submission");
            return None;
        }
        self.pending = None;

        match result {
            Ok(concepts) => {
                let count = concepts.len();
                let generation = self.replace_concepts(concepts);
                self.state = RequestState::Succeeded;
                tracing::info!(%trace_id, generation, count, "concepts generated");
                Some(SubmitOutcome::Generated { generation, count })
            }
            Err(err) => {
                tracing::warn!(%trace_id, error = %err, "concept generation failed");
                self.state = RequestState::Failed;
                self.error = Some(GENERATION_FAILED_MESSAGE.to_string());
                Some(SubmitOutcome::Failed {
                    error: GENERATION_FAILED_MESSAGE.to_string(),
                })
            }
        }
    }

    /// Installs a new list and returns its generation.
    pub fn replace_concepts(&mut self, concepts: Vec<Concept>) -> u64 {
        self.concepts = concepts;
        self.generation += 1;
        self.generation
    }

    /// Applies a card's refinement. Out-of-range indexes and events from an
    /// older list are ignored.
    pub fn update_concept(&mut self, generation: u64, index: usize, concept: Concept) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "dropping stale concept update");
            return false;
        }
        match self.concepts.get_mut(index) {
            Some(slot) => {
                *slot = concept;
                true
            }
            None => {
                tracing::debug!(index, "concept update out of bounds");
                false
            }
        }
    }
}
