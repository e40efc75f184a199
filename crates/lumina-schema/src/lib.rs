pub mod concept;
pub mod image;
pub mod styles;

pub use concept::*;
pub use image::*;
pub use styles::*;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one independent gateway-backed operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestState::Idle => "idle",
            RequestState::InFlight => "in flight",
            RequestState::Succeeded => "succeeded",
            RequestState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Card-level operations that talk to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardOperation {
    GenerateImage,
    EditImage,
    Refine,
}

impl fmt::Display for CardOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CardOperation::GenerateImage => "generate image",
            CardOperation::EditImage => "edit image",
            CardOperation::Refine => "refine",
        };
        f.write_str(label)
    }
}

/// Notifications published by the studio after it applies a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StudioEvent {
    ConceptsGenerated {
        trace_id: Uuid,
        generation: u64,
        count: usize,
        at: DateTime<Utc>,
    },
    GenerationFailed {
        trace_id: Uuid,
        error: String,
        at: DateTime<Utc>,
    },
    ConceptUpdated {
        trace_id: Uuid,
        generation: u64,
        index: usize,
        concept: Concept,
    },
    ImageReady {
        trace_id: Uuid,
        generation: u64,
        index: usize,
        edited: bool,
    },
    CardFailed {
        trace_id: Uuid,
        generation: u64,
        index: usize,
        operation: CardOperation,
        error: String,
    },
    /// A completion arrived for a list or revision that no longer exists.
    StaleDiscarded {
        trace_id: Uuid,
        generation: u64,
        index: usize,
        operation: CardOperation,
    },
    HexCopied {
        index: usize,
        hex: String,
    },
}
