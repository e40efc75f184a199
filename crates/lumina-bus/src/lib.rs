use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use lumina_schema::StudioEvent;
use tokio::sync::{mpsc, RwLock};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    ConceptsGenerated,
    GenerationFailed,
    ConceptUpdated,
    ImageReady,
    CardFailed,
    StaleDiscarded,
    HexCopied,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::ConceptsGenerated,
        Topic::GenerationFailed,
        Topic::ConceptUpdated,
        Topic::ImageReady,
        Topic::CardFailed,
        Topic::StaleDiscarded,
        Topic::HexCopied,
    ];

    pub fn from_event(event: &StudioEvent) -> Self {
        match event {
            StudioEvent::ConceptsGenerated { .. } => Topic::ConceptsGenerated,
            StudioEvent::GenerationFailed { .. } => Topic::GenerationFailed,
            StudioEvent::ConceptUpdated { .. } => Topic::ConceptUpdated,
            StudioEvent::ImageReady { .. } => Topic::ImageReady,
            StudioEvent::CardFailed { .. } => Topic::CardFailed,
            StudioEvent::StaleDiscarded { .. } => Topic::StaleDiscarded,
            StudioEvent::HexCopied { .. } => Topic::HexCopied,
        }
    }
}

type Subscriber = mpsc::Sender<StudioEvent>;
type SubscriberMap = Arc<RwLock<HashMap<Topic, Vec<Subscriber>>>>;

pub struct EventBus {
    subscribers: SubscriberMap,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub async fn subscribe(&self, topic: Topic) -> mpsc::Receiver<StudioEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.write().await;
        subs.entry(topic).or_default().push(tx);
        rx
    }

    /// One receiver fed by every topic.
    pub async fn subscribe_all(&self) -> mpsc::Receiver<StudioEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.write().await;
        for topic in Topic::ALL {
            subs.entry(topic).or_default().push(tx.clone());
        }
        rx
    }

    pub async fn publish(&self, event: StudioEvent) -> Result<()> {
        deliver(&self.subscribers, event).await
    }

    pub fn publisher(&self) -> BusPublisher {
        BusPublisher {
            subscribers: self.subscribers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BusPublisher {
    subscribers: SubscriberMap,
}

impl BusPublisher {
    pub async fn publish(&self, event: StudioEvent) -> Result<()> {
        deliver(&self.subscribers, event).await
    }
}

async fn deliver(subscribers: &SubscriberMap, event: StudioEvent) -> Result<()> {
    let topic = Topic::from_event(&event);
    let subs = subscribers.read().await;
    if let Some(subscribers) = subs.get(&topic) {
        for tx in subscribers {
            if tx.try_send(event.clone()).is_err() {
                tracing::debug!(?topic, "dropping studio event for full or closed subscriber");
            }
        }
    }
    Ok(())
}
