//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{CastEvent, SpellEvent, TaskEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Cast attempts (successes and refusals)
    Cast,
    /// Active instance lifecycle
    Spell,
    /// Scheduled task failures
    Task,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Cast(CastEvent),
    Spell(SpellEvent),
    Task(TaskEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Cast(_) => Topic::Cast,
            Event::Spell(_) => Topic::Spell,
            Event::Task(_) => Topic::Task,
        }
    }
}

struct Channels {
    cast: broadcast::Sender<Event>,
    spell: broadcast::Sender<Event>,
    task: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// The topic set is fixed at construction, so publishing never takes a lock
/// and is safe from any domain or from synchronous code.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                cast: broadcast::channel(capacity).0,
                spell: broadcast::channel(capacity).0,
                task: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Cast => &self.channels.cast,
            Topic::Spell => &self.channels.spell,
            Topic::Task => &self.channels.task,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
