//! Event payloads grouped by topic.

use std::fmt;

use serde::{Deserialize, Serialize};
use spell_core::{CastOutcome, EntityId};

use crate::scheduler::TaskId;
use crate::spells::StopReason;

/// Identifier of one active spell instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Results of cast attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CastEvent {
    Succeeded {
        caster: EntityId,
        spell: String,
        magic_spent: Option<u32>,
    },
    Failed {
        caster: EntityId,
        spell: String,
        outcome: CastOutcome,
    },
}

/// Lifecycle of active spell instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpellEvent {
    Started {
        instance: InstanceId,
        caster: EntityId,
        spell: String,
    },
    Stopped {
        instance: InstanceId,
        caster: EntityId,
        spell: String,
        reason: StopReason,
        alive_ms: u64,
    },
}

/// Scheduler-level failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskEvent {
    Failed {
        task: Option<TaskId>,
        label: Option<String>,
        error: String,
    },
}
