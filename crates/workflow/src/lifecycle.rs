//! Lifecycle state carried by every workflow entity, plus the audit record
//! appended on each transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civica_auth::Role;
use civica_core::{EntityId, SubjectId};

use crate::status::{EntityKind, Status};

/// The shared lifecycle shape: current status, a monotonically increasing
/// version for optimistic concurrency, and who/when stamps.
///
/// Entities are created in their kind's initial status and only ever move via
/// [`advance`](Lifecycle::advance), which the stores call under their commit
/// lock together with the log append, never piecemeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    current: Status,
    version: u64,
    created_at: DateTime<Utc>,
    last_transition_at: Option<DateTime<Utc>>,
    last_transition_by: Option<SubjectId>,
}

impl Lifecycle {
    pub fn start(initial: Status, at: DateTime<Utc>) -> Self {
        Self {
            current: initial,
            version: 0,
            created_at: at,
            last_transition_at: None,
            last_transition_by: None,
        }
    }

    pub fn current(&self) -> Status {
        self.current
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_transition_at(&self) -> Option<DateTime<Utc>> {
        self.last_transition_at
    }

    pub fn last_transition_by(&self) -> Option<SubjectId> {
        self.last_transition_by
    }

    /// Apply a transition. Callers must have checked edge legality first;
    /// this only evolves state.
    pub fn advance(&mut self, to: Status, by: SubjectId, at: DateTime<Utc>) {
        self.current = to;
        self.version += 1;
        self.last_transition_at = Some(at);
        self.last_transition_by = Some(by);
    }

    /// Bump the version without a status change (e.g. attaching a failed
    /// verification record for audit).
    pub fn touch(&mut self) {
        self.version += 1;
    }
}

/// Interface every transitionable entity exposes to the engine and stores.
///
/// Concrete kinds live in their domain crates; the engine only ever needs
/// identity, ownership, and the lifecycle.
pub trait WorkflowEntity {
    fn entity_id(&self) -> EntityId;
    fn kind(&self) -> EntityKind;
    /// The subject who filed the entity (scoping for self-service lists).
    fn owner(&self) -> SubjectId;
    fn lifecycle(&self) -> &Lifecycle;
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;
}

/// Append-only audit entry, one per committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    pub from: Status,
    pub to: Status,
    pub actor: SubjectId,
    pub actor_role: Role,
    pub occurred_at: DateTime<Utc>,
}
