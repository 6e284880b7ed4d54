//! Application services.
//!
//! Every operation takes the caller's [`IdentityClaim`] explicitly (there is
//! no ambient session) and follows the same shape: gate check before the
//! entity is touched, owner scoping for self-service roles, pure transition
//! planning, slow cross-domain work outside any lock, then a version-checked
//! atomic commit.

use chrono::Utc;

use civica_auth::IdentityClaim;
use civica_core::{DomainError, DomainResult, EntityId, ExpectedVersion};
use civica_workflow::{
    plan_transition, AccessGate, EntityKind, Status, TransitionRecord, WorkflowEntity,
};

use crate::store::WorkflowStore;

pub mod health;
pub mod school;

pub use health::HealthService;
pub use school::SchoolService;

/// List a kind with role-appropriate scoping: reviewers see everything,
/// self-service roles see their own, everyone else is denied.
pub(crate) fn list_scoped<T: WorkflowEntity + Clone>(
    store: &WorkflowStore<T>,
    claim: &IdentityClaim,
    kind: EntityKind,
) -> DomainResult<Vec<T>> {
    if AccessGate::may_view_all(claim.role, kind) {
        store.list()
    } else if AccessGate::may_view(claim.role, kind) {
        store.list_owned_by(claim.subject_id)
    } else {
        Err(DomainError::Unauthorized)
    }
}

/// Fetch one entity with the same scoping. A record outside the caller's
/// scope reads as absent, so existence never leaks downward.
pub(crate) fn get_scoped<T: WorkflowEntity + Clone>(
    store: &WorkflowStore<T>,
    claim: &IdentityClaim,
    kind: EntityKind,
    id: EntityId,
) -> DomainResult<T> {
    if !AccessGate::may_view(claim.role, kind) {
        return Err(DomainError::Unauthorized);
    }
    let entity = store.get(id)?.ok_or(DomainError::NotFound)?;
    if !AccessGate::may_view_all(claim.role, kind) && entity.owner() != claim.subject_id {
        return Err(DomainError::NotFound);
    }
    Ok(entity)
}

/// The entity's audit trail, gated like a detail read.
pub(crate) fn transitions_scoped<T: WorkflowEntity + Clone>(
    store: &WorkflowStore<T>,
    claim: &IdentityClaim,
    kind: EntityKind,
    id: EntityId,
) -> DomainResult<Vec<TransitionRecord>> {
    get_scoped(store, claim, kind, id)?;
    store.transitions(id)
}

/// Generic transition path for kinds without a verification precondition.
pub(crate) fn transition_scoped<T: WorkflowEntity + Clone>(
    store: &WorkflowStore<T>,
    claim: &IdentityClaim,
    kind: EntityKind,
    id: EntityId,
    requested: Status,
    mutate: impl FnOnce(&mut T),
) -> DomainResult<T> {
    if !AccessGate::may_view(claim.role, kind) {
        return Err(DomainError::Unauthorized);
    }
    let (entity, version) = store.snapshot(id)?.ok_or(DomainError::NotFound)?;
    if !AccessGate::may_view_all(claim.role, kind) && entity.owner() != claim.subject_id {
        return Err(DomainError::NotFound);
    }

    plan_transition(claim.role, kind, entity.lifecycle().current(), requested)?;

    store.commit_transition(
        id,
        ExpectedVersion::Exact(version),
        requested,
        claim.subject_id,
        claim.role,
        Utc::now(),
        mutate,
    )
}
