//! Per-kind state machines.
//!
//! One static table per entity kind enumerates every legal edge together with
//! the roles allowed to drive it. Anything not in a table is illegal for that
//! kind, for every caller; there is no other source of transition truth.

use civica_auth::Role;
use civica_core::{DomainError, DomainResult};

use crate::status::{EntityKind, Status};

/// A directed, role-gated edge in a kind's status graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: Status,
    pub to: Status,
    /// Roles permitted to drive this edge; the `admin` override applies on
    /// top of this in the gate.
    pub approvers: &'static [Role],
}

const fn edge(from: Status, to: Status, approvers: &'static [Role]) -> Edge {
    Edge { from, to, approvers }
}

/// A kind's complete workflow definition.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowDef {
    pub kind: EntityKind,
    pub initial: Status,
    pub edges: &'static [Edge],
}

const SCHOOL_STAFF: &[Role] = &[Role::Teacher, Role::SchoolAdmin];
const CLINICAL: &[Role] = &[Role::Doctor, Role::Nurse, Role::HealthAdmin];

static ENROLLMENT: WorkflowDef = WorkflowDef {
    kind: EntityKind::Enrollment,
    initial: Status::Pending,
    edges: &[
        edge(Status::Pending, Status::Approved, &[Role::SchoolAdmin]),
        edge(Status::Pending, Status::Rejected, &[Role::SchoolAdmin]),
    ],
};

static ABSENCE: WorkflowDef = WorkflowDef {
    kind: EntityKind::Absence,
    initial: Status::Pending,
    edges: &[
        edge(Status::Pending, Status::Approved, SCHOOL_STAFF),
        edge(Status::Pending, Status::Rejected, SCHOOL_STAFF),
    ],
};

static SCHOOL_APPOINTMENT: WorkflowDef = WorkflowDef {
    kind: EntityKind::SchoolAppointment,
    initial: Status::Pending,
    edges: &[
        edge(Status::Pending, Status::Approved, SCHOOL_STAFF),
        edge(Status::Pending, Status::Rejected, SCHOOL_STAFF),
        edge(Status::Approved, Status::Completed, SCHOOL_STAFF),
    ],
};

static HEALTH_APPOINTMENT: WorkflowDef = WorkflowDef {
    kind: EntityKind::HealthAppointment,
    initial: Status::Pending,
    edges: &[
        edge(Status::Pending, Status::Confirmed, CLINICAL),
        edge(Status::Pending, Status::Cancelled, CLINICAL),
        edge(Status::Confirmed, Status::Completed, CLINICAL),
    ],
};

static HEALTH_CARD_REQUEST: WorkflowDef = WorkflowDef {
    kind: EntityKind::HealthCardRequest,
    initial: Status::Pending,
    edges: &[
        edge(Status::Pending, Status::Processing, &[Role::HealthAdmin]),
        edge(Status::Pending, Status::Issued, &[Role::HealthAdmin]),
        edge(Status::Pending, Status::Rejected, &[Role::HealthAdmin]),
        edge(Status::Processing, Status::Issued, &[Role::HealthAdmin]),
        edge(Status::Processing, Status::Rejected, &[Role::HealthAdmin]),
    ],
};

// Prescriptions never move by request: their effective status is derived at
// read time (dispensed / past expiry), so the edge table is empty and every
// transition attempt is illegal.
static PRESCRIPTION: WorkflowDef = WorkflowDef {
    kind: EntityKind::Prescription,
    initial: Status::Active,
    edges: &[],
};

/// The workflow definition for a kind.
pub fn workflow(kind: EntityKind) -> &'static WorkflowDef {
    match kind {
        EntityKind::Enrollment => &ENROLLMENT,
        EntityKind::Absence => &ABSENCE,
        EntityKind::SchoolAppointment => &SCHOOL_APPOINTMENT,
        EntityKind::HealthAppointment => &HEALTH_APPOINTMENT,
        EntityKind::HealthCardRequest => &HEALTH_CARD_REQUEST,
        EntityKind::Prescription => &PRESCRIPTION,
    }
}

impl WorkflowDef {
    pub fn edge(&self, from: Status, to: Status) -> Option<&'static Edge> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }

    /// Whether any edge leads out of `status` for this kind.
    pub fn is_terminal(&self, status: Status) -> bool {
        !self.edges.iter().any(|e| e.from == status)
    }

    /// Edge legality only; role checks live in the gate.
    pub fn check(&self, current: Status, requested: Status) -> DomainResult<&'static Edge> {
        self.edge(current, requested).ok_or_else(|| {
            DomainError::invalid_transition(current.as_str(), requested.as_str())
        })
    }
}

/// Full check for a transition request against a loaded entity: edge
/// legality from the current state first (a pair outside the table is an
/// [`DomainError::InvalidTransition`] for *every* role), then the edge's
/// approver set with the admin override.
///
/// Callers must have established that the caller may see the entity at all
/// (via [`crate::gate::AccessGate::may_view`] and owner scoping) before
/// loading it; this function assumes that and may therefore disclose the
/// current state in its errors.
pub fn plan_transition(
    role: Role,
    kind: EntityKind,
    current: Status,
    requested: Status,
) -> DomainResult<&'static Edge> {
    let edge = workflow(kind).check(current, requested)?;
    if role.is_admin() || edge.approvers.contains(&role) {
        Ok(edge)
    } else {
        Err(DomainError::Unauthorized)
    }
}
