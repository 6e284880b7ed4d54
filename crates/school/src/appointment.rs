//! Appointments with school staff (parent-teacher meetings, office visits).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civica_core::{DomainError, DomainResult, EntityId, SubjectId};
use civica_workflow::{workflow, EntityKind, Lifecycle, WorkflowEntity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolAppointment {
    id: EntityId,
    /// Requesting subject (student or parent).
    owner: SubjectId,
    /// Staff member the appointment is with.
    staff_subject_id: SubjectId,
    scheduled_at: DateTime<Utc>,
    /// Free-form purpose ("parent_meeting", "enrollment_interview", ...).
    purpose: String,
    notes: Option<String>,
    lifecycle: Lifecycle,
}

impl SchoolAppointment {
    pub fn request(
        owner: SubjectId,
        staff_subject_id: SubjectId,
        scheduled_at: DateTime<Utc>,
        purpose: impl Into<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let purpose = purpose.into();
        if purpose.trim().is_empty() {
            return Err(DomainError::validation("purpose cannot be empty"));
        }
        if scheduled_at <= now {
            return Err(DomainError::validation(
                "scheduled_at must be in the future",
            ));
        }

        Ok(Self {
            id: EntityId::new(),
            owner,
            staff_subject_id,
            scheduled_at,
            purpose: purpose.trim().to_string(),
            notes,
            lifecycle: Lifecycle::start(workflow(EntityKind::SchoolAppointment).initial, now),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn staff_subject_id(&self) -> SubjectId {
        self.staff_subject_id
    }

    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        if notes.is_some() {
            self.notes = notes;
        }
    }
}

impl WorkflowEntity for SchoolAppointment {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::SchoolAppointment
    }

    fn owner(&self) -> SubjectId {
        self.owner
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }
}
