//! Health-card requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civica_core::{DomainError, DomainResult, EntityId, PatientId, SubjectId};
use civica_workflow::{workflow, EntityKind, Lifecycle, WorkflowEntity};

/// Why the card is being requested.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRequestKind {
    New,
    Renewal,
    Replacement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCardRequest {
    id: EntityId,
    owner: SubjectId,
    patient_id: PatientId,
    request_kind: CardRequestKind,
    notes: Option<String>,
    lifecycle: Lifecycle,
}

impl HealthCardRequest {
    pub fn submit(
        owner: SubjectId,
        patient_id: PatientId,
        request_kind: CardRequestKind,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if let Some(n) = &notes {
            if n.len() > 2000 {
                return Err(DomainError::validation("notes too long"));
            }
        }
        Ok(Self {
            id: EntityId::new(),
            owner,
            patient_id,
            request_kind,
            notes,
            lifecycle: Lifecycle::start(workflow(EntityKind::HealthCardRequest).initial, now),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn request_kind(&self) -> CardRequestKind {
        self.request_kind
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

impl WorkflowEntity for HealthCardRequest {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::HealthCardRequest
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

#[cfg(test)]
mod tests {
    use super::*;
    use civica_workflow::Status;

    #[test]
    fn submitted_request_starts_pending() {
        let r = HealthCardRequest::submit(
            SubjectId::new(),
            PatientId::new(),
            CardRequestKind::New,
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(r.lifecycle().current(), Status::Pending);
        assert_eq!(r.request_kind(), CardRequestKind::New);
    }
}
