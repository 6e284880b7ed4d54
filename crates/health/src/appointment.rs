//! Medical examination appointments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civica_core::{DoctorId, DomainError, DomainResult, EntityId, PatientId, SubjectId};
use civica_workflow::{workflow, EntityKind, Lifecycle, WorkflowEntity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAppointment {
    id: EntityId,
    /// Requesting patient's subject.
    owner: SubjectId,
    patient_id: PatientId,
    doctor_id: DoctorId,
    scheduled_at: DateTime<Utc>,
    /// Examination type ("checkup", "specialist", ...).
    purpose: String,
    notes: Option<String>,
    lifecycle: Lifecycle,
}

impl HealthAppointment {
    pub fn request(
        owner: SubjectId,
        patient_id: PatientId,
        doctor_id: DoctorId,
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
            patient_id,
            doctor_id,
            scheduled_at,
            purpose: purpose.trim().to_string(),
            notes,
            lifecycle: Lifecycle::start(workflow(EntityKind::HealthAppointment).initial, now),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn doctor_id(&self) -> DoctorId {
        self.doctor_id
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

impl WorkflowEntity for HealthAppointment {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::HealthAppointment
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
    use chrono::Duration;
    use civica_workflow::Status;

    #[test]
    fn requested_appointment_starts_pending() {
        let now = Utc::now();
        let a = HealthAppointment::request(
            SubjectId::new(),
            PatientId::new(),
            DoctorId::new(),
            now + Duration::days(1),
            "checkup",
            None,
            now,
        )
        .unwrap();
        assert_eq!(a.lifecycle().current(), Status::Pending);
    }
}
