//! Electronic prescriptions.
//!
//! Prescriptions never move through the workflow engine by request: the
//! effective status is *derived* at read time from the dispensing stamp and
//! the validity window. Any PATCH attempt hits the kind's empty edge table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civica_core::{DoctorId, DomainError, DomainResult, EntityId, PatientId, SubjectId};
use civica_workflow::{workflow, EntityKind, Lifecycle, Status, WorkflowEntity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    id: EntityId,
    /// Issuing doctor's subject.
    owner: SubjectId,
    patient_id: PatientId,
    doctor_id: DoctorId,
    medication: String,
    dosage: String,
    issued_at: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    /// Set by the dispensing collaborator (pharmacy), outside this system.
    dispensed_at: Option<DateTime<Utc>>,
    lifecycle: Lifecycle,
}

impl Prescription {
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        owner: SubjectId,
        patient_id: PatientId,
        doctor_id: DoctorId,
        medication: impl Into<String>,
        dosage: impl Into<String>,
        valid_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let medication = medication.into();
        let dosage = dosage.into();
        if medication.trim().is_empty() {
            return Err(DomainError::validation("medication cannot be empty"));
        }
        if dosage.trim().is_empty() {
            return Err(DomainError::validation("dosage cannot be empty"));
        }
        if valid_until <= now {
            return Err(DomainError::validation(
                "valid_until must be in the future",
            ));
        }

        Ok(Self {
            id: EntityId::new(),
            owner,
            patient_id,
            doctor_id,
            medication: medication.trim().to_string(),
            dosage: dosage.trim().to_string(),
            issued_at: now,
            valid_until,
            dispensed_at: None,
            lifecycle: Lifecycle::start(workflow(EntityKind::Prescription).initial, now),
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

    pub fn medication(&self) -> &str {
        &self.medication
    }

    pub fn dosage(&self) -> &str {
        &self.dosage
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }

    pub fn dispensed_at(&self) -> Option<DateTime<Utc>> {
        self.dispensed_at
    }

    /// Status as displayed: dispensing wins over expiry, expiry over the
    /// stored `active`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> Status {
        if self.dispensed_at.is_some() {
            Status::Used
        } else if self.valid_until < now {
            Status::Expired
        } else {
            Status::Active
        }
    }
}

impl WorkflowEntity for Prescription {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Prescription
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
