//! Enrollment requests: a parent files for a child, the school office
//! decides, and approval is gated on health-domain evidence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use civica_core::{CertificateId, DomainError, DomainResult, EntityId, SubjectId};
use civica_workflow::{
    workflow, EntityKind, Lifecycle, VerificationRecord, WorkflowEntity,
};

/// A request to enroll a child for a school year.
///
/// # Invariants
/// - Created `pending`; status only moves along the enrollment workflow.
/// - `student_subject_id` names the child; certificate ownership is checked
///   against the child, not the filing parent.
/// - An attached [`VerificationRecord`] is never replaced once a transition
///   has committed on the strength of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    id: EntityId,
    /// Filing parent/guardian.
    owner: SubjectId,
    /// The child being enrolled.
    student_subject_id: SubjectId,
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    /// e.g. "2026/2027".
    school_year: String,
    certificate_id: Option<CertificateId>,
    notes: Option<String>,
    verification: Option<VerificationRecord>,
    lifecycle: Lifecycle,
}

impl Enrollment {
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        owner: SubjectId,
        student_subject_id: SubjectId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        school_year: impl Into<String>,
        certificate_id: Option<CertificateId>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let school_year = school_year.into();

        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::validation("student name cannot be empty"));
        }
        if school_year.trim().is_empty() {
            return Err(DomainError::validation("school_year cannot be empty"));
        }
        if date_of_birth >= now.date_naive() {
            return Err(DomainError::validation("date_of_birth must be in the past"));
        }

        Ok(Self {
            id: EntityId::new(),
            owner,
            student_subject_id,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            date_of_birth,
            school_year,
            certificate_id,
            notes,
            verification: None,
            lifecycle: Lifecycle::start(workflow(EntityKind::Enrollment).initial, now),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn student_subject_id(&self) -> SubjectId {
        self.student_subject_id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    pub fn school_year(&self) -> &str {
        &self.school_year
    }

    pub fn certificate_id(&self) -> Option<CertificateId> {
        self.certificate_id
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn verification(&self) -> Option<&VerificationRecord> {
        self.verification.as_ref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        if notes.is_some() {
            self.notes = notes;
        }
    }

    /// Attach the verification verdict (positive or negative) for audit.
    pub fn attach_verification(&mut self, record: VerificationRecord) {
        self.verification = Some(record);
    }
}

impl WorkflowEntity for Enrollment {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Enrollment
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
