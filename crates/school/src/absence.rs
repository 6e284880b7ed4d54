//! Absence justifications.
//!
//! A student (or their parent) files a date range and reason; teaching staff
//! decide. A medical certificate reference is optional; when present, it is
//! verified against the student's subject before approval.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use civica_core::{CertificateId, DomainError, DomainResult, EntityId, StudentId, SubjectId};
use civica_workflow::{
    workflow, EntityKind, Lifecycle, VerificationRecord, WorkflowEntity,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    id: EntityId,
    /// Filing subject (the student themselves or a parent).
    owner: SubjectId,
    student_id: StudentId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    certificate_id: Option<CertificateId>,
    verification: Option<VerificationRecord>,
    lifecycle: Lifecycle,
}

impl Absence {
    pub fn submit(
        owner: SubjectId,
        student_id: StudentId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: impl Into<String>,
        certificate_id: Option<CertificateId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("reason cannot be empty"));
        }
        if end_date < start_date {
            return Err(DomainError::validation(
                "end_date cannot precede start_date",
            ));
        }

        Ok(Self {
            id: EntityId::new(),
            owner,
            student_id,
            start_date,
            end_date,
            reason: reason.trim().to_string(),
            certificate_id,
            verification: None,
            lifecycle: Lifecycle::start(workflow(EntityKind::Absence).initial, now),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn certificate_id(&self) -> Option<CertificateId> {
        self.certificate_id
    }

    pub fn verification(&self) -> Option<&VerificationRecord> {
        self.verification.as_ref()
    }

    pub fn attach_verification(&mut self, record: VerificationRecord) {
        self.verification = Some(record);
    }
}

impl WorkflowEntity for Absence {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Absence
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
    fn submitted_absence_starts_pending() {
        let now = Utc::now();
        let a = Absence::submit(
            SubjectId::new(),
            StudentId::new(),
            now.date_naive() - Duration::days(3),
            now.date_naive() - Duration::days(1),
            "flu",
            None,
            now,
        )
        .unwrap();
        assert_eq!(a.lifecycle().current(), Status::Pending);
        assert!(a.certificate_id().is_none());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let now = Utc::now();
        let err = Absence::submit(
            SubjectId::new(),
            StudentId::new(),
            now.date_naive(),
            now.date_naive() - Duration::days(2),
            "flu",
            None,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn single_day_absence_is_fine() {
        let now = Utc::now();
        let day = now.date_naive() - Duration::days(1);
        assert!(Absence::submit(
            SubjectId::new(),
            StudentId::new(),
            day,
            day,
            "dentist",
            None,
            now
        )
        .is_ok());
    }
}
