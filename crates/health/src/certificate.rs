//! Medical certificates: the health domain's side of the school
//! integration.
//!
//! Certificates are issued by doctors and read (never written) by the school
//! domain through the resolver seam.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use civica_core::{CertificateId, DoctorId, DomainError, DomainResult, PatientId, SubjectId};
use civica_workflow::CertificateSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalCertificate {
    pub id: CertificateId,
    pub patient_id: PatientId,
    /// The patient's subject identity; this is what cross-domain ownership
    /// checks compare against.
    pub patient_subject_id: SubjectId,
    /// Certificate purpose ("enrollment", "sick_leave", "sports", ...).
    pub kind: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub issued_by: DoctorId,
    pub issued_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl MedicalCertificate {
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        patient_id: PatientId,
        patient_subject_id: SubjectId,
        kind: impl Into<String>,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
        issued_by: DoctorId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err(DomainError::validation("certificate kind cannot be empty"));
        }
        if valid_to < valid_from {
            return Err(DomainError::validation(
                "valid_to cannot precede valid_from",
            ));
        }
        Ok(Self {
            id: CertificateId::new(),
            patient_id,
            patient_subject_id,
            kind: kind.trim().to_string(),
            valid_from,
            valid_to,
            issued_by,
            issued_at: now,
            notes,
        })
    }

    /// What the resolver discloses across the domain boundary.
    pub fn snapshot(&self) -> CertificateSnapshot {
        CertificateSnapshot {
            id: self.id,
            patient_subject_id: self.patient_subject_id,
            kind: self.kind.clone(),
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn snapshot_carries_the_subject_not_the_patient_record() {
        let now = Utc::now();
        let subject = SubjectId::new();
        let cert = MedicalCertificate::issue(
            PatientId::new(),
            subject,
            "enrollment",
            now.date_naive(),
            (now + Duration::days(365)).date_naive(),
            DoctorId::new(),
            None,
            now,
        )
        .unwrap();

        let snap = cert.snapshot();
        assert_eq!(snap.patient_subject_id, subject);
        assert_eq!(snap.valid_to, cert.valid_to);
    }

    #[test]
    fn inverted_validity_window_is_rejected() {
        let now = Utc::now();
        let err = MedicalCertificate::issue(
            PatientId::new(),
            SubjectId::new(),
            "enrollment",
            now.date_naive(),
            (now - Duration::days(1)).date_naive(),
            DoctorId::new(),
            None,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
