//! Patient and doctor directory records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use civica_core::{DoctorId, DomainError, DomainResult, PatientId, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub subject_id: SubjectId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Assigned general practitioner, if any.
    pub doctor_id: Option<DoctorId>,
    /// Health-card number once a card has been issued.
    pub card_no: Option<String>,
}

impl Patient {
    pub fn register(
        subject_id: SubjectId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::validation("patient name cannot be empty"));
        }
        Ok(Self {
            id: PatientId::new(),
            subject_id,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            date_of_birth,
            doctor_id: None,
            card_no: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub subject_id: SubjectId,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

impl Doctor {
    pub fn register(
        subject_id: SubjectId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        specialty: Option<String>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::validation("doctor name cannot be empty"));
        }
        Ok(Self {
            id: DoctorId::new(),
            subject_id,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            specialty,
        })
    }
}
