//! Clinical record entries: plain records, no workflow.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use civica_core::{DoctorId, DomainError, DomainResult, PatientId, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: RecordId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub recorded_on: NaiveDate,
}

impl HealthRecord {
    pub fn create(
        patient_id: PatientId,
        doctor_id: DoctorId,
        diagnosis: impl Into<String>,
        treatment: Option<String>,
        recorded_on: NaiveDate,
    ) -> DomainResult<Self> {
        let diagnosis = diagnosis.into();
        if diagnosis.trim().is_empty() {
            return Err(DomainError::validation("diagnosis cannot be empty"));
        }
        Ok(Self {
            id: RecordId::new(),
            patient_id,
            doctor_id,
            diagnosis: diagnosis.trim().to_string(),
            treatment,
            recorded_on,
        })
    }
}
