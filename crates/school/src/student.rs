//! The student directory record.
//!
//! Students are provisioned exactly once per approved enrollment; the
//! `enrollment_id` link is what the idempotency guard keys on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use civica_core::{ClassId, DomainError, DomainResult, EntityId, StudentId, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    /// The student's own subject identity.
    pub subject_id: SubjectId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub parent_subject_id: Option<SubjectId>,
    pub class_id: Option<ClassId>,
    /// The enrollment that produced this record, when provisioned through the
    /// approval flow.
    pub enrollment_id: Option<EntityId>,
}

impl Student {
    pub fn register(
        subject_id: SubjectId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        parent_subject_id: Option<SubjectId>,
        class_id: Option<ClassId>,
        enrollment_id: Option<EntityId>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::validation("student name cannot be empty"));
        }
        Ok(Self {
            id: StudentId::new(),
            subject_id,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            date_of_birth,
            parent_subject_id,
            class_id,
            enrollment_id,
        })
    }
}
