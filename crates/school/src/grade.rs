//! Grade entries: plain records, no workflow.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use civica_core::{CourseId, DomainError, DomainResult, GradeId, StudentId, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    /// 1 (fail) to 5 (excellent).
    pub value: u8,
    pub graded_on: NaiveDate,
    pub teacher_subject_id: SubjectId,
    pub comment: Option<String>,
}

impl Grade {
    pub fn record(
        student_id: StudentId,
        course_id: CourseId,
        value: u8,
        graded_on: NaiveDate,
        teacher_subject_id: SubjectId,
        comment: Option<String>,
    ) -> DomainResult<Self> {
        if !(1..=5).contains(&value) {
            return Err(DomainError::validation("grade value must be 1..=5"));
        }
        Ok(Self {
            id: GradeId::new(),
            student_id,
            course_id,
            value,
            graded_on,
            teacher_subject_id,
            comment,
        })
    }
}
