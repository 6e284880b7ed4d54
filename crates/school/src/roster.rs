//! Classes and courses: school reference data.

use serde::{Deserialize, Serialize};

use civica_core::{ClassId, CourseId, DomainError, DomainResult, SubjectId};

/// A class (homeroom) for a given year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub year: u16,
    pub teacher_subject_id: Option<SubjectId>,
}

impl Class {
    pub fn create(
        name: impl Into<String>,
        year: u16,
        teacher_subject_id: Option<SubjectId>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("class name cannot be empty"));
        }
        if !(1..=8).contains(&year) {
            return Err(DomainError::validation("year must be between 1 and 8"));
        }
        Ok(Self {
            id: ClassId::new(),
            name: name.trim().to_string(),
            year,
            teacher_subject_id,
        })
    }
}

/// A course taught to a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub class_id: ClassId,
    pub teacher_subject_id: Option<SubjectId>,
}

impl Course {
    pub fn create(
        name: impl Into<String>,
        class_id: ClassId,
        teacher_subject_id: Option<SubjectId>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("course name cannot be empty"));
        }
        Ok(Self {
            id: CourseId::new(),
            name: name.trim().to_string(),
            class_id,
            teacher_subject_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_year_is_bounded() {
        assert!(Class::create("1a", 1, None).is_ok());
        assert!(Class::create("9z", 9, None).is_err());
        assert!(Class::create("0x", 0, None).is_err());
    }
}
