//! The student directory, with the one at-most-once guarantee in the system.
//!
//! Student identity duplication would corrupt downstream grading and
//! attendance, so provisioning from an enrollment is keyed on the enrollment
//! id under a single lock: the second caller gets the first caller's student
//! back, never a twin.

use std::collections::HashMap;
use std::sync::RwLock;

use civica_core::{DomainError, DomainResult, EntityId, StudentId, SubjectId};
use civica_school::Student;

#[derive(Debug, Default)]
struct DirectoryInner {
    students: HashMap<StudentId, Student>,
    by_enrollment: HashMap<EntityId, StudentId>,
    by_subject: HashMap<SubjectId, StudentId>,
}

/// Result of an idempotent provisioning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created(StudentId),
    /// The enrollment had already produced this student.
    Existing(StudentId),
}

impl ProvisionOutcome {
    pub fn student_id(&self) -> StudentId {
        match self {
            ProvisionOutcome::Created(id) | ProvisionOutcome::Existing(id) => *id,
        }
    }
}

#[derive(Debug, Default)]
pub struct StudentDirectory {
    inner: RwLock<DirectoryInner>,
}

impl StudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision the student for an approved enrollment, at most once per
    /// enrollment id.
    ///
    /// `build` is only invoked when no linkage exists yet; its student must
    /// carry the same `enrollment_id`.
    pub fn provision(
        &self,
        enrollment_id: EntityId,
        build: impl FnOnce() -> DomainResult<Student>,
    ) -> DomainResult<ProvisionOutcome> {
        let mut inner = self.lock_write()?;

        if let Some(existing) = inner.by_enrollment.get(&enrollment_id) {
            return Ok(ProvisionOutcome::Existing(*existing));
        }

        let student = build()?;
        if student.enrollment_id != Some(enrollment_id) {
            return Err(DomainError::validation(
                "provisioned student must reference its enrollment",
            ));
        }
        if inner.by_subject.contains_key(&student.subject_id) {
            return Err(DomainError::duplicate_provisioning(format!(
                "subject {} already has a student record",
                student.subject_id
            )));
        }

        let id = student.id;
        inner.by_enrollment.insert(enrollment_id, id);
        inner.by_subject.insert(student.subject_id, id);
        inner.students.insert(id, student);
        Ok(ProvisionOutcome::Created(id))
    }

    /// Direct registration (school office), guarded by subject uniqueness.
    pub fn register(&self, student: Student) -> DomainResult<Student> {
        let mut inner = self.lock_write()?;
        if inner.by_subject.contains_key(&student.subject_id) {
            return Err(DomainError::duplicate_provisioning(format!(
                "subject {} already has a student record",
                student.subject_id
            )));
        }
        if let Some(enrollment_id) = student.enrollment_id {
            if inner.by_enrollment.contains_key(&enrollment_id) {
                return Err(DomainError::duplicate_provisioning(format!(
                    "enrollment {enrollment_id} already provisioned a student"
                )));
            }
            inner.by_enrollment.insert(enrollment_id, student.id);
        }
        inner.by_subject.insert(student.subject_id, student.id);
        inner.students.insert(student.id, student.clone());
        Ok(student)
    }

    pub fn get(&self, id: StudentId) -> DomainResult<Option<Student>> {
        Ok(self.lock_read()?.students.get(&id).cloned())
    }

    pub fn find_by_enrollment(&self, enrollment_id: EntityId) -> DomainResult<Option<Student>> {
        let inner = self.lock_read()?;
        Ok(inner
            .by_enrollment
            .get(&enrollment_id)
            .and_then(|id| inner.students.get(id))
            .cloned())
    }

    pub fn find_by_subject(&self, subject_id: SubjectId) -> DomainResult<Option<Student>> {
        let inner = self.lock_read()?;
        Ok(inner
            .by_subject
            .get(&subject_id)
            .and_then(|id| inner.students.get(id))
            .cloned())
    }

    pub fn list(&self) -> DomainResult<Vec<Student>> {
        Ok(self.lock_read()?.students.values().cloned().collect())
    }

    fn lock_read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, DirectoryInner>> {
        self.inner
            .read()
            .map_err(|_| DomainError::conflict("directory lock poisoned"))
    }

    fn lock_write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, DirectoryInner>> {
        self.inner
            .write()
            .map_err(|_| DomainError::conflict("directory lock poisoned"))
    }
}
