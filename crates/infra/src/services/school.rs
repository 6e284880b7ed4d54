//! School-domain application service.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use civica_auth::IdentityClaim;
use civica_core::{
    CertificateId, ClassId, CourseId, DomainError, DomainResult, EntityId, ExpectedVersion,
    GradeId, StudentId, SubjectId,
};
use civica_school::{Absence, Class, Course, Enrollment, Grade, SchoolAppointment, Student};
use civica_workflow::{
    plan_transition, AccessGate, CertificateLinker, CertificateResolver, EntityKind, Status,
    TransitionRecord, VerificationRecord, WorkflowEntity,
};

use crate::directory::StudentDirectory;
use crate::store::{DirectoryStore, WorkflowStore};

use super::{get_scoped, list_scoped, transition_scoped, transitions_scoped};

/// New-enrollment request payload.
#[derive(Debug, Clone)]
pub struct NewEnrollment {
    /// The child's subject identity (certificate ownership is checked against
    /// this, not the filing parent).
    pub student_subject_id: SubjectId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub school_year: String,
    pub certificate_id: Option<CertificateId>,
    pub notes: Option<String>,
}

/// Outcome of an enrollment decision; `student_id` is set on approval.
#[derive(Debug, Clone)]
pub struct EnrollmentDecision {
    pub enrollment: Enrollment,
    pub student_id: Option<StudentId>,
}

pub struct SchoolService {
    enrollments: WorkflowStore<Enrollment>,
    absences: WorkflowStore<Absence>,
    appointments: WorkflowStore<SchoolAppointment>,
    students: StudentDirectory,
    classes: DirectoryStore<ClassId, Class>,
    courses: DirectoryStore<CourseId, Course>,
    grades: DirectoryStore<GradeId, Grade>,
    linker: CertificateLinker,
}

impl SchoolService {
    pub fn new(resolver: Arc<dyn CertificateResolver>) -> Self {
        Self {
            enrollments: WorkflowStore::new(),
            absences: WorkflowStore::new(),
            appointments: WorkflowStore::new(),
            students: StudentDirectory::new(),
            classes: DirectoryStore::new(),
            courses: DirectoryStore::new(),
            grades: DirectoryStore::new(),
            linker: CertificateLinker::new(resolver),
        }
    }

    // ── Enrollments ──────────────────────────────────────────────────────

    pub fn submit_enrollment(
        &self,
        claim: &IdentityClaim,
        req: NewEnrollment,
    ) -> DomainResult<Enrollment> {
        if !AccessGate::may_request(claim.role, EntityKind::Enrollment) {
            return Err(DomainError::Unauthorized);
        }
        let enrollment = Enrollment::submit(
            claim.subject_id,
            req.student_subject_id,
            req.first_name,
            req.last_name,
            req.date_of_birth,
            req.school_year,
            req.certificate_id,
            req.notes,
            Utc::now(),
        )?;
        self.enrollments.insert(enrollment)
    }

    pub fn list_enrollments(&self, claim: &IdentityClaim) -> DomainResult<Vec<Enrollment>> {
        list_scoped(&self.enrollments, claim, EntityKind::Enrollment)
    }

    pub fn get_enrollment(&self, claim: &IdentityClaim, id: EntityId) -> DomainResult<Enrollment> {
        get_scoped(&self.enrollments, claim, EntityKind::Enrollment, id)
    }

    pub fn enrollment_transitions(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<Vec<TransitionRecord>> {
        transitions_scoped(&self.enrollments, claim, EntityKind::Enrollment, id)
    }

    /// Decide an enrollment.
    ///
    /// Approval resolves and snapshots the child's medical certificate before
    /// the commit; a negative verdict is attached for audit and fails the
    /// call with the entity left `pending`. Re-approving an approved
    /// enrollment is a no-op success that reports the student already
    /// provisioned for it.
    pub fn transition_enrollment(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
        requested: Status,
        notes: Option<String>,
    ) -> DomainResult<EnrollmentDecision> {
        let kind = EntityKind::Enrollment;
        if !AccessGate::may_view(claim.role, kind) {
            return Err(DomainError::Unauthorized);
        }
        let (enrollment, version) = self.enrollments.snapshot(id)?.ok_or(DomainError::NotFound)?;
        if !AccessGate::may_view_all(claim.role, kind) && enrollment.owner() != claim.subject_id {
            return Err(DomainError::NotFound);
        }

        let current = enrollment.lifecycle().current();

        if current == Status::Approved && requested == Status::Approved {
            if !AccessGate::may_transition(claim.role, kind, requested) {
                return Err(DomainError::Unauthorized);
            }
            // No state change, no log entry; the provision call hands back the
            // existing student (or repairs a missed one, still at most once).
            let outcome = self.students.provision(id, || {
                Student::register(
                    enrollment.student_subject_id(),
                    enrollment.first_name(),
                    enrollment.last_name(),
                    enrollment.date_of_birth(),
                    Some(enrollment.owner()),
                    None,
                    Some(id),
                )
            })?;
            return Ok(EnrollmentDecision {
                enrollment,
                student_id: Some(outcome.student_id()),
            });
        }

        plan_transition(claim.role, kind, current, requested)?;

        let now = Utc::now();
        let mut verification: Option<VerificationRecord> = None;

        if requested == Status::Approved {
            let certificate_id = enrollment.certificate_id().ok_or_else(|| {
                DomainError::validation("enrollment has no certificate reference")
            })?;

            // A subject may only ever back one student record; catch this
            // before the state changes.
            if let Some(existing) = self
                .students
                .find_by_subject(enrollment.student_subject_id())?
            {
                if existing.enrollment_id != Some(id) {
                    return Err(DomainError::duplicate_provisioning(format!(
                        "subject {} already has a student record",
                        enrollment.student_subject_id()
                    )));
                }
            }

            // Resolve with no lock held; the commit below re-checks freshness.
            let record =
                self.linker
                    .verify(certificate_id, enrollment.student_subject_id(), now)?;

            if let Some(reason) = record.outcome.failure() {
                if let Err(e) = self.enrollments.amend(id, ExpectedVersion::Exact(version), |e| {
                    e.attach_verification(record.clone())
                }) {
                    tracing::debug!(error = %e, "could not attach negative verification");
                }
                return Err(DomainError::VerificationFailed(reason));
            }
            verification = Some(record);
        }

        let committed = self.enrollments.commit_transition(
            id,
            ExpectedVersion::Exact(version),
            requested,
            claim.subject_id,
            claim.role,
            now,
            |e| {
                if let Some(record) = verification {
                    e.attach_verification(record);
                }
                e.set_notes(notes);
            },
        )?;

        let student_id = if requested == Status::Approved {
            let outcome = self.students.provision(id, || {
                Student::register(
                    committed.student_subject_id(),
                    committed.first_name(),
                    committed.last_name(),
                    committed.date_of_birth(),
                    Some(committed.owner()),
                    None,
                    Some(id),
                )
            })?;
            Some(outcome.student_id())
        } else {
            None
        };

        Ok(EnrollmentDecision {
            enrollment: committed,
            student_id,
        })
    }

    // ── Absences ─────────────────────────────────────────────────────────

    pub fn submit_absence(
        &self,
        claim: &IdentityClaim,
        student_id: Option<StudentId>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
        certificate_id: Option<CertificateId>,
    ) -> DomainResult<Absence> {
        if !AccessGate::may_request(claim.role, EntityKind::Absence) {
            return Err(DomainError::Unauthorized);
        }
        let student_id = match student_id {
            Some(id) => id,
            None => self
                .resolve_own_student(claim)?
                .ok_or_else(|| DomainError::validation("student_id is required"))?,
        };
        let absence = Absence::submit(
            claim.subject_id,
            student_id,
            start_date,
            end_date,
            reason,
            certificate_id,
            Utc::now(),
        )?;
        self.absences.insert(absence)
    }

    pub fn list_absences(&self, claim: &IdentityClaim) -> DomainResult<Vec<Absence>> {
        list_scoped(&self.absences, claim, EntityKind::Absence)
    }

    pub fn get_absence(&self, claim: &IdentityClaim, id: EntityId) -> DomainResult<Absence> {
        get_scoped(&self.absences, claim, EntityKind::Absence, id)
    }

    pub fn absence_transitions(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<Vec<TransitionRecord>> {
        transitions_scoped(&self.absences, claim, EntityKind::Absence, id)
    }

    /// Decide an absence justification.
    ///
    /// Verification runs only when a certificate was referenced; an absence
    /// without one is decided on the reviewer's judgment alone.
    pub fn transition_absence(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
        requested: Status,
    ) -> DomainResult<Absence> {
        let kind = EntityKind::Absence;
        if !AccessGate::may_view(claim.role, kind) {
            return Err(DomainError::Unauthorized);
        }
        let (absence, version) = self.absences.snapshot(id)?.ok_or(DomainError::NotFound)?;
        if !AccessGate::may_view_all(claim.role, kind) && absence.owner() != claim.subject_id {
            return Err(DomainError::NotFound);
        }

        plan_transition(claim.role, kind, absence.lifecycle().current(), requested)?;

        let now = Utc::now();
        let mut verification: Option<VerificationRecord> = None;

        if requested == Status::Approved {
            if let Some(certificate_id) = absence.certificate_id() {
                let student = self.students.get(absence.student_id())?.ok_or_else(|| {
                    DomainError::validation("absence references an unknown student")
                })?;

                let record = self.linker.verify(certificate_id, student.subject_id, now)?;
                if let Some(reason) = record.outcome.failure() {
                    if let Err(e) =
                        self.absences.amend(id, ExpectedVersion::Exact(version), |a| {
                            a.attach_verification(record.clone())
                        })
                    {
                        tracing::debug!(error = %e, "could not attach negative verification");
                    }
                    return Err(DomainError::VerificationFailed(reason));
                }
                verification = Some(record);
            }
        }

        self.absences.commit_transition(
            id,
            ExpectedVersion::Exact(version),
            requested,
            claim.subject_id,
            claim.role,
            now,
            |a| {
                if let Some(record) = verification {
                    a.attach_verification(record);
                }
            },
        )
    }

    // ── Appointments ─────────────────────────────────────────────────────

    pub fn request_appointment(
        &self,
        claim: &IdentityClaim,
        staff_subject_id: SubjectId,
        scheduled_at: DateTime<Utc>,
        purpose: String,
        notes: Option<String>,
    ) -> DomainResult<SchoolAppointment> {
        if !AccessGate::may_request(claim.role, EntityKind::SchoolAppointment) {
            return Err(DomainError::Unauthorized);
        }
        let appointment = SchoolAppointment::request(
            claim.subject_id,
            staff_subject_id,
            scheduled_at,
            purpose,
            notes,
            Utc::now(),
        )?;
        self.appointments.insert(appointment)
    }

    pub fn list_appointments(&self, claim: &IdentityClaim) -> DomainResult<Vec<SchoolAppointment>> {
        list_scoped(&self.appointments, claim, EntityKind::SchoolAppointment)
    }

    pub fn get_appointment(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<SchoolAppointment> {
        get_scoped(&self.appointments, claim, EntityKind::SchoolAppointment, id)
    }

    pub fn appointment_transitions(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<Vec<TransitionRecord>> {
        transitions_scoped(&self.appointments, claim, EntityKind::SchoolAppointment, id)
    }

    pub fn transition_appointment(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
        requested: Status,
        notes: Option<String>,
    ) -> DomainResult<SchoolAppointment> {
        transition_scoped(
            &self.appointments,
            claim,
            EntityKind::SchoolAppointment,
            id,
            requested,
            |a| a.set_notes(notes),
        )
    }

    // ── Students ─────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn register_student(
        &self,
        claim: &IdentityClaim,
        subject_id: SubjectId,
        first_name: String,
        last_name: String,
        date_of_birth: NaiveDate,
        parent_subject_id: Option<SubjectId>,
        class_id: Option<ClassId>,
    ) -> DomainResult<Student> {
        if !AccessGate::is_school_office(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        if let Some(class_id) = class_id {
            self.classes.get(&class_id)?.ok_or_else(|| {
                DomainError::validation(format!("class {class_id} does not exist"))
            })?;
        }
        let student = Student::register(
            subject_id,
            first_name,
            last_name,
            date_of_birth,
            parent_subject_id,
            class_id,
            None,
        )?;
        self.students.register(student)
    }

    pub fn list_students(&self, claim: &IdentityClaim) -> DomainResult<Vec<Student>> {
        if AccessGate::is_school_staff(claim.role) {
            return self.students.list();
        }
        match claim.role {
            civica_auth::Role::Student => Ok(self
                .students
                .find_by_subject(claim.subject_id)?
                .into_iter()
                .collect()),
            civica_auth::Role::Parent => Ok(self
                .students
                .list()?
                .into_iter()
                .filter(|s| s.parent_subject_id == Some(claim.subject_id))
                .collect()),
            _ => Err(DomainError::Unauthorized),
        }
    }

    pub fn get_student(&self, claim: &IdentityClaim, id: StudentId) -> DomainResult<Student> {
        let student = self.students.get(id)?.ok_or(DomainError::NotFound)?;
        if AccessGate::is_school_staff(claim.role)
            || student.subject_id == claim.subject_id
            || student.parent_subject_id == Some(claim.subject_id)
        {
            Ok(student)
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    // ── Classes, courses, grades ─────────────────────────────────────────

    pub fn create_class(
        &self,
        claim: &IdentityClaim,
        name: String,
        year: u16,
        teacher_subject_id: Option<SubjectId>,
    ) -> DomainResult<Class> {
        if !AccessGate::is_school_office(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        let class = Class::create(name, year, teacher_subject_id)?;
        self.classes.insert(class.id, class.clone())?;
        Ok(class)
    }

    pub fn list_classes(&self, claim: &IdentityClaim) -> DomainResult<Vec<Class>> {
        if !AccessGate::is_school_domain(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        self.classes.list()
    }

    pub fn create_course(
        &self,
        claim: &IdentityClaim,
        name: String,
        class_id: ClassId,
        teacher_subject_id: Option<SubjectId>,
    ) -> DomainResult<Course> {
        if !AccessGate::is_school_office(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        self.classes
            .get(&class_id)?
            .ok_or_else(|| DomainError::validation(format!("class {class_id} does not exist")))?;
        let course = Course::create(name, class_id, teacher_subject_id)?;
        self.courses.insert(course.id, course.clone())?;
        Ok(course)
    }

    pub fn list_courses(&self, claim: &IdentityClaim) -> DomainResult<Vec<Course>> {
        if !AccessGate::is_school_domain(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        self.courses.list()
    }

    pub fn record_grade(
        &self,
        claim: &IdentityClaim,
        student_id: StudentId,
        course_id: CourseId,
        value: u8,
        graded_on: NaiveDate,
        comment: Option<String>,
    ) -> DomainResult<Grade> {
        if !AccessGate::is_school_staff(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        self.students
            .get(student_id)?
            .ok_or_else(|| DomainError::validation("unknown student"))?;
        let grade = Grade::record(
            student_id,
            course_id,
            value,
            graded_on,
            claim.subject_id,
            comment,
        )?;
        self.grades.insert(grade.id, grade.clone())?;
        Ok(grade)
    }

    pub fn list_grades(
        &self,
        claim: &IdentityClaim,
        student_id: Option<StudentId>,
    ) -> DomainResult<Vec<Grade>> {
        if AccessGate::is_school_staff(claim.role) {
            return match student_id {
                Some(sid) => self.grades.filter(|g| g.student_id == sid),
                None => self.grades.list(),
            };
        }
        // Self-service: resolve which students the caller may see grades for.
        let visible: Vec<StudentId> = self
            .list_students(claim)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        self.grades.filter(|g| {
            visible.contains(&g.student_id)
                && student_id.map(|sid| g.student_id == sid).unwrap_or(true)
        })
    }

    pub fn delete_grade(&self, claim: &IdentityClaim, id: GradeId) -> DomainResult<()> {
        if !AccessGate::is_school_staff(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        self.grades
            .remove(&id)?
            .map(|_| ())
            .ok_or(DomainError::NotFound)
    }

    /// The student record linked to an approved enrollment, if any.
    pub fn student_for_enrollment(&self, id: EntityId) -> DomainResult<Option<Student>> {
        self.students.find_by_enrollment(id)
    }

    fn resolve_own_student(&self, claim: &IdentityClaim) -> DomainResult<Option<StudentId>> {
        match claim.role {
            civica_auth::Role::Student => Ok(self
                .students
                .find_by_subject(claim.subject_id)?
                .map(|s| s.id)),
            civica_auth::Role::Parent => Ok(self
                .students
                .list()?
                .into_iter()
                .find(|s| s.parent_subject_id == Some(claim.subject_id))
                .map(|s| s.id)),
            _ => Ok(None),
        }
    }
}
