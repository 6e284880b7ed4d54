use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use civica_core::{
    CertificateId, ClassId, CourseId, DoctorId, PatientId, StudentId, SubjectId,
};
use civica_health::{
    CardRequestKind, Doctor, HealthAppointment, HealthCardRequest, HealthRecord,
    MedicalCertificate, Patient, Prescription,
};
use civica_school::{Absence, Class, Course, Enrollment, Grade, SchoolAppointment, Student};
use civica_workflow::{Status, TransitionRecord, WorkflowEntity};

// -------------------------
// Request DTOs
// -------------------------

/// Body of every `PATCH .../status` call.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: Status,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub student_subject_id: SubjectId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub school_year: String,
    pub certificate_id: Option<CertificateId>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAbsenceRequest {
    pub student_id: Option<StudentId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub certificate_id: Option<CertificateId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSchoolAppointmentRequest {
    pub staff_subject_id: SubjectId,
    pub scheduled_at: DateTime<Utc>,
    pub purpose: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub subject_id: SubjectId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub parent_subject_id: Option<SubjectId>,
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    pub year: u16,
    pub teacher_subject_id: Option<SubjectId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub name: String,
    pub class_id: ClassId,
    pub teacher_subject_id: Option<SubjectId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGradeRequest {
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub value: u8,
    pub graded_on: NaiveDate,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    /// Omitted for self-registration; clinical staff set it explicitly.
    pub subject_id: Option<SubjectId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub subject_id: SubjectId,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHealthAppointmentRequest {
    pub doctor_id: DoctorId,
    pub scheduled_at: DateTime<Utc>,
    pub purpose: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub patient_id: PatientId,
    pub medication: String,
    pub dosage: String,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHealthCardRequest {
    pub request_kind: CardRequestKind,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCertificateRequest {
    pub patient_id: PatientId,
    pub kind: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub patient_id: PatientId,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub recorded_on: NaiveDate,
}

// -------------------------
// Response mapping
// -------------------------

fn lifecycle_fields(entity: &impl WorkflowEntity) -> Value {
    let lc = entity.lifecycle();
    json!({
        "status": lc.current(),
        "created_at": lc.created_at(),
        "last_transition_at": lc.last_transition_at(),
        "last_transition_by": lc.last_transition_by(),
    })
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Some(b), Value::Object(e)) = (base.as_object_mut(), extra) {
        b.extend(e);
    }
    base
}

pub fn enrollment_to_json(e: &Enrollment) -> Value {
    merge(
        lifecycle_fields(e),
        json!({
            "id": e.id(),
            "owner_subject_id": e.owner(),
            "student_subject_id": e.student_subject_id(),
            "first_name": e.first_name(),
            "last_name": e.last_name(),
            "date_of_birth": e.date_of_birth(),
            "school_year": e.school_year(),
            "certificate_id": e.certificate_id(),
            "notes": e.notes(),
            "verification": e.verification(),
        }),
    )
}

pub fn absence_to_json(a: &Absence) -> Value {
    merge(
        lifecycle_fields(a),
        json!({
            "id": a.id(),
            "owner_subject_id": a.owner(),
            "student_id": a.student_id(),
            "start_date": a.start_date(),
            "end_date": a.end_date(),
            "reason": a.reason(),
            "certificate_id": a.certificate_id(),
            "verification": a.verification(),
        }),
    )
}

pub fn school_appointment_to_json(a: &SchoolAppointment) -> Value {
    merge(
        lifecycle_fields(a),
        json!({
            "id": a.id(),
            "owner_subject_id": a.owner(),
            "staff_subject_id": a.staff_subject_id(),
            "scheduled_at": a.scheduled_at(),
            "purpose": a.purpose(),
            "notes": a.notes(),
        }),
    )
}

pub fn student_to_json(s: &Student) -> Value {
    json!({
        "id": s.id,
        "subject_id": s.subject_id,
        "first_name": s.first_name,
        "last_name": s.last_name,
        "date_of_birth": s.date_of_birth,
        "parent_subject_id": s.parent_subject_id,
        "class_id": s.class_id,
        "enrollment_id": s.enrollment_id,
    })
}

pub fn class_to_json(c: &Class) -> Value {
    json!({
        "id": c.id,
        "name": c.name,
        "year": c.year,
        "teacher_subject_id": c.teacher_subject_id,
    })
}

pub fn course_to_json(c: &Course) -> Value {
    json!({
        "id": c.id,
        "name": c.name,
        "class_id": c.class_id,
        "teacher_subject_id": c.teacher_subject_id,
    })
}

pub fn grade_to_json(g: &Grade) -> Value {
    json!({
        "id": g.id,
        "student_id": g.student_id,
        "course_id": g.course_id,
        "value": g.value,
        "graded_on": g.graded_on,
        "teacher_subject_id": g.teacher_subject_id,
        "comment": g.comment,
    })
}

pub fn patient_to_json(p: &Patient) -> Value {
    json!({
        "id": p.id,
        "subject_id": p.subject_id,
        "first_name": p.first_name,
        "last_name": p.last_name,
        "date_of_birth": p.date_of_birth,
        "doctor_id": p.doctor_id,
        "card_no": p.card_no,
    })
}

pub fn doctor_to_json(d: &Doctor) -> Value {
    json!({
        "id": d.id,
        "subject_id": d.subject_id,
        "first_name": d.first_name,
        "last_name": d.last_name,
        "specialty": d.specialty,
    })
}

pub fn health_appointment_to_json(a: &HealthAppointment) -> Value {
    merge(
        lifecycle_fields(a),
        json!({
            "id": a.id(),
            "owner_subject_id": a.owner(),
            "patient_id": a.patient_id(),
            "doctor_id": a.doctor_id(),
            "scheduled_at": a.scheduled_at(),
            "purpose": a.purpose(),
            "notes": a.notes(),
        }),
    )
}

/// Prescriptions report their *derived* status.
pub fn prescription_to_json(p: &Prescription, now: DateTime<Utc>) -> Value {
    json!({
        "id": p.id(),
        "status": p.effective_status(now),
        "patient_id": p.patient_id(),
        "doctor_id": p.doctor_id(),
        "medication": p.medication(),
        "dosage": p.dosage(),
        "issued_at": p.issued_at(),
        "valid_until": p.valid_until(),
        "dispensed_at": p.dispensed_at(),
    })
}

pub fn card_request_to_json(r: &HealthCardRequest) -> Value {
    merge(
        lifecycle_fields(r),
        json!({
            "id": r.id(),
            "owner_subject_id": r.owner(),
            "patient_id": r.patient_id(),
            "request_kind": r.request_kind(),
            "notes": r.notes(),
        }),
    )
}

pub fn certificate_to_json(c: &MedicalCertificate) -> Value {
    json!({
        "id": c.id,
        "patient_id": c.patient_id,
        "patient_subject_id": c.patient_subject_id,
        "kind": c.kind,
        "valid_from": c.valid_from,
        "valid_to": c.valid_to,
        "issued_by": c.issued_by,
        "issued_at": c.issued_at,
        "notes": c.notes,
    })
}

pub fn record_to_json(r: &HealthRecord) -> Value {
    json!({
        "id": r.id,
        "patient_id": r.patient_id,
        "doctor_id": r.doctor_id,
        "diagnosis": r.diagnosis,
        "treatment": r.treatment,
        "recorded_on": r.recorded_on,
    })
}

pub fn transition_to_json(t: &TransitionRecord) -> Value {
    json!({
        "entity_id": t.entity_id,
        "kind": t.kind,
        "from": t.from,
        "to": t.to,
        "actor": t.actor,
        "actor_role": t.actor_role,
        "occurred_at": t.occurred_at,
    })
}

pub fn items(values: Vec<Value>) -> Value {
    json!({ "items": values })
}
