//! Health-domain application service.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use civica_auth::{IdentityClaim, Role};
use civica_core::{
    CertificateId, DoctorId, DomainError, DomainResult, EntityId, PatientId, RecordId, SubjectId,
};
use civica_health::{
    CardRequestKind, Doctor, HealthAppointment, HealthCardRequest, HealthRecord,
    MedicalCertificate, Patient, Prescription,
};
use civica_workflow::{AccessGate, EntityKind, Status, TransitionRecord};

use crate::certificates::CertificateStore;
use crate::store::{DirectoryStore, WorkflowStore};

use super::{get_scoped, list_scoped, transition_scoped, transitions_scoped};

pub struct HealthService {
    patients: DirectoryStore<PatientId, Patient>,
    doctors: DirectoryStore<DoctorId, Doctor>,
    appointments: WorkflowStore<HealthAppointment>,
    prescriptions: WorkflowStore<Prescription>,
    card_requests: WorkflowStore<HealthCardRequest>,
    certificates: Arc<CertificateStore>,
    records: DirectoryStore<RecordId, HealthRecord>,
}

impl HealthService {
    pub fn new(certificates: Arc<CertificateStore>) -> Self {
        Self {
            patients: DirectoryStore::new(),
            doctors: DirectoryStore::new(),
            appointments: WorkflowStore::new(),
            prescriptions: WorkflowStore::new(),
            card_requests: WorkflowStore::new(),
            certificates,
            records: DirectoryStore::new(),
        }
    }

    // ── Directory ────────────────────────────────────────────────────────

    /// Register a patient profile: patients register themselves, clinical
    /// staff register on behalf of a given subject.
    pub fn register_patient(
        &self,
        claim: &IdentityClaim,
        subject_id: Option<SubjectId>,
        first_name: String,
        last_name: String,
        date_of_birth: Option<NaiveDate>,
    ) -> DomainResult<Patient> {
        let subject_id = match subject_id {
            None => claim.subject_id,
            Some(other) if other == claim.subject_id => other,
            Some(other) => {
                if !AccessGate::is_clinical(claim.role) {
                    return Err(DomainError::Unauthorized);
                }
                other
            }
        };
        if subject_id == claim.subject_id && claim.role != Role::Patient {
            return Err(DomainError::Unauthorized);
        }
        if self
            .patients
            .find(|p| p.subject_id == subject_id)?
            .is_some()
        {
            return Err(DomainError::conflict("patient profile already exists"));
        }
        let patient = Patient::register(subject_id, first_name, last_name, date_of_birth)?;
        self.patients.insert(patient.id, patient.clone())?;
        Ok(patient)
    }

    pub fn register_doctor(
        &self,
        claim: &IdentityClaim,
        subject_id: SubjectId,
        first_name: String,
        last_name: String,
        specialty: Option<String>,
    ) -> DomainResult<Doctor> {
        if !AccessGate::is_health_office(claim.role) {
            return Err(DomainError::Unauthorized);
        }
        if self.doctors.find(|d| d.subject_id == subject_id)?.is_some() {
            return Err(DomainError::conflict("doctor profile already exists"));
        }
        let doctor = Doctor::register(subject_id, first_name, last_name, specialty)?;
        self.doctors.insert(doctor.id, doctor.clone())?;
        Ok(doctor)
    }

    pub fn list_patients(&self, claim: &IdentityClaim) -> DomainResult<Vec<Patient>> {
        if AccessGate::is_clinical(claim.role) {
            return self.patients.list();
        }
        if claim.role == Role::Patient {
            return Ok(self
                .patients
                .find(|p| p.subject_id == claim.subject_id)?
                .into_iter()
                .collect());
        }
        Err(DomainError::Unauthorized)
    }

    pub fn get_patient(&self, claim: &IdentityClaim, id: PatientId) -> DomainResult<Patient> {
        let patient = self.patients.get(&id)?.ok_or(DomainError::NotFound)?;
        if AccessGate::is_clinical(claim.role) || patient.subject_id == claim.subject_id {
            Ok(patient)
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    /// Doctors are listed to any authenticated caller; patients need the
    /// directory to pick an appointment target.
    pub fn list_doctors(&self) -> DomainResult<Vec<Doctor>> {
        self.doctors.list()
    }

    /// The caller's patient profile, created from the verified claim when
    /// missing: a patient filing their first appointment should not have to
    /// register a profile beforehand.
    fn ensure_patient(&self, claim: &IdentityClaim) -> DomainResult<Patient> {
        if let Some(existing) = self.patients.find(|p| p.subject_id == claim.subject_id)? {
            return Ok(existing);
        }
        let patient = Patient::register(
            claim.subject_id,
            claim.first_name.clone(),
            claim.last_name.clone(),
            None,
        )?;
        self.patients.insert(patient.id, patient.clone())?;
        tracing::info!(patient_id = %patient.id, "patient profile auto-created");
        Ok(patient)
    }

    // ── Appointments ─────────────────────────────────────────────────────

    pub fn request_appointment(
        &self,
        claim: &IdentityClaim,
        doctor_id: DoctorId,
        scheduled_at: DateTime<Utc>,
        purpose: String,
        notes: Option<String>,
    ) -> DomainResult<HealthAppointment> {
        if !AccessGate::may_request(claim.role, EntityKind::HealthAppointment) {
            return Err(DomainError::Unauthorized);
        }
        self.doctors
            .get(&doctor_id)?
            .ok_or_else(|| DomainError::validation("unknown doctor"))?;
        let patient = self.ensure_patient(claim)?;
        let appointment = HealthAppointment::request(
            claim.subject_id,
            patient.id,
            doctor_id,
            scheduled_at,
            purpose,
            notes,
            Utc::now(),
        )?;
        self.appointments.insert(appointment)
    }

    pub fn list_appointments(
        &self,
        claim: &IdentityClaim,
    ) -> DomainResult<Vec<HealthAppointment>> {
        list_scoped(&self.appointments, claim, EntityKind::HealthAppointment)
    }

    pub fn get_appointment(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<HealthAppointment> {
        get_scoped(&self.appointments, claim, EntityKind::HealthAppointment, id)
    }

    pub fn appointment_transitions(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<Vec<TransitionRecord>> {
        transitions_scoped(&self.appointments, claim, EntityKind::HealthAppointment, id)
    }

    pub fn transition_appointment(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
        requested: Status,
        notes: Option<String>,
    ) -> DomainResult<HealthAppointment> {
        transition_scoped(
            &self.appointments,
            claim,
            EntityKind::HealthAppointment,
            id,
            requested,
            |a| a.set_notes(notes),
        )
    }

    // ── Prescriptions ────────────────────────────────────────────────────

    pub fn issue_prescription(
        &self,
        claim: &IdentityClaim,
        patient_id: PatientId,
        medication: String,
        dosage: String,
        valid_until: DateTime<Utc>,
    ) -> DomainResult<Prescription> {
        if !AccessGate::may_request(claim.role, EntityKind::Prescription) {
            return Err(DomainError::Unauthorized);
        }
        let doctor = self
            .doctors
            .find(|d| d.subject_id == claim.subject_id)?
            .ok_or_else(|| DomainError::validation("caller has no doctor profile"))?;
        self.patients
            .get(&patient_id)?
            .ok_or_else(|| DomainError::validation("unknown patient"))?;
        let prescription = Prescription::issue(
            claim.subject_id,
            patient_id,
            doctor.id,
            medication,
            dosage,
            valid_until,
            Utc::now(),
        )?;
        self.prescriptions.insert(prescription)
    }

    pub fn list_prescriptions(&self, claim: &IdentityClaim) -> DomainResult<Vec<Prescription>> {
        if AccessGate::may_view_all(claim.role, EntityKind::Prescription) {
            return self.prescriptions.list();
        }
        if AccessGate::may_view(claim.role, EntityKind::Prescription) {
            // Patients are scoped by their patient profile, not by the filing
            // doctor.
            let Some(patient) = self.patients.find(|p| p.subject_id == claim.subject_id)? else {
                return Ok(Vec::new());
            };
            return Ok(self
                .prescriptions
                .list()?
                .into_iter()
                .filter(|p| p.patient_id() == patient.id)
                .collect());
        }
        Err(DomainError::Unauthorized)
    }

    pub fn get_prescription(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<Prescription> {
        if !AccessGate::may_view(claim.role, EntityKind::Prescription) {
            return Err(DomainError::Unauthorized);
        }
        let prescription = self.prescriptions.get(id)?.ok_or(DomainError::NotFound)?;
        if AccessGate::may_view_all(claim.role, EntityKind::Prescription) {
            return Ok(prescription);
        }
        // Self-service scope is the patient the prescription was written for,
        // not the filing doctor.
        match self.patients.find(|p| p.subject_id == claim.subject_id)? {
            Some(patient) if prescription.patient_id() == patient.id => Ok(prescription),
            _ => Err(DomainError::NotFound),
        }
    }

    /// Prescription statuses are derived, never driven: the empty edge table
    /// makes every request here fail.
    pub fn transition_prescription(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
        requested: Status,
    ) -> DomainResult<Prescription> {
        transition_scoped(
            &self.prescriptions,
            claim,
            EntityKind::Prescription,
            id,
            requested,
            |_| {},
        )
    }

    // ── Health-card requests ─────────────────────────────────────────────

    pub fn submit_card_request(
        &self,
        claim: &IdentityClaim,
        request_kind: CardRequestKind,
        notes: Option<String>,
    ) -> DomainResult<HealthCardRequest> {
        if !AccessGate::may_request(claim.role, EntityKind::HealthCardRequest) {
            return Err(DomainError::Unauthorized);
        }
        let patient = self.ensure_patient(claim)?;
        let request = HealthCardRequest::submit(
            claim.subject_id,
            patient.id,
            request_kind,
            notes,
            Utc::now(),
        )?;
        self.card_requests.insert(request)
    }

    pub fn list_card_requests(
        &self,
        claim: &IdentityClaim,
    ) -> DomainResult<Vec<HealthCardRequest>> {
        list_scoped(&self.card_requests, claim, EntityKind::HealthCardRequest)
    }

    pub fn get_card_request(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<HealthCardRequest> {
        get_scoped(&self.card_requests, claim, EntityKind::HealthCardRequest, id)
    }

    pub fn card_request_transitions(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
    ) -> DomainResult<Vec<TransitionRecord>> {
        transitions_scoped(&self.card_requests, claim, EntityKind::HealthCardRequest, id)
    }

    pub fn transition_card_request(
        &self,
        claim: &IdentityClaim,
        id: EntityId,
        requested: Status,
        notes: Option<String>,
    ) -> DomainResult<HealthCardRequest> {
        transition_scoped(
            &self.card_requests,
            claim,
            EntityKind::HealthCardRequest,
            id,
            requested,
            |r| r.set_notes(notes),
        )
    }

    // ── Certificates ─────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn issue_certificate(
        &self,
        claim: &IdentityClaim,
        patient_id: PatientId,
        kind: String,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
        notes: Option<String>,
    ) -> DomainResult<MedicalCertificate> {
        if claim.role != Role::Doctor {
            return Err(DomainError::Unauthorized);
        }
        let doctor = self
            .doctors
            .find(|d| d.subject_id == claim.subject_id)?
            .ok_or_else(|| DomainError::validation("caller has no doctor profile"))?;
        let patient = self
            .patients
            .get(&patient_id)?
            .ok_or_else(|| DomainError::validation("unknown patient"))?;

        let certificate = MedicalCertificate::issue(
            patient.id,
            patient.subject_id,
            kind,
            valid_from,
            valid_to,
            doctor.id,
            notes,
            Utc::now(),
        )?;
        self.certificates.insert(certificate)
    }

    pub fn list_certificates(
        &self,
        claim: &IdentityClaim,
        patient_id: Option<PatientId>,
    ) -> DomainResult<Vec<MedicalCertificate>> {
        if AccessGate::is_clinical(claim.role) {
            return match patient_id {
                Some(pid) => self.certificates.list_for_patient(pid),
                None => self.certificates.list(),
            };
        }
        if claim.role == Role::Patient {
            let Some(patient) = self.patients.find(|p| p.subject_id == claim.subject_id)? else {
                return Ok(Vec::new());
            };
            return self.certificates.list_for_patient(patient.id);
        }
        Err(DomainError::Unauthorized)
    }

    pub fn get_certificate(
        &self,
        claim: &IdentityClaim,
        id: CertificateId,
    ) -> DomainResult<MedicalCertificate> {
        let certificate = self.certificates.get(id)?.ok_or(DomainError::NotFound)?;
        if AccessGate::is_clinical(claim.role)
            || certificate.patient_subject_id == claim.subject_id
        {
            Ok(certificate)
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    // ── Clinical records ─────────────────────────────────────────────────

    pub fn add_record(
        &self,
        claim: &IdentityClaim,
        patient_id: PatientId,
        diagnosis: String,
        treatment: Option<String>,
        recorded_on: NaiveDate,
    ) -> DomainResult<HealthRecord> {
        if claim.role != Role::Doctor {
            return Err(DomainError::Unauthorized);
        }
        let doctor = self
            .doctors
            .find(|d| d.subject_id == claim.subject_id)?
            .ok_or_else(|| DomainError::validation("caller has no doctor profile"))?;
        self.patients
            .get(&patient_id)?
            .ok_or_else(|| DomainError::validation("unknown patient"))?;
        let record = HealthRecord::create(patient_id, doctor.id, diagnosis, treatment, recorded_on)?;
        self.records.insert(record.id, record.clone())?;
        Ok(record)
    }

    pub fn list_records(
        &self,
        claim: &IdentityClaim,
        patient_id: Option<PatientId>,
    ) -> DomainResult<Vec<HealthRecord>> {
        if AccessGate::is_clinical(claim.role) {
            return match patient_id {
                Some(pid) => self.records.filter(|r| r.patient_id == pid),
                None => self.records.list(),
            };
        }
        if claim.role == Role::Patient {
            let Some(patient) = self.patients.find(|p| p.subject_id == claim.subject_id)? else {
                return Ok(Vec::new());
            };
            return self.records.filter(|r| r.patient_id == patient.id);
        }
        Err(DomainError::Unauthorized)
    }
}
