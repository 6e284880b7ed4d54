//! The health domain's certificate store, doubling as the resolver the
//! school domain verifies against.

use std::collections::HashMap;
use std::sync::RwLock;

use civica_core::{CertificateId, DomainError, DomainResult, PatientId};
use civica_health::MedicalCertificate;
use civica_workflow::{CertificateResolver, CertificateSnapshot, ResolveError};

#[derive(Debug, Default)]
pub struct CertificateStore {
    inner: RwLock<HashMap<CertificateId, MedicalCertificate>>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, cert: MedicalCertificate) -> DomainResult<MedicalCertificate> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("store lock poisoned"))?;
        inner.insert(cert.id, cert.clone());
        Ok(cert)
    }

    pub fn get(&self, id: CertificateId) -> DomainResult<Option<MedicalCertificate>> {
        Ok(self
            .inner
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))?
            .get(&id)
            .cloned())
    }

    pub fn list(&self) -> DomainResult<Vec<MedicalCertificate>> {
        let mut items: Vec<_> = self
            .inner
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))?
            .values()
            .cloned()
            .collect();
        items.sort_by_key(|c| std::cmp::Reverse(c.issued_at));
        Ok(items)
    }

    pub fn list_for_patient(&self, patient_id: PatientId) -> DomainResult<Vec<MedicalCertificate>> {
        let mut items: Vec<_> = self
            .inner
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))?
            .values()
            .filter(|c| c.patient_id == patient_id)
            .cloned()
            .collect();
        items.sort_by_key(|c| std::cmp::Reverse(c.issued_at));
        Ok(items)
    }
}

impl CertificateResolver for CertificateStore {
    fn resolve(&self, id: CertificateId) -> Result<Option<CertificateSnapshot>, ResolveError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ResolveError::Unavailable("store lock poisoned".to_string()))?;
        Ok(inner.get(&id).map(MedicalCertificate::snapshot))
    }
}
