//! Service wiring.
//!
//! Both domain services are built over in-memory stores; the certificate
//! store is shared: the health service writes it, the school service reads
//! it through the resolver seam.

use std::sync::Arc;

use civica_infra::{CertificateStore, HealthService, SchoolService};

pub struct AppServices {
    pub school: SchoolService,
    pub health: HealthService,
}

pub fn build_services() -> AppServices {
    let certificates = Arc::new(CertificateStore::new());

    AppServices {
        school: SchoolService::new(certificates.clone()),
        health: HealthService::new(certificates),
    }
}
