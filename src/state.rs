//! Wired-up engine state shared by embedding applications.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::modules::audit::service::{AuditRecorder, AuditSink};
use crate::modules::batch::service::BatchService;
use crate::modules::eligibility::service::ClearanceProvider;
use crate::modules::identifiers::service::AdmissionNumberGenerator;
use crate::modules::import::service::ImportService;
use crate::modules::lifecycle::service::LifecycleService;
use crate::modules::students::service::StudentService;
use crate::modules::transfers::service::TransferService;
use crate::store::StudentStore;

/// All engine services wired against one store, audit sink, and
/// clearance provider.
#[derive(Clone)]
pub struct Engine {
    pub students: Arc<StudentService>,
    pub batches: Arc<BatchService>,
    pub imports: Arc<ImportService>,
    pub transfers: Arc<TransferService>,
    pub audit: Arc<AuditRecorder>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn StudentStore>,
        audit_sink: Arc<dyn AuditSink>,
        clearance: Arc<dyn ClearanceProvider>,
        config: EngineConfig,
    ) -> Self {
        let audit = Arc::new(AuditRecorder::new(audit_sink));
        let ids = Arc::new(AdmissionNumberGenerator::new(store.clone(), &config));
        let lifecycle = Arc::new(LifecycleService::new(
            clearance,
            config.eligibility_policy(),
        ));
        let students = Arc::new(StudentService::new(
            store.clone(),
            ids,
            lifecycle.clone(),
            audit.clone(),
        ));
        let batches = Arc::new(BatchService::new(
            store.clone(),
            lifecycle,
            audit.clone(),
        ));
        let imports = Arc::new(ImportService::new(store.clone(), students.clone()));
        let transfers = Arc::new(TransferService::new(store, audit.clone()));
        Self {
            students,
            batches,
            imports,
            transfers,
            audit,
        }
    }
}
