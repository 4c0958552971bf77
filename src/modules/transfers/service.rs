//! Transfer-request workflow: request, approve, reject.
//!
//! Completion is deliberately not here; it is a lifecycle transition
//! executed by the student and batch services once a request is Approved.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::audit::model::{ActorContext, AuditAction, AuditInput};
use crate::modules::audit::service::AuditRecorder;
use crate::modules::eligibility::service::evaluate_transfer;
use crate::modules::students::model::TransferKind;
use crate::store::StudentStore;
use crate::utils::errors::EngineError;

use super::model::{TransferRequest, TransferStatus};

pub struct TransferService {
    store: Arc<dyn StudentStore>,
    audit: Arc<AuditRecorder>,
}

impl TransferService {
    pub fn new(store: Arc<dyn StudentStore>, audit: Arc<AuditRecorder>) -> Self {
        Self { store, audit }
    }

    /// Open a transfer request for an active student.
    #[instrument(skip(self, actor))]
    pub async fn request_transfer(
        &self,
        school_id: Uuid,
        student_id: Uuid,
        to_school: Uuid,
        to_grade: String,
        to_section: Option<String>,
        kind: TransferKind,
        reason: Option<String>,
        actor: &ActorContext,
    ) -> Result<TransferRequest, EngineError> {
        let student = self
            .store
            .find_by_id(school_id, student_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Student".to_string()))?;
        evaluate_transfer(&student).into_result()?;

        let request = TransferRequest::new(
            student_id,
            school_id,
            to_school,
            to_grade,
            to_section,
            kind,
            reason,
            actor.actor_id,
        );
        self.store.save_transfer_request(request.clone()).await?;
        self.audit
            .record(AuditInput {
                entity_id: student_id,
                action: AuditAction::Create,
                old_values: None,
                new_values: serde_json::to_value(&request).ok(),
                actor: actor.clone(),
                metadata: Some(serde_json::json!({"workflow": "transfer_request"})),
            })
            .await;
        Ok(request)
    }

    #[instrument(skip(self, actor))]
    pub async fn approve(
        &self,
        request_id: Uuid,
        actor: &ActorContext,
    ) -> Result<TransferRequest, EngineError> {
        self.resolve(request_id, TransferStatus::Approved, actor)
            .await
    }

    #[instrument(skip(self, actor))]
    pub async fn reject(
        &self,
        request_id: Uuid,
        actor: &ActorContext,
    ) -> Result<TransferRequest, EngineError> {
        self.resolve(request_id, TransferStatus::Rejected, actor)
            .await
    }

    async fn resolve(
        &self,
        request_id: Uuid,
        status: TransferStatus,
        actor: &ActorContext,
    ) -> Result<TransferRequest, EngineError> {
        let mut request = self
            .store
            .get_transfer_request(request_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Transfer request".to_string()))?;
        if request.status != TransferStatus::Pending {
            return Err(EngineError::InvalidTransition(
                "Only pending transfer requests can be resolved".to_string(),
            ));
        }
        let before = serde_json::to_value(&request).ok();
        request.status = status;
        request.updated_at = Utc::now();
        self.store.save_transfer_request(request.clone()).await?;
        self.audit
            .record(AuditInput {
                entity_id: request.student_id,
                action: AuditAction::Update,
                old_values: before,
                new_values: serde_json::to_value(&request).ok(),
                actor: actor.clone(),
                metadata: Some(serde_json::json!({"workflow": "transfer_request"})),
            })
            .await;
        Ok(request)
    }
}
