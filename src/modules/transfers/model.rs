use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::students::model::TransferKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// A transfer request moving a student between schools.
///
/// The request workflow (create, approve, reject) lives in
/// [`super::service::TransferService`]; completion is a lifecycle
/// transition and only applies to approved requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: Uuid,
    pub student_id: Uuid,
    pub from_school: Uuid,
    pub to_school: Uuid,
    pub to_grade: String,
    pub to_section: Option<String>,
    pub kind: TransferKind,
    pub status: TransferStatus,
    pub reason: Option<String>,
    pub requested_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferRequest {
    pub fn new(
        student_id: Uuid,
        from_school: Uuid,
        to_school: Uuid,
        to_grade: String,
        to_section: Option<String>,
        kind: TransferKind,
        reason: Option<String>,
        requested_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            student_id,
            from_school,
            to_school,
            to_grade,
            to_section,
            kind,
            status: TransferStatus::Pending,
            reason,
            requested_by,
            created_at: now,
            updated_at: now,
        }
    }
}
