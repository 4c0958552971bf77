use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actor identity resolved by the caller's auth layer. Opaque to the
/// engine; it is only copied into audit entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Transition,
    Delete,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Create => write!(f, "create"),
            AuditAction::Update => write!(f, "update"),
            AuditAction::Transition => write!(f, "transition"),
            AuditAction::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// An immutable audit record. Created exactly once per mutating attempt
/// (rejections included); never updated or deleted by the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub changed_fields: Vec<String>,
    pub severity: AuditSeverity,
    pub is_confidential: bool,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

/// Input handed to [`super::AuditRecorder::record`]. Severity,
/// confidentiality, and the field diff are derived by the recorder.
#[derive(Debug, Clone)]
pub struct AuditInput {
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub actor: ActorContext,
    pub metadata: Option<serde_json::Value>,
}

impl AuditInput {
    /// Entry for a rejected mutating attempt; kept for compliance
    /// visibility even though nothing was written.
    pub fn rejection(
        entity_id: Uuid,
        action: AuditAction,
        reason: &str,
        actor: &ActorContext,
    ) -> Self {
        Self {
            entity_id,
            action,
            old_values: None,
            new_values: None,
            actor: actor.clone(),
            metadata: Some(serde_json::json!({
                "outcome": "rejected",
                "reason": reason,
            })),
        }
    }
}
