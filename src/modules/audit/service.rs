//! Audit capture for every mutating operation.
//!
//! The recorder is fire-and-forget: sink failures are logged and
//! swallowed so an audit outage can never abort the business operation
//! that triggered it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::utils::errors::EngineError;

use super::model::{AuditAction, AuditEntry, AuditInput, AuditSeverity};

/// Fields whose presence in a diff marks the entry confidential.
const MEDICAL_FIELDS: &[&str] = &["medical_notes"];
const DISCIPLINARY_FIELDS: &[&str] = &["disciplinary_status", "on_probation"];
const CONTACT_FIELDS: &[&str] = &["email", "guardian_contact"];

/// Routine profile fields; updates touching these are at least Medium.
const PROFILE_FIELDS: &[&str] = &["first_name", "last_name", "date_of_birth", "stream_section"];

/// Append-only audit persistence.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<(), EngineError>;
}

/// In-memory sink; preserves append order for deterministic assertions.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
    fail_writes: AtomicBool,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail, for exercising the swallow path.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn entries_for(&self, entity_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<(), EngineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable(
                "audit sink is offline".to_string(),
            ));
        }
        self.entries.write().await.push(entry);
        Ok(())
    }
}

pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Build and append an audit entry. Never fails: a sink error is
    /// logged at warn and discarded.
    pub async fn record(&self, input: AuditInput) {
        let changed_fields = changed_fields(&input.old_values, &input.new_values);
        let (severity, is_confidential) = classify(input.action, &changed_fields);

        let entry = AuditEntry {
            id: Uuid::new_v4(),
            entity_id: input.entity_id,
            action: input.action,
            old_values: input.old_values,
            new_values: input.new_values,
            changed_fields,
            severity,
            is_confidential,
            actor_id: input.actor.actor_id,
            actor_name: input.actor.actor_name,
            actor_role: input.actor.actor_role,
            timestamp: Utc::now(),
            metadata: input.metadata,
        };

        if let Err(err) = self.sink.append(entry).await {
            tracing::warn!(error = %err, "audit write failed; operation continues");
        }
    }
}

/// Keys present in `new_values` whose value differs from the matching
/// `old_values` entry. Fields absent from the update are excluded even if
/// they exist on the record.
fn changed_fields(
    old_values: &Option<serde_json::Value>,
    new_values: &Option<serde_json::Value>,
) -> Vec<String> {
    let Some(serde_json::Value::Object(new_map)) = new_values else {
        return Vec::new();
    };
    let old_map = match old_values {
        Some(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    };

    let mut changed: Vec<String> = new_map
        .iter()
        .filter(|(key, new_value)| old_map.and_then(|m| m.get(key.as_str())) != Some(*new_value))
        .map(|(key, _)| key.clone())
        .collect();
    changed.sort();
    changed
}

fn touches(changed: &[String], fields: &[&str]) -> bool {
    changed.iter().any(|f| fields.contains(&f.as_str()))
}

/// Severity and confidentiality derived from the action and the diff.
fn classify(action: AuditAction, changed: &[String]) -> (AuditSeverity, bool) {
    let sensitive = touches(changed, MEDICAL_FIELDS)
        || touches(changed, DISCIPLINARY_FIELDS)
        || touches(changed, CONTACT_FIELDS);

    let severity = if action == AuditAction::Delete {
        if sensitive {
            AuditSeverity::Critical
        } else {
            AuditSeverity::High
        }
    } else if touches(changed, MEDICAL_FIELDS) {
        AuditSeverity::High
    } else if sensitive {
        AuditSeverity::Medium
    } else if action == AuditAction::Update && touches(changed, PROFILE_FIELDS) {
        AuditSeverity::Medium
    } else {
        AuditSeverity::Low
    };

    (severity, sensitive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::audit::model::ActorContext;
    use serde_json::json;

    fn actor() -> ActorContext {
        ActorContext {
            actor_id: Uuid::new_v4(),
            actor_name: "Registrar".to_string(),
            actor_role: "admin".to_string(),
        }
    }

    #[test]
    fn diff_is_restricted_to_fields_in_the_update() {
        let old = Some(json!({"first_name": "Ada", "email": "a@x.com", "grade_code": "10"}));
        let new = Some(json!({"first_name": "Ada", "email": "b@x.com"}));
        assert_eq!(changed_fields(&old, &new), vec!["email".to_string()]);
    }

    #[test]
    fn create_with_no_old_values_marks_all_fields_changed() {
        let new = Some(json!({"first_name": "Ada", "email": "a@x.com"}));
        assert_eq!(
            changed_fields(&None, &new),
            vec!["email".to_string(), "first_name".to_string()]
        );
    }

    #[test]
    fn medical_updates_are_high_and_confidential() {
        let (severity, confidential) =
            classify(AuditAction::Update, &["medical_notes".to_string()]);
        assert_eq!(severity, AuditSeverity::High);
        assert!(confidential);
    }

    #[test]
    fn contact_updates_are_medium_and_confidential() {
        let (severity, confidential) = classify(AuditAction::Update, &["email".to_string()]);
        assert_eq!(severity, AuditSeverity::Medium);
        assert!(confidential);
    }

    #[test]
    fn deletes_are_at_least_high() {
        let (severity, _) = classify(AuditAction::Delete, &[]);
        assert_eq!(severity, AuditSeverity::High);
        let (severity, confidential) =
            classify(AuditAction::Delete, &["disciplinary_status".to_string()]);
        assert_eq!(severity, AuditSeverity::Critical);
        assert!(confidential);
    }

    #[test]
    fn routine_profile_updates_are_medium() {
        let (severity, confidential) =
            classify(AuditAction::Update, &["first_name".to_string()]);
        assert_eq!(severity, AuditSeverity::Medium);
        assert!(!confidential);
    }

    #[test]
    fn everything_else_defaults_to_low() {
        let (severity, confidential) = classify(AuditAction::Transition, &[]);
        assert_eq!(severity, AuditSeverity::Low);
        assert!(!confidential);
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed() {
        let sink = Arc::new(InMemoryAuditSink::new());
        sink.set_fail_writes(true);
        let recorder = AuditRecorder::new(sink.clone());
        recorder
            .record(AuditInput::rejection(
                Uuid::new_v4(),
                AuditAction::Transition,
                "not eligible",
                &actor(),
            ))
            .await;
        assert_eq!(sink.count().await, 0);
    }

    #[tokio::test]
    async fn entries_preserve_append_order() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let recorder = AuditRecorder::new(sink.clone());
        let entity = Uuid::new_v4();
        for reason in ["first", "second", "third"] {
            recorder
                .record(AuditInput::rejection(
                    entity,
                    AuditAction::Update,
                    reason,
                    &actor(),
                ))
                .await;
        }
        let entries = sink.entries().await;
        let reasons: Vec<_> = entries
            .iter()
            .map(|e| e.metadata.as_ref().unwrap()["reason"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(reasons, vec!["first", "second", "third"]);
    }
}
