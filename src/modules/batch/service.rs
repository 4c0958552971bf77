//! Bulk operations over resolved sets of students.
//!
//! Members are processed sequentially in resolved order, each in
//! isolation: a rejection or per-record fault is recorded and the batch
//! moves on. Only a systemic store outage short-circuits, failing the
//! remaining members with the same error instead of hammering a dead
//! backend.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::audit::model::{ActorContext, AuditAction, AuditInput};
use crate::modules::audit::service::AuditRecorder;
use crate::modules::lifecycle::service::LifecycleService;
use crate::modules::schools::model::SchoolProfile;
use crate::modules::students::model::{Student, StudentStatus};
use crate::modules::transfers::model::TransferStatus;
use crate::store::{StudentFilter, StudentStore};
use crate::utils::errors::EngineError;

use super::model::{BatchItemError, BatchOutcome, BatchScope, GraduationOptions, PromotionOptions};

/// A resolved batch member: either a student or an id that failed to
/// resolve (explicit-id scopes only).
enum BatchTarget {
    Found(Box<Student>),
    Missing(Uuid),
}

pub struct BatchService {
    store: Arc<dyn StudentStore>,
    lifecycle: Arc<LifecycleService>,
    audit: Arc<AuditRecorder>,
}

impl BatchService {
    pub fn new(
        store: Arc<dyn StudentStore>,
        lifecycle: Arc<LifecycleService>,
        audit: Arc<AuditRecorder>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            audit,
        }
    }

    /// Graduate every member of the scope that passes its guards.
    #[instrument(skip(self, actor))]
    pub async fn graduate_batch(
        &self,
        school_id: Uuid,
        scope: BatchScope,
        options: GraduationOptions,
        actor: &ActorContext,
    ) -> Result<BatchOutcome, EngineError> {
        let school = self.school(school_id).await?;
        let targets = self.resolve_scope(school_id, &scope).await?;
        let year = options
            .graduation_year
            .unwrap_or_else(|| Utc::now().year());

        let mut outcome = BatchOutcome::new(targets.len());
        let mut systemic: Option<String> = None;

        for target in targets {
            let student = match self
                .admit_target(target, &mut outcome, &systemic, actor)
                .await
            {
                Some(student) => student,
                None => continue,
            };
            let result = self
                .graduate_one(&student, &school, &options, year, actor)
                .await;
            self.settle(&student, result, &mut outcome, &mut systemic, actor)
                .await;
        }
        Ok(outcome)
    }

    /// Promote every member of the scope into the target grade.
    #[instrument(skip(self, actor))]
    pub async fn promote_batch(
        &self,
        school_id: Uuid,
        scope: BatchScope,
        options: PromotionOptions,
        actor: &ActorContext,
    ) -> Result<BatchOutcome, EngineError> {
        let targets = self.resolve_scope(school_id, &scope).await?;

        let mut outcome = BatchOutcome::new(targets.len());
        let mut systemic: Option<String> = None;

        for target in targets {
            let student = match self
                .admit_target(target, &mut outcome, &systemic, actor)
                .await
            {
                Some(student) => student,
                None => continue,
            };
            let result = self.promote_one(&student, &options, actor).await;
            self.settle(&student, result, &mut outcome, &mut systemic, actor)
                .await;
        }
        Ok(outcome)
    }

    /// Complete a set of approved transfer requests.
    #[instrument(skip(self, actor))]
    pub async fn transfer_batch(
        &self,
        school_id: Uuid,
        request_ids: Vec<Uuid>,
        actor: &ActorContext,
    ) -> Result<BatchOutcome, EngineError> {
        let mut outcome = BatchOutcome::new(request_ids.len());
        let mut systemic: Option<String> = None;

        for request_id in request_ids {
            if let Some(message) = &systemic {
                outcome.failed.push(BatchItemError {
                    student_id: None,
                    row: None,
                    message: message.clone(),
                });
                continue;
            }
            match self.transfer_one(school_id, request_id, actor).await {
                Ok(student_id) => outcome.succeeded.push(student_id),
                Err(err) => {
                    if err.is_systemic() {
                        systemic = Some(err.to_string());
                    }
                    outcome.failed.push(BatchItemError {
                        student_id: None,
                        row: None,
                        message: format!("request {request_id}: {err}"),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Resolve the member set once, in deterministic store order.
    async fn resolve_scope(
        &self,
        school_id: Uuid,
        scope: &BatchScope,
    ) -> Result<Vec<BatchTarget>, EngineError> {
        let targets = match scope {
            BatchScope::All => self
                .filtered(school_id, StudentFilter {
                    status: Some(StudentStatus::Active),
                    ..Default::default()
                })
                .await?,
            BatchScope::Grade { grade_code } => self
                .filtered(school_id, StudentFilter {
                    status: Some(StudentStatus::Active),
                    grade_code: Some(grade_code.clone()),
                    ..Default::default()
                })
                .await?,
            BatchScope::Section {
                grade_code,
                stream_section,
            } => self
                .filtered(school_id, StudentFilter {
                    status: Some(StudentStatus::Active),
                    grade_code: Some(grade_code.clone()),
                    stream_section: Some(stream_section.clone()),
                })
                .await?,
            BatchScope::Students { student_ids } => {
                let mut targets = Vec::with_capacity(student_ids.len());
                for id in student_ids {
                    match self.store.find_by_id(school_id, *id).await? {
                        Some(student) => targets.push(BatchTarget::Found(Box::new(student))),
                        None => targets.push(BatchTarget::Missing(*id)),
                    }
                }
                targets
            }
        };
        Ok(targets)
    }

    async fn filtered(
        &self,
        school_id: Uuid,
        filter: StudentFilter,
    ) -> Result<Vec<BatchTarget>, EngineError> {
        Ok(self
            .store
            .find_by_filter(school_id, &filter)
            .await?
            .into_iter()
            .map(|s| BatchTarget::Found(Box::new(s)))
            .collect())
    }

    /// Unwrap a target into a student, recording missing ids and members
    /// skipped after a systemic fault as failures. Missing ids are audited
    /// as rejected attempts like any other guard rejection.
    async fn admit_target(
        &self,
        target: BatchTarget,
        outcome: &mut BatchOutcome,
        systemic: &Option<String>,
        actor: &ActorContext,
    ) -> Option<Student> {
        match target {
            BatchTarget::Missing(id) => {
                self.audit
                    .record(AuditInput::rejection(
                        id,
                        AuditAction::Transition,
                        "Student not found",
                        actor,
                    ))
                    .await;
                outcome
                    .failed
                    .push(BatchItemError::for_student(id, "Student not found"));
                None
            }
            BatchTarget::Found(student) => {
                if let Some(message) = systemic {
                    outcome
                        .failed
                        .push(BatchItemError::for_student(student.id, message.clone()));
                    None
                } else {
                    Some(*student)
                }
            }
        }
    }

    /// Record one member's result and arm fail-fast on systemic faults.
    async fn settle(
        &self,
        student: &Student,
        result: Result<Student, EngineError>,
        outcome: &mut BatchOutcome,
        systemic: &mut Option<String>,
        actor: &ActorContext,
    ) {
        match result {
            Ok(saved) => outcome.succeeded.push(saved.id),
            Err(err) => {
                if err.is_systemic() {
                    *systemic = Some(err.to_string());
                } else {
                    self.audit
                        .record(AuditInput::rejection(
                            student.id,
                            AuditAction::Transition,
                            &err.to_string(),
                            actor,
                        ))
                        .await;
                }
                outcome
                    .failed
                    .push(BatchItemError::for_student(student.id, err.to_string()));
            }
        }
    }

    async fn graduate_one(
        &self,
        student: &Student,
        school: &SchoolProfile,
        options: &GraduationOptions,
        year: i32,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let graduation = self
            .lifecycle
            .graduate(student, school, options.clearance, year)
            .await?;
        let saved = self.store.update(graduation.student).await?;
        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Transition,
                old_values: serde_json::to_value(student).ok(),
                new_values: serde_json::to_value(&saved).ok(),
                actor: actor.clone(),
                metadata: Some(json!({
                    "transition": "graduation",
                    "clearance_waived": graduation.clearance_waived,
                })),
            })
            .await;
        Ok(saved)
    }

    async fn promote_one(
        &self,
        student: &Student,
        options: &PromotionOptions,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let promoted = self.lifecycle.promote(
            student,
            &options.target_grade,
            options.target_section.as_deref(),
            options.include_repeaters,
            actor.actor_id,
            options.reason.clone(),
        )?;
        let saved = self.store.update(promoted).await?;
        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Transition,
                old_values: serde_json::to_value(student).ok(),
                new_values: serde_json::to_value(&saved).ok(),
                actor: actor.clone(),
                metadata: Some(json!({"transition": "promotion"})),
            })
            .await;
        Ok(saved)
    }

    async fn transfer_one(
        &self,
        school_id: Uuid,
        request_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Uuid, EngineError> {
        let mut request = self
            .store
            .get_transfer_request(request_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Transfer request".to_string()))?;
        let student = self
            .store
            .find_by_id(school_id, request.student_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Student".to_string()))?;

        let moved = match self.lifecycle.complete_transfer(&student, &request) {
            Ok(moved) => moved,
            Err(err) => {
                self.audit
                    .record(AuditInput::rejection(
                        student.id,
                        AuditAction::Transition,
                        &err.to_string(),
                        actor,
                    ))
                    .await;
                return Err(err);
            }
        };

        // Two writes with no shared transaction: a fault between them can
        // leave the request Approved against an already-moved student.
        // Accepted window; the audit trail carries enough to reconcile.
        let saved = self.store.update(moved).await?;
        request.status = TransferStatus::Completed;
        request.updated_at = Utc::now();
        self.store.save_transfer_request(request).await?;

        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Transition,
                old_values: serde_json::to_value(&student).ok(),
                new_values: serde_json::to_value(&saved).ok(),
                actor: actor.clone(),
                metadata: Some(json!({"transition": "transfer"})),
            })
            .await;
        Ok(saved.id)
    }

    async fn school(&self, school_id: Uuid) -> Result<SchoolProfile, EngineError> {
        self.store
            .get_school(school_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("School".to_string()))
    }
}
