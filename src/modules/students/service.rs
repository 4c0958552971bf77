//! Single-record student operations.
//!
//! Unlike the batch paths, these propagate the first applicable error
//! directly to the caller. Every mutating attempt lands in the audit
//! trail, rejected ones included.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::modules::audit::model::{ActorContext, AuditAction, AuditInput};
use crate::modules::audit::service::AuditRecorder;
use crate::modules::eligibility::model::ClearanceMode;
use crate::modules::identifiers::service::AdmissionNumberGenerator;
use crate::modules::lifecycle::service::LifecycleService;
use crate::modules::schools::model::SchoolProfile;
use crate::store::{StoreError, StudentFilter, StudentStore};
use crate::utils::errors::EngineError;

use super::model::{CreateStudentDto, NewStudent, Student, UpdateStudentDto};

pub struct StudentService {
    store: Arc<dyn StudentStore>,
    ids: Arc<AdmissionNumberGenerator>,
    lifecycle: Arc<LifecycleService>,
    audit: Arc<AuditRecorder>,
}

impl StudentService {
    pub fn new(
        store: Arc<dyn StudentStore>,
        ids: Arc<AdmissionNumberGenerator>,
        lifecycle: Arc<LifecycleService>,
        audit: Arc<AuditRecorder>,
    ) -> Self {
        Self {
            store,
            ids,
            lifecycle,
            audit,
        }
    }

    #[instrument(skip(self, dto, actor))]
    pub async fn create_student(
        &self,
        school_id: Uuid,
        dto: CreateStudentDto,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        dto.validate()?;
        let school = self.school(school_id).await?;
        let details = NewStudent {
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            grade_code: dto.grade_code,
            stream_section: dto.stream_section,
            date_of_birth: dto.date_of_birth,
            guardian_contact: dto.guardian_contact,
            gpa: None,
            total_credits: None,
            admission_number: dto.admission_number,
        };
        self.admit(&school, details, actor).await
    }

    /// Admit a new student: assign an admission number (generating one if
    /// the caller supplied none), insert, and audit.
    ///
    /// When an auto-generated number loses a race at insert time, one
    /// fresh number is generated and retried before giving up. A
    /// caller-supplied number is never silently replaced.
    pub async fn admit(
        &self,
        school: &SchoolProfile,
        details: NewStudent,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let year = Utc::now().year();
        let (admission_number, generated) = match details.admission_number.clone() {
            Some(number) => (number, false),
            None => (self.ids.generate(school, year).await?, true),
        };

        let student = Student::new(school.id, admission_number, details.clone());
        let saved = match self.store.insert(student).await {
            Ok(saved) => saved,
            Err(StoreError::UniqueViolation { field }) if field == "admission_number" && generated => {
                let retry_number = self.ids.generate(school, year).await?;
                let retry = Student::new(school.id, retry_number, details);
                match self.store.insert(retry).await {
                    Ok(saved) => saved,
                    Err(err) => return self.admission_failed(err, actor).await,
                }
            }
            Err(err) => return self.admission_failed(err, actor).await,
        };

        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Create,
                old_values: None,
                new_values: serde_json::to_value(&saved).ok(),
                actor: actor.clone(),
                metadata: None,
            })
            .await;
        Ok(saved)
    }

    async fn admission_failed(
        &self,
        err: StoreError,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let err: EngineError = err.into();
        self.audit
            .record(AuditInput::rejection(
                Uuid::nil(),
                AuditAction::Create,
                &err.to_string(),
                actor,
            ))
            .await;
        Err(err)
    }

    #[instrument(skip(self))]
    pub async fn get_student(&self, school_id: Uuid, id: Uuid) -> Result<Student, EngineError> {
        self.store
            .find_by_id(school_id, id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Student".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_students(
        &self,
        school_id: Uuid,
        filter: StudentFilter,
    ) -> Result<Vec<Student>, EngineError> {
        Ok(self.store.find_by_filter(school_id, &filter).await?)
    }

    /// Merge-style partial update. Status, admission number, and the
    /// history sequences are not touchable here; status moves only through
    /// lifecycle transitions.
    #[instrument(skip(self, dto, actor))]
    pub async fn update_student(
        &self,
        school_id: Uuid,
        id: Uuid,
        dto: UpdateStudentDto,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        dto.validate()?;
        let existing = self.get_student(school_id, id).await?;

        let mut old_values = serde_json::Map::new();
        let mut new_values = serde_json::Map::new();
        let mut updated = existing.clone();

        macro_rules! apply {
            ($field:ident, $target:expr, $old:expr) => {
                if let Some(value) = dto.$field.clone() {
                    old_values.insert(stringify!($field).to_string(), json!($old));
                    new_values.insert(stringify!($field).to_string(), json!(value.clone()));
                    $target = value.into();
                }
            };
        }

        apply!(first_name, updated.first_name, existing.first_name);
        apply!(last_name, updated.last_name, existing.last_name);
        apply!(email, updated.email, existing.email);
        apply!(stream_section, updated.stream_section, existing.stream_section);
        apply!(date_of_birth, updated.date_of_birth, existing.date_of_birth);
        apply!(
            guardian_contact,
            updated.guardian_contact,
            existing.guardian_contact
        );
        apply!(medical_notes, updated.medical_notes, existing.medical_notes);
        apply!(gpa, updated.academics.gpa, existing.academics.gpa);
        apply!(
            total_credits,
            updated.academics.total_credits,
            existing.academics.total_credits
        );
        if let Some(balance) = dto.outstanding_balance {
            old_values.insert(
                "outstanding_balance".to_string(),
                json!(existing.financial.outstanding_balance),
            );
            new_values.insert("outstanding_balance".to_string(), json!(balance));
            updated.financial.outstanding_balance = balance;
        }
        if let Some(on_probation) = dto.on_probation {
            old_values.insert(
                "on_probation".to_string(),
                json!(existing.standing.on_probation),
            );
            new_values.insert("on_probation".to_string(), json!(on_probation));
            updated.standing.on_probation = on_probation;
        }
        if let Some(disciplinary_status) = dto.disciplinary_status {
            old_values.insert(
                "disciplinary_status".to_string(),
                json!(existing.standing.disciplinary_status),
            );
            new_values.insert(
                "disciplinary_status".to_string(),
                json!(disciplinary_status),
            );
            updated.standing.disciplinary_status = disciplinary_status;
        }

        updated.updated_at = Utc::now();
        let saved = match self.store.update(updated).await {
            Ok(saved) => saved,
            Err(err) => {
                let err: EngineError = err.into();
                self.audit
                    .record(AuditInput::rejection(
                        id,
                        AuditAction::Update,
                        &err.to_string(),
                        actor,
                    ))
                    .await;
                return Err(err);
            }
        };

        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Update,
                old_values: Some(serde_json::Value::Object(old_values)),
                new_values: Some(serde_json::Value::Object(new_values)),
                actor: actor.clone(),
                metadata: None,
            })
            .await;
        Ok(saved)
    }

    /// Graduate one student, propagating rejections to the caller.
    #[instrument(skip(self, actor))]
    pub async fn graduate_student(
        &self,
        school_id: Uuid,
        id: Uuid,
        mode: ClearanceMode,
        year: Option<i32>,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let school = self.school(school_id).await?;
        let student = self.get_student(school_id, id).await?;
        let year = year.unwrap_or_else(|| Utc::now().year());

        let outcome = match self.lifecycle.graduate(&student, &school, mode, year).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.audit
                    .record(AuditInput::rejection(
                        id,
                        AuditAction::Transition,
                        &err.to_string(),
                        actor,
                    ))
                    .await;
                return Err(err);
            }
        };

        let saved = self.store.update(outcome.student).await?;
        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Transition,
                old_values: serde_json::to_value(&student).ok(),
                new_values: serde_json::to_value(&saved).ok(),
                actor: actor.clone(),
                metadata: Some(json!({
                    "transition": "graduation",
                    "clearance_waived": outcome.clearance_waived,
                })),
            })
            .await;
        Ok(saved)
    }

    #[instrument(skip(self, actor))]
    pub async fn promote_student(
        &self,
        school_id: Uuid,
        id: Uuid,
        target_grade: &str,
        target_section: Option<&str>,
        include_repeaters: bool,
        reason: Option<String>,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let student = self.get_student(school_id, id).await?;
        let promoted = match self.lifecycle.promote(
            &student,
            target_grade,
            target_section,
            include_repeaters,
            actor.actor_id,
            reason,
        ) {
            Ok(promoted) => promoted,
            Err(err) => {
                self.audit
                    .record(AuditInput::rejection(
                        id,
                        AuditAction::Transition,
                        &err.to_string(),
                        actor,
                    ))
                    .await;
                return Err(err);
            }
        };
        let saved = self.store.update(promoted).await?;
        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Transition,
                old_values: serde_json::to_value(&student).ok(),
                new_values: serde_json::to_value(&saved).ok(),
                actor: actor.clone(),
                metadata: Some(json!({"transition": "promotion"})),
            })
            .await;
        Ok(saved)
    }

    /// Soft-delete; a no-op when the student is already inactive.
    #[instrument(skip(self, actor))]
    pub async fn remove_student(
        &self,
        school_id: Uuid,
        id: Uuid,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let student = self.get_student(school_id, id).await?;
        let inactive = self.lifecycle.deactivate(&student)?;
        if inactive.status == student.status {
            return Ok(student);
        }
        self.finish_deactivation(student, inactive, None, actor).await
    }

    /// Soft-delete with an explicit reason; re-deleting is rejected.
    #[instrument(skip(self, actor))]
    pub async fn delete_student_with_reason(
        &self,
        school_id: Uuid,
        id: Uuid,
        reason: &str,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let student = self.get_student(school_id, id).await?;
        let inactive = match self.lifecycle.deactivate_with_reason(&student, reason) {
            Ok(inactive) => inactive,
            Err(err) => {
                self.audit
                    .record(AuditInput::rejection(
                        id,
                        AuditAction::Delete,
                        &err.to_string(),
                        actor,
                    ))
                    .await;
                return Err(err);
            }
        };
        self.finish_deactivation(student, inactive, Some(reason), actor)
            .await
    }

    async fn finish_deactivation(
        &self,
        before: Student,
        after: Student,
        reason: Option<&str>,
        actor: &ActorContext,
    ) -> Result<Student, EngineError> {
        let saved = self.store.update(after).await?;
        self.audit
            .record(AuditInput {
                entity_id: saved.id,
                action: AuditAction::Delete,
                old_values: serde_json::to_value(&before).ok(),
                new_values: serde_json::to_value(&saved).ok(),
                actor: actor.clone(),
                metadata: reason.map(|r| json!({"reason": r})),
            })
            .await;
        Ok(saved)
    }

    async fn school(&self, school_id: Uuid) -> Result<SchoolProfile, EngineError> {
        self.store
            .get_school(school_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("School".to_string()))
    }
}
