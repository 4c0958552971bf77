//! Row-oriented ingestion of student records.
//!
//! Each row is validated, mapped, and persisted independently; a bad row
//! is recorded with its 1-based index and original payload and the
//! pipeline moves on. The counts in the outcome always reconcile with the
//! input size, whether every row succeeds, every row fails, or anything
//! in between.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::modules::audit::model::ActorContext;
use crate::modules::schools::model::SchoolProfile;
use crate::modules::students::model::NewStudent;
use crate::modules::students::service::StudentService;
use crate::store::StudentStore;
use crate::utils::errors::EngineError;

use super::model::{ImportOutcome, ImportRow, ImportRowError};

pub struct ImportService {
    store: Arc<dyn StudentStore>,
    students: Arc<StudentService>,
}

/// Duplicate keys already attempted within this batch.
#[derive(Default)]
struct SeenKeys {
    emails: HashSet<String>,
    admission_numbers: HashSet<String>,
}

impl ImportService {
    pub fn new(store: Arc<dyn StudentStore>, students: Arc<StudentService>) -> Self {
        Self { store, students }
    }

    #[instrument(skip(self, rows, actor), fields(total = rows.len()))]
    pub async fn import(
        &self,
        school_id: Uuid,
        rows: Vec<ImportRow>,
        actor: &ActorContext,
    ) -> Result<ImportOutcome, EngineError> {
        let school = self
            .store
            .get_school(school_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("School".to_string()))?;

        let mut outcome = ImportOutcome::new(rows.len());
        let mut seen = SeenKeys::default();
        let mut systemic: Option<String> = None;

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            if let Some(message) = &systemic {
                outcome.errors.push(row_error(row_number, &row, message));
                continue;
            }
            match self.import_row(&school, &row, &mut seen, actor).await {
                Ok(id) => outcome.imported.push(id),
                Err(err) => {
                    if err.is_systemic() {
                        systemic = Some(err.to_string());
                    }
                    outcome
                        .errors
                        .push(row_error(row_number, &row, &err.to_string()));
                }
            }
        }
        Ok(outcome)
    }

    async fn import_row(
        &self,
        school: &SchoolProfile,
        row: &ImportRow,
        seen: &mut SeenKeys,
        actor: &ActorContext,
    ) -> Result<Uuid, EngineError> {
        row.validate()?;

        let date_of_birth = match &row.date_of_birth {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    EngineError::Validation(format!("malformed date of birth: {raw}"))
                })?,
            ),
            None => None,
        };

        let email_key = row.email.to_ascii_lowercase();
        if seen.emails.contains(&email_key) {
            return Err(EngineError::Conflict(
                "Duplicate email within the import batch".to_string(),
            ));
        }
        if let Some(number) = &row.admission_number {
            if seen.admission_numbers.contains(number) {
                return Err(EngineError::Conflict(
                    "Duplicate admission number within the import batch".to_string(),
                ));
            }
        }

        let details = NewStudent {
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            email: row.email.clone(),
            grade_code: row.grade_code.clone(),
            stream_section: row.stream_section.clone(),
            date_of_birth,
            guardian_contact: row.guardian_contact.clone(),
            gpa: None,
            total_credits: None,
            admission_number: row.admission_number.clone(),
        };

        // `admit` retries once with a fresh number if an auto-generated
        // admission number loses a uniqueness race.
        let student = self.students.admit(school, details, actor).await?;

        seen.emails.insert(email_key);
        seen.admission_numbers
            .insert(student.admission_number.clone());
        Ok(student.id)
    }
}

fn row_error(row: usize, payload: &ImportRow, message: &str) -> ImportRowError {
    ImportRowError {
        row,
        message: message.to_string(),
        payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
    }
}
