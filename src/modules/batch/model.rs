use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::eligibility::model::ClearanceMode;

/// How a batch resolves its member set. Resolution happens once at the
/// start of the batch; the set is fixed for its duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum BatchScope {
    /// Every active student in the school.
    All,
    Grade {
        grade_code: String,
    },
    Section {
        grade_code: String,
        stream_section: String,
    },
    /// Caller-supplied ids; unknown ids become per-item failures.
    Students {
        student_ids: Vec<Uuid>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionOptions {
    pub target_grade: String,
    pub target_section: Option<String>,
    /// Repeaters (students on probation) are skipped unless set.
    #[serde(default)]
    pub include_repeaters: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationOptions {
    pub clearance: ClearanceMode,
    /// Defaults to the current calendar year.
    pub graduation_year: Option<i32>,
}

/// One failed batch member: a student id for batch operations, a 1-based
/// row number for imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemError {
    pub student_id: Option<Uuid>,
    pub row: Option<usize>,
    pub message: String,
}

impl BatchItemError {
    pub fn for_student(student_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            student_id: Some(student_id),
            row: None,
            message: message.into(),
        }
    }
}

/// Aggregated result of a batch operation.
///
/// `succeeded.len() + failed.len() == requested` always holds; a batch is
/// never "failed" as a whole because some members were ineligible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub requested: usize,
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BatchItemError>,
}

impl BatchOutcome {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_fully_successful(&self) -> bool {
        self.failed.is_empty()
    }
}
