use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One raw tabular row as received from an upload. Everything arrives as
/// text; typed parsing happens in the pipeline so a malformed value fails
/// its row instead of the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImportRow {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 20))]
    pub grade_code: String,
    pub stream_section: Option<String>,
    /// `YYYY-MM-DD`; parsed per row.
    pub date_of_birth: Option<String>,
    pub guardian_contact: Option<String>,
    /// Assigned by the generator when absent.
    pub admission_number: Option<String>,
}

/// A failed row, carrying its 1-based index and the original payload for
/// operator diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row: usize,
    pub message: String,
    pub payload: serde_json::Value,
}

/// Aggregated import result. `imported.len() + errors.len() == total`
/// always holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub total: usize,
    pub imported: Vec<Uuid>,
    pub errors: Vec<ImportRowError>,
}

impl ImportOutcome {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            imported: Vec::new(),
            errors: Vec::new(),
        }
    }
}
