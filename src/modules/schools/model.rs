use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a school the engine needs: the code used as the
/// admission-number prefix and the grade that gates graduation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolProfile {
    pub id: Uuid,
    pub name: String,
    /// Short code used as the admission-number prefix, e.g. `GHS`.
    pub code: String,
    /// The terminal grade code; only students in this grade may graduate.
    pub terminal_grade: String,
}
