use serde::{Deserialize, Serialize};

use crate::utils::errors::EngineError;

/// Outcome of an eligibility evaluation. Rules are checked in a fixed
/// order and the first failure wins; reasons are surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible { reason: String },
}

impl Eligibility {
    pub fn ineligible(reason: impl Into<String>) -> Self {
        Eligibility::Ineligible {
            reason: reason.into(),
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }

    pub fn into_result(self) -> Result<(), EngineError> {
        match self {
            Eligibility::Eligible => Ok(()),
            Eligibility::Ineligible { reason } => Err(EngineError::Ineligible(reason)),
        }
    }
}

/// Academic thresholds for graduation, normally sourced from
/// [`crate::config::EngineConfig::eligibility_policy`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    pub min_gpa: f64,
    pub min_credits: i32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            min_gpa: 2.0,
            min_credits: 150,
        }
    }
}

/// Caller-selected handling of the secondary clearance gate
/// (library/hostel/medical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceMode {
    /// Enforce the secondary gate via the clearance provider.
    Cleared,
    /// Waive the secondary gate entirely; the waiver is noted in the
    /// audit trail.
    Pending,
}

/// Result of a clearance lookup from the external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearanceStatus {
    Cleared,
    Outstanding { departments: Vec<String> },
}
