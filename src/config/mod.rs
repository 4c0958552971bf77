//! Engine configuration.
//!
//! All knobs have sensible defaults and can be overridden from the
//! environment, so embedding applications only set what they need.

use std::env;

use crate::modules::eligibility::model::EligibilityPolicy;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Minimum GPA required for graduation.
    pub min_graduation_gpa: f64,
    /// Minimum earned credits required for graduation.
    pub min_graduation_credits: i32,
    /// Bounded retry budget for admission-number generation.
    pub max_identifier_attempts: u32,
    /// Zero-padded width of the admission-number sequence suffix.
    pub sequence_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_graduation_gpa: 2.0,
            min_graduation_credits: 150,
            max_identifier_attempts: 10,
            sequence_width: 4,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_graduation_gpa: env::var("LIFECYCLE_MIN_GRADUATION_GPA")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_graduation_gpa),
            min_graduation_credits: env::var("LIFECYCLE_MIN_GRADUATION_CREDITS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_graduation_credits),
            max_identifier_attempts: env::var("LIFECYCLE_MAX_IDENTIFIER_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_identifier_attempts),
            sequence_width: env::var("LIFECYCLE_SEQUENCE_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sequence_width),
        }
    }

    /// Eligibility thresholds derived from this configuration.
    pub fn eligibility_policy(&self) -> EligibilityPolicy {
        EligibilityPolicy {
            min_gpa: self.min_graduation_gpa,
            min_credits: self.min_graduation_credits,
        }
    }
}
