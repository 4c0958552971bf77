use crate::store::StoreError;

/// Engine-level error taxonomy.
///
/// Single-record operations propagate the first applicable variant to the
/// caller. Batch and import operations never surface these per item; they
/// record the message in the returned outcome and keep going, except for
/// systemic faults (see [`EngineError::is_systemic`]) which fail the
/// remaining items fast.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Ineligible(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Whether the fault affects the whole store rather than one record.
    /// Batch loops stop retrying individual items once this returns true.
    pub fn is_systemic(&self) -> bool {
        matches!(self, EngineError::Unavailable(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { field } => {
                EngineError::Conflict(format!("Duplicate value for {field}"))
            }
            StoreError::NotFound { entity } => EngineError::NotFound(entity),
            StoreError::Unavailable(msg) => EngineError::Unavailable(msg),
            StoreError::Other(err) => EngineError::Internal(err),
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::Validation(err.to_string())
    }
}
