//! Storage abstraction for the engine.
//!
//! Persistence technology is an external concern; the engine only talks to
//! [`StudentStore`]. Implementations must surface uniqueness violations as
//! [`StoreError::UniqueViolation`] so callers can distinguish conflicts
//! from infrastructure faults.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::schools::model::SchoolProfile;
use crate::modules::students::model::{Student, StudentStatus};
use crate::modules::transfers::model::TransferRequest;

pub use memory::InMemoryStudentStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value for {field}")]
    UniqueViolation { field: String },

    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Filter used to resolve batch scopes. Matching is always scoped to one
/// school; the remaining fields narrow the set.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub status: Option<StudentStatus>,
    pub grade_code: Option<String>,
    pub stream_section: Option<String>,
}

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn find_by_id(&self, school_id: Uuid, id: Uuid) -> Result<Option<Student>, StoreError>;

    /// Resolve students matching the filter in a deterministic order
    /// (admission number ascending).
    async fn find_by_filter(
        &self,
        school_id: Uuid,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, StoreError>;

    /// Insert a new student, enforcing per-school uniqueness of
    /// `admission_number` and `email`.
    async fn insert(&self, student: Student) -> Result<Student, StoreError>;

    /// Replace an existing student. Fails with `NotFound` for unknown ids
    /// and `UniqueViolation` if an email change collides.
    async fn update(&self, student: Student) -> Result<Student, StoreError>;

    /// Highest numeric suffix among admission numbers starting with
    /// `prefix`, or `None` if the prefix is unused.
    async fn max_admission_sequence(
        &self,
        school_id: Uuid,
        prefix: &str,
    ) -> Result<Option<u32>, StoreError>;

    async fn admission_number_exists(
        &self,
        school_id: Uuid,
        admission_number: &str,
    ) -> Result<bool, StoreError>;

    async fn get_school(&self, school_id: Uuid) -> Result<Option<SchoolProfile>, StoreError>;

    async fn get_transfer_request(&self, id: Uuid)
    -> Result<Option<TransferRequest>, StoreError>;

    async fn save_transfer_request(&self, request: TransferRequest) -> Result<(), StoreError>;
}
