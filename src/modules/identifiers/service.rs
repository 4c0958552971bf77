//! Admission-number generation.
//!
//! Numbers look like `GHS/2026/0042`: school code, admission year, and a
//! zero-padded sequence. Uniqueness under concurrent writers is optimistic:
//! candidates are checked against the store and retried a bounded number of
//! times; the caller's insert remains the final arbiter.

use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::modules::schools::model::SchoolProfile;
use crate::store::StudentStore;
use crate::utils::errors::EngineError;

pub struct AdmissionNumberGenerator {
    store: Arc<dyn StudentStore>,
    max_attempts: u32,
    sequence_width: usize,
}

impl AdmissionNumberGenerator {
    pub fn new(store: Arc<dyn StudentStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_identifier_attempts,
            sequence_width: config.sequence_width,
        }
    }

    /// Produce a candidate admission number for the given school and year.
    ///
    /// After the retry budget is exhausted this falls back to a
    /// timestamp-derived suffix and returns it without a uniqueness
    /// pre-check; it never errors for exhaustion alone. Store faults while
    /// probing do propagate.
    #[instrument(skip(self, school), fields(school = %school.code))]
    pub async fn generate(
        &self,
        school: &SchoolProfile,
        year: i32,
    ) -> Result<String, EngineError> {
        let prefix = format!("{}/{}/", school.code, year);
        let current_max = self
            .store
            .max_admission_sequence(school.id, &prefix)
            .await?;
        let mut sequence = next_sequence(current_max);

        for _ in 0..self.max_attempts {
            let candidate = format!(
                "{prefix}{sequence:0width$}",
                width = self.sequence_width
            );
            if !self
                .store
                .admission_number_exists(school.id, &candidate)
                .await?
            {
                return Ok(candidate);
            }
            sequence += 1;
        }

        // Last resort: low-order digits of the current timestamp. Accepted
        // collision risk; the insert will reject a loser.
        let fallback = format!(
            "{prefix}{:06}",
            Utc::now().timestamp_millis().rem_euclid(1_000_000)
        );
        warn!(
            school_id = %school.id,
            candidate = %fallback,
            "admission-number retries exhausted, using timestamp fallback"
        );
        Ok(fallback)
    }

    /// Convenience for callers holding only the school id.
    pub async fn generate_for(&self, school_id: Uuid, year: i32) -> Result<String, EngineError> {
        let school = self
            .store
            .get_school(school_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("School".to_string()))?;
        self.generate(&school, year).await
    }
}

/// Next sequence from the store's current maximum. Stateless by design:
/// there is no cached process-wide counter to drift.
pub fn next_sequence(current_max: Option<u32>) -> u32 {
    current_max.map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::students::model::{NewStudent, Student};
    use crate::store::InMemoryStudentStore;

    fn school() -> SchoolProfile {
        SchoolProfile {
            id: Uuid::new_v4(),
            name: "Greenhill High".to_string(),
            code: "GHS".to_string(),
            terminal_grade: "Final".to_string(),
        }
    }

    fn student_with_number(school_id: Uuid, number: &str, email: &str) -> Student {
        Student::new(
            school_id,
            number.to_string(),
            NewStudent {
                first_name: "Ama".to_string(),
                last_name: "Boateng".to_string(),
                email: email.to_string(),
                grade_code: "10".to_string(),
                stream_section: None,
                date_of_birth: None,
                guardian_contact: None,
                gpa: None,
                total_credits: None,
                admission_number: None,
            },
        )
    }

    #[test]
    fn next_sequence_defaults_to_one() {
        assert_eq!(next_sequence(None), 1);
        assert_eq!(next_sequence(Some(41)), 42);
    }

    #[tokio::test]
    async fn first_number_for_an_empty_prefix() {
        let store = Arc::new(InMemoryStudentStore::new());
        let school = school();
        store.put_school(school.clone()).await;
        let generator = AdmissionNumberGenerator::new(store, &EngineConfig::default());
        let number = generator.generate(&school, 2026).await.unwrap();
        assert_eq!(number, "GHS/2026/0001");
    }

    #[tokio::test]
    async fn increments_past_the_highest_existing_number() {
        let store = Arc::new(InMemoryStudentStore::new());
        let school = school();
        store.put_school(school.clone()).await;
        store
            .insert(student_with_number(
                school.id,
                "GHS/2026/0041",
                "a@example.com",
            ))
            .await
            .unwrap();
        let generator = AdmissionNumberGenerator::new(store, &EngineConfig::default());
        let number = generator.generate(&school, 2026).await.unwrap();
        assert_eq!(number, "GHS/2026/0042");
    }

    #[tokio::test]
    async fn skips_candidates_that_already_exist() {
        let store = Arc::new(InMemoryStudentStore::new());
        let school = school();
        store.put_school(school.clone()).await;
        // Max sequence is 1, but 0002 is also taken out of order.
        store
            .insert(student_with_number(
                school.id,
                "GHS/2026/0002",
                "a@example.com",
            ))
            .await
            .unwrap();
        let generator = AdmissionNumberGenerator::new(store.clone(), &EngineConfig::default());
        let number = generator.generate(&school, 2026).await.unwrap();
        assert_eq!(number, "GHS/2026/0003");
    }

    /// Store whose max-sequence answer lags behind the numbers it holds,
    /// the situation a concurrent writer produces.
    struct StaleMaxStore {
        inner: InMemoryStudentStore,
        stale_max: Option<u32>,
    }

    #[async_trait::async_trait]
    impl StudentStore for StaleMaxStore {
        async fn find_by_id(
            &self,
            school_id: Uuid,
            id: Uuid,
        ) -> Result<Option<Student>, crate::store::StoreError> {
            self.inner.find_by_id(school_id, id).await
        }

        async fn find_by_filter(
            &self,
            school_id: Uuid,
            filter: &crate::store::StudentFilter,
        ) -> Result<Vec<Student>, crate::store::StoreError> {
            self.inner.find_by_filter(school_id, filter).await
        }

        async fn insert(&self, student: Student) -> Result<Student, crate::store::StoreError> {
            self.inner.insert(student).await
        }

        async fn update(&self, student: Student) -> Result<Student, crate::store::StoreError> {
            self.inner.update(student).await
        }

        async fn max_admission_sequence(
            &self,
            _school_id: Uuid,
            _prefix: &str,
        ) -> Result<Option<u32>, crate::store::StoreError> {
            Ok(self.stale_max)
        }

        async fn admission_number_exists(
            &self,
            school_id: Uuid,
            admission_number: &str,
        ) -> Result<bool, crate::store::StoreError> {
            self.inner
                .admission_number_exists(school_id, admission_number)
                .await
        }

        async fn get_school(
            &self,
            school_id: Uuid,
        ) -> Result<Option<SchoolProfile>, crate::store::StoreError> {
            self.inner.get_school(school_id).await
        }

        async fn get_transfer_request(
            &self,
            id: Uuid,
        ) -> Result<Option<crate::modules::transfers::model::TransferRequest>, crate::store::StoreError>
        {
            self.inner.get_transfer_request(id).await
        }

        async fn save_transfer_request(
            &self,
            request: crate::modules::transfers::model::TransferRequest,
        ) -> Result<(), crate::store::StoreError> {
            self.inner.save_transfer_request(request).await
        }
    }

    #[tokio::test]
    async fn falls_back_to_timestamp_suffix_after_bound_exhaustion() {
        let inner = InMemoryStudentStore::new();
        let school = school();
        inner.put_school(school.clone()).await;
        for i in 1..=10u32 {
            inner
                .insert(student_with_number(
                    school.id,
                    &format!("GHS/2026/{i:04}"),
                    &format!("s{i}@example.com"),
                ))
                .await
                .unwrap();
        }
        // The generator believes the sequence is at 0, but 1..=10 are taken.
        let store = Arc::new(StaleMaxStore {
            inner,
            stale_max: None,
        });
        let config = EngineConfig {
            max_identifier_attempts: 10,
            ..EngineConfig::default()
        };
        let generator = AdmissionNumberGenerator::new(store, &config);
        let number = generator.generate(&school, 2026).await.unwrap();
        let suffix = number.strip_prefix("GHS/2026/").unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }
}
