//! Background job queue for long-running batches.
//!
//! Priority reflects operational urgency, not correctness: graduation
//! sweeps first, then promotion, transfer, and import. Jobs with equal
//! priority run in enqueue order. Delivery is at-least-once; every batch
//! operation is safe to re-run because rejected members simply fail
//! again.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::audit::model::ActorContext;
use crate::modules::import::model::{ImportOutcome, ImportRow};
use crate::modules::import::service::ImportService;
use crate::utils::errors::EngineError;

use super::model::{BatchOutcome, BatchScope, GraduationOptions, PromotionOptions};
use super::service::BatchService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    BulkImport,
    BatchPromotion,
    BatchGraduation,
    BatchTransfer,
}

impl JobKind {
    /// Higher runs first.
    pub fn priority(&self) -> u8 {
        match self {
            JobKind::BatchGraduation => 3,
            JobKind::BatchPromotion => 2,
            JobKind::BatchTransfer => 1,
            JobKind::BulkImport => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionJobPayload {
    pub school_id: Uuid,
    pub scope: BatchScope,
    pub options: PromotionOptions,
    pub actor: ActorContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationJobPayload {
    pub school_id: Uuid,
    pub scope: BatchScope,
    pub options: GraduationOptions,
    pub actor: ActorContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferJobPayload {
    pub school_id: Uuid,
    pub request_ids: Vec<Uuid>,
    pub actor: ActorContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJobPayload {
    pub school_id: Uuid,
    pub rows: Vec<ImportRow>,
    pub actor: ActorContext,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(
        &self,
        kind: JobKind,
        payload: serde_json::Value,
    ) -> Result<Uuid, EngineError>;

    /// The highest-priority pending job, or `None` when idle.
    async fn dequeue(&self) -> Result<Option<BatchJob>, EngineError>;
}

struct QueuedJob {
    priority: u8,
    seq: u64,
    job: BatchJob,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: highest priority first, FIFO within a priority.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
pub struct InMemoryJobQueue {
    heap: Mutex<BinaryHeap<QueuedJob>>,
    next_seq: AtomicU64,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.heap.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.heap.lock().await.is_empty()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(
        &self,
        kind: JobKind,
        payload: serde_json::Value,
    ) -> Result<Uuid, EngineError> {
        let job = BatchJob {
            id: Uuid::new_v4(),
            kind,
            payload,
            enqueued_at: Utc::now(),
        };
        let id = job.id;
        let queued = QueuedJob {
            priority: kind.priority(),
            seq: self.next_seq.fetch_add(1, AtomicOrdering::SeqCst),
            job,
        };
        self.heap.lock().await.push(queued);
        Ok(id)
    }

    async fn dequeue(&self) -> Result<Option<BatchJob>, EngineError> {
        Ok(self.heap.lock().await.pop().map(|q| q.job))
    }
}

/// Result of one processed job.
#[derive(Debug)]
pub struct CompletedJob {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub outcome: JobOutcome,
}

#[derive(Debug)]
pub enum JobOutcome {
    Batch(BatchOutcome),
    Import(ImportOutcome),
}

/// Single logical worker draining the queue in priority order.
pub struct BatchWorker {
    queue: Arc<dyn JobQueue>,
    batches: Arc<BatchService>,
    imports: Arc<ImportService>,
}

impl BatchWorker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        batches: Arc<BatchService>,
        imports: Arc<ImportService>,
    ) -> Self {
        Self {
            queue,
            batches,
            imports,
        }
    }

    /// Process the next pending job, if any.
    #[instrument(skip(self))]
    pub async fn run_next(&self) -> Result<Option<CompletedJob>, EngineError> {
        let Some(job) = self.queue.dequeue().await? else {
            return Ok(None);
        };
        info!(job_id = %job.id, kind = ?job.kind, "processing batch job");

        let outcome = match job.kind {
            JobKind::BatchGraduation => {
                let p: GraduationJobPayload = decode(job.payload)?;
                JobOutcome::Batch(
                    self.batches
                        .graduate_batch(p.school_id, p.scope, p.options, &p.actor)
                        .await?,
                )
            }
            JobKind::BatchPromotion => {
                let p: PromotionJobPayload = decode(job.payload)?;
                JobOutcome::Batch(
                    self.batches
                        .promote_batch(p.school_id, p.scope, p.options, &p.actor)
                        .await?,
                )
            }
            JobKind::BatchTransfer => {
                let p: TransferJobPayload = decode(job.payload)?;
                JobOutcome::Batch(
                    self.batches
                        .transfer_batch(p.school_id, p.request_ids, &p.actor)
                        .await?,
                )
            }
            JobKind::BulkImport => {
                let p: ImportJobPayload = decode(job.payload)?;
                JobOutcome::Import(self.imports.import(p.school_id, p.rows, &p.actor).await?)
            }
        };

        Ok(Some(CompletedJob {
            job_id: job.id,
            kind: job.kind,
            outcome,
        }))
    }

    /// Run jobs until the queue is empty.
    pub async fn drain(&self) -> Result<Vec<CompletedJob>, EngineError> {
        let mut completed = Vec::new();
        while let Some(done) = self.run_next().await? {
            completed.push(done);
        }
        Ok(completed)
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> Result<T, EngineError> {
    serde_json::from_value(payload)
        .map_err(|e| EngineError::Validation(format!("malformed job payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn dequeue_order_is_priority_then_fifo() {
        let queue = InMemoryJobQueue::new();
        queue
            .enqueue(JobKind::BulkImport, json!({"n": 1}))
            .await
            .unwrap();
        queue
            .enqueue(JobKind::BatchTransfer, json!({"n": 2}))
            .await
            .unwrap();
        queue
            .enqueue(JobKind::BatchGraduation, json!({"n": 3}))
            .await
            .unwrap();
        queue
            .enqueue(JobKind::BatchGraduation, json!({"n": 4}))
            .await
            .unwrap();
        queue
            .enqueue(JobKind::BatchPromotion, json!({"n": 5}))
            .await
            .unwrap();

        let mut kinds = Vec::new();
        let mut markers = Vec::new();
        while let Some(job) = queue.dequeue().await.unwrap() {
            kinds.push(job.kind);
            markers.push(job.payload["n"].as_i64().unwrap());
        }
        assert_eq!(
            kinds,
            vec![
                JobKind::BatchGraduation,
                JobKind::BatchGraduation,
                JobKind::BatchPromotion,
                JobKind::BatchTransfer,
                JobKind::BulkImport,
            ]
        );
        // FIFO within the graduation priority.
        assert_eq!(markers[0], 3);
        assert_eq!(markers[1], 4);
    }
}
