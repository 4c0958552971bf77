pub mod model;
pub mod queue;
pub mod service;

pub use model::{BatchItemError, BatchOutcome, BatchScope, GraduationOptions, PromotionOptions};
pub use queue::{BatchJob, BatchWorker, InMemoryJobQueue, JobKind, JobQueue};
pub use service::BatchService;
