//! # Slateworks
//!
//! The student lifecycle and batch-operations engine: admission-number
//! generation, eligibility rules, lifecycle transitions, bulk operations
//! with per-item failure isolation, row-oriented import, and an immutable
//! audit trail.
//!
//! ## Architecture
//!
//! The codebase follows a feature-module layout:
//!
//! ```text
//! src/
//! ├── config/           # Engine configuration (thresholds, retry bounds)
//! ├── modules/          # Feature modules
//! │   ├── audit/       # Audit recorder, diffing, sensitivity classification
//! │   ├── batch/       # Batch processor, scopes, job queue and worker
//! │   ├── eligibility/ # Graduation/promotion/transfer rules, clearance gate
//! │   ├── identifiers/ # Admission-number generation with bounded retry
//! │   ├── import/      # Row-oriented import pipeline
//! │   ├── lifecycle/   # The state machine gating status changes
//! │   ├── schools/     # School profile (prefix code, terminal grade)
//! │   ├── students/    # Domain entity and single-record operations
//! │   └── transfers/   # Transfer-request workflow
//! ├── store/            # Repository trait + in-memory implementation
//! └── utils/            # Errors and shared helpers
//! ```
//!
//! Each feature module keeps the same structure: `mod.rs` for exports,
//! `model.rs` for domain types and DTOs, `service.rs` for business logic.
//!
//! ## Collaborators
//!
//! Persistence, actor identity, and clearance data are external. The
//! engine reaches them through [`store::StudentStore`],
//! [`modules::audit::model::ActorContext`], and
//! [`modules::eligibility::service::ClearanceProvider`]; in-memory
//! implementations ship for tests and for embedding applications that
//! bring their own backends later.
//!
//! ## Failure semantics
//!
//! Single-record operations propagate the first applicable
//! [`utils::errors::EngineError`]. Batch and import operations always
//! return an outcome whose counts reconcile with the requested set; a
//! member's rejection never aborts the batch, and only a systemic store
//! outage fails the remaining members fast. Audit writes are best-effort
//! and never abort the operation that triggered them.

pub mod config;
pub mod logging;
pub mod modules;
pub mod state;
pub mod store;
pub mod utils;

pub use config::EngineConfig;
pub use state::Engine;
pub use utils::errors::EngineError;
