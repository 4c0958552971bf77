pub mod model;
pub mod service;

pub use model::{ActorContext, AuditAction, AuditEntry, AuditInput, AuditSeverity};
pub use service::{AuditRecorder, AuditSink, InMemoryAuditSink};
