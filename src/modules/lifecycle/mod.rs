pub mod service;

pub use service::{GraduationOutcome, LifecycleService};
