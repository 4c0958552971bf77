pub mod model;
pub mod service;

pub use model::{ImportOutcome, ImportRow, ImportRowError};
pub use service::ImportService;
