pub mod model;
pub mod service;

pub use model::{TransferRequest, TransferStatus};
pub use service::TransferService;
