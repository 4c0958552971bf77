//! Shared utilities for the lifecycle engine.

pub mod errors;
