//! Orchestration layer
//!
//! The paginated aggregation engine: per-page fetch with retry, and the
//! batch scheduler that drives discovery, bounded concurrency and the
//! failure-rate gate.

pub mod page_task;
pub mod scheduler;

pub use page_task::PageOutcome;
pub use scheduler::{run_aggregation, RunReport};
