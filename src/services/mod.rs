//! Business capability layer
//!
//! Each service exposes one capability (decode a payload, extract a field,
//! write a row, send a message) and knows nothing about job flow.

pub mod decoder;
pub mod extract;
pub mod notify;
pub mod sheets;

pub use notify::TelegramNotifier;
pub use sheets::{MetricsSink, RowSlot, SheetsClient};
