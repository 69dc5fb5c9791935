//! # Yield Points Tracker
//!
//! Scheduled collectors that pull yield and points metrics from several
//! protocols and publish them to a spreadsheet and a chat channel.
//!
//! ## Architecture
//!
//! The system is layered; nothing reaches upward:
//!
//! ### ① Infrastructure
//! - `browser` / `infrastructure` - holds the scarce resources (headless
//!   browser, HTTP client) and exposes them as a transport capability:
//!   `open_session()` then `fetch(url) -> status + body`
//!
//! ### ② Services
//! - `services/decoder` - leaderboard page envelope decoding
//! - `services/extract` - rendered-text field extraction strategies
//! - `services/sheets` - date-keyed spreadsheet sink
//! - `services/notify` - chat notification
//!
//! ### ③ Orchestration
//! - `orchestrator/page_task` - one page, fetch + retry, never throws
//! - `orchestrator/scheduler` - discovery, batched bounded-concurrency
//!   fetch, failure-rate gate
//!
//! ### ④ Jobs
//! - `jobs/*` - one module per protocol, wiring transport + services +
//!   orchestrator into a daily collection run

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod jobs;
pub mod orchestrator;
pub mod services;
pub mod utils;

// Re-export the types most callers need
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserTransport, FetchResponse, HttpTransport, Transport, TransportError, TransportSession};
pub use orchestrator::{run_aggregation, PageOutcome, RunReport};
pub use services::{MetricsSink, RowSlot, SheetsClient, TelegramNotifier};
