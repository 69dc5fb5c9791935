//! Infrastructure layer
//!
//! Holds the scarce resources (browser, HTTP client) and exposes them as
//! transport capabilities; no business logic lives here.

pub mod browser_transport;
pub mod http_transport;
pub mod transport;

pub use browser_transport::BrowserTransport;
pub use http_transport::HttpTransport;
pub use transport::{FetchResponse, Transport, TransportError, TransportSession};
