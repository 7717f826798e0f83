//! HTTP API layer for podium.
//!
//! - **Endpoints**: show browsing, voting and organizer management
//! - **Extractors**: device cookie and managed show
//! - **Middleware**: management password check
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
