//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve)
//!     → request.rs (assign / propagate x-request-id)
//!     → server.rs (router, tracing, outer timeout)
//!     → gateway handler (breaker, upstream, fallback)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayServer, ServerError};
