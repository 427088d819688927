//! Gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → handler.rs (breaker admission, upstream call, outcome recording)
//!     → fallback.rs (503 with marker header when denied, failed or timed out)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Every error is recovered here; callers always get a well-formed response
//! - Denials never touch breaker statistics

pub mod fallback;
pub mod handler;

pub use fallback::{FallbackComposer, FallbackReason, FallbackResponse, X_GATEWAY_FALLBACK};
pub use handler::{GatewayHandler, GatewayResponse};
