//! Upstream call subsystem.
//!
//! # Data Flow
//! ```text
//! Permitted request
//!     → executor.rs (build GET, deadline, retries)
//!     → transport.rs (hyper client, or a fake in tests)
//!     → result.rs (Success(payload) | Failure(kind) | Timeout)
//! ```

pub mod executor;
pub mod result;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::{CallExecutor, InvalidEndpoint, UpstreamRequest};
pub use result::{CallResult, FailureKind};
pub use transport::{HyperTransport, Transport, TransportError};
