//! ti-core: stable foundation for temporal instanton analysis.
//!
//! Contains:
//! - units (uom SI types + constructors for thermal and timing quantities)
//! - numeric (Real + tolerances + rounding helpers)
//! - ids (stable compact IDs for network objects)
//! - error (shared error types)
//! - timing (lightweight stage timers)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{TiError, TiResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
