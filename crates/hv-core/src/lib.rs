//! hv-core: shared foundation for the HVAC rig controller.
//!
//! Contains:
//! - units (uom temperature types + Celsius/Fahrenheit helpers)
//! - numeric (Real + range checks + display rounding)
//! - comfort (heat-index transform applied to raw sensor samples)
//! - error (shared error types)

pub mod comfort;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use comfort::heat_index_f;
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
