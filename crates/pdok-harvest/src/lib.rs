//! Network side of the catalog spider: metadata-catalog queries,
//! capabilities harvesting for WMS/WFS/WCS/WMTS, and the bounded fan-out
//! that runs them concurrently.

pub mod capabilities;
pub mod csw;
pub mod error;
pub mod fan_out;
mod retry;
pub mod xml;

pub use capabilities::{parse_capabilities, CapabilitiesFetcher, FailureKind, FetchFailure};
pub use csw::CswClient;
pub use error::HarvestError;
pub use fan_out::fan_out;

/// Tracing target for recoverable oddities in capabilities documents.
/// Filtered off by default; the CLI enables it with `--warnings`.
pub const QUIRKS_TARGET: &str = "pdok_harvest::quirks";
