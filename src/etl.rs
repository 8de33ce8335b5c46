//! A conditional refresh of a remote zipped workbook: check if the resource
//! changed since the last run, download it, unzip it, convert one sheet to CSV.
//!
//! ```text
//! check freshness --(stale)--> fetch --> extract --> convert --> commit checkpoint
//!        |
//!        +--(fresh)--> done
//! ```

pub mod checkpoint;
pub mod error;
pub mod fetch;
pub mod freshness;
pub mod pipeline;
pub mod retry;
pub mod unzip;
pub mod xlsx;

#[cfg(test)]
pub(crate) mod testing;

pub use error::EtlError;
pub use pipeline::{RefreshPipeline, RunOutcome};
