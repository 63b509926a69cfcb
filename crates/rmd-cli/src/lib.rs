//! CLI library components for the Reference Metadata converter.

pub mod logging;
pub mod pipeline;
mod types;
