pub mod config;
pub mod error;
pub mod fetch;
pub mod gdp;
pub mod logging;
pub mod pipeline;
pub mod process;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{EmissionsConfig, GdpConfig};
pub use error::{Error, Result};
pub use pipeline::{run_pipeline, RunSummary};
