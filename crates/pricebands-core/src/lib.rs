pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod source;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{PipelineInputs, PipelineOutput, PipelineSettings, run_pipeline};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
