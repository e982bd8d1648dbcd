//! Pipeline orchestrator: cache check, fetch, extraction, enrichment, and
//! write-back for one source URL.

pub mod analysis;
pub mod config;
pub mod error;
pub mod memory;
pub mod pipeline;

pub use analysis::AnalysisPath;
pub use config::PipelineConfig;
pub use error::{BuildError, PipelineError};
pub use memory::MemoryContentCache;
pub use pipeline::Pipeline;
