//! Stage-based extraction pipeline.
//!
//! - [`traits`] defines the pluggable tagging stage
//! - [`runner`] owns the stages and runs records through them
//! - [`observer`] exposes stage boundaries for timing and debugging

pub mod observer;
pub mod runner;
pub mod traits;

pub use observer::{NoopObserver, PipelineObserver, StageReport, StageTimingObserver};
pub use runner::{DynPipeline, ExternalPipeline, LocalPipeline, Pipeline};
pub use traits::{ExternalTagging, LocalTagging, SentenceTagger};
