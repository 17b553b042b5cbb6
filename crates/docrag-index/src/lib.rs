//! Ingestion and serving for docrag.
//!
//! - [`IngestPipeline`]: scan a data directory, extract, split and identify
//! - [`RagService`]: own the published index; build, load, reindex and query

pub mod pipeline;
pub mod service;

pub use pipeline::{IngestOutput, IngestPipeline};
pub use service::{RagService, ReindexReport, ServiceConfig, ServiceStatus};
