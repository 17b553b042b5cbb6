//! Content extraction for docrag.
//!
//! [`scan_corpus`] lists the recognized files of a data directory;
//! [`ExtractorRegistry`] routes each one to the [`TextExtractor`] or
//! [`ImageExtractor`] and collects the results into an [`ExtractionReport`].

pub mod image;
pub mod registry;
pub mod scan;
pub mod text;
pub mod vision;

pub use self::image::{ImageExtractor, ImageReading, DESCRIPTION_PROMPT, OCR_PROMPT};
pub use registry::{ExtractionFailure, ExtractionReport, ExtractorRegistry};
pub use scan::{scan_corpus, SourceFile};
pub use text::TextExtractor;
pub use vision::{OllamaVision, VisionModel, DEFAULT_VISION_MODEL};
