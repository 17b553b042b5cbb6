//! Image extractor.
//!
//! Each image is read by a vision model twice: an OCR pass and a description
//! pass. The two outcomes are kept as [`Extraction`] values and rendered into
//! one text document, so a failed call shows up as a sentinel instead of
//! aborting the batch.

use async_trait::async_trait;
use docrag_core::{
    Document, DocumentKind, DocumentMetadata, ExtractError, Extraction, Extractor,
    ERROR_EXTRACTING_TEXT, ERROR_GENERATING_DESCRIPTION, NO_TEXT_FOUND,
};
use image::GenericImageView;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::vision::VisionModel;

/// Instruction for the OCR pass.
pub const OCR_PROMPT: &str = "Extract ALL text visible in this image using OCR. \
Return only the extracted text, nothing else. \
If no text is found, return 'NO_TEXT_FOUND'.";

/// Instruction for the description pass.
pub const DESCRIPTION_PROMPT: &str = "Describe this image in detail:
1. What type of document/image is this? (e.g., invoice, receipt, diagram, photo, chart, etc.)
2. What is it used for or what is its purpose?
3. Describe the visual layout and key elements.
Keep the description concise but informative.";

/// Extractor for PNG and JPEG images.
pub struct ImageExtractor {
    vision: Arc<dyn VisionModel>,
}

impl ImageExtractor {
    pub fn new(vision: Arc<dyn VisionModel>) -> Self {
        Self { vision }
    }

    async fn ask(&self, image: &[u8], instruction: &str, pass: &str, path: &Path) -> Extraction {
        let outcome = Extraction::from_result(self.vision.describe(image, instruction).await);
        if let Extraction::Failed(reason) = &outcome {
            warn!("Vision {} failed for {:?}: {}", pass, path, reason);
        }
        outcome
    }
}

#[async_trait]
impl Extractor for ImageExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Image
    }

    async fn extract(&self, path: &Path, source: &str) -> Result<Document, ExtractError> {
        debug!("Extracting image: {:?}", path);

        let bytes = tokio::fs::read(path).await?;

        let ocr = self.ask(&bytes, OCR_PROMPT, "OCR", path).await;
        let description = self.ask(&bytes, DESCRIPTION_PROMPT, "description", path).await;

        let dimensions = match tokio::task::spawn_blocking(move || decode_dimensions(&bytes)).await
        {
            Ok(Ok(dimensions)) => Some(dimensions),
            Ok(Err(e)) => {
                debug!("Could not decode {:?} for dimensions: {}", path, e);
                None
            }
            Err(e) => {
                debug!("Dimension task failed for {:?}: {}", path, e);
                None
            }
        };

        let reading = ImageReading {
            file_name: file_name(path),
            format: image_format(path),
            ocr,
            description,
            dimensions,
        };
        Ok(reading.into_document(source))
    }
}

/// Everything learned about one image, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReading {
    pub file_name: String,
    pub format: String,
    pub ocr: Extraction,
    pub description: Extraction,
    /// Width and height, when the file decodes
    pub dimensions: Option<(u32, u32)>,
}

impl ImageReading {
    /// OCR text as it appears in the document, with failures as sentinels.
    #[must_use]
    pub fn ocr_text(&self) -> &str {
        match &self.ocr {
            Extraction::Extracted(text) => text,
            Extraction::Failed(_) => ERROR_EXTRACTING_TEXT,
        }
    }

    #[must_use]
    pub fn description_text(&self) -> &str {
        match &self.description {
            Extraction::Extracted(text) => text,
            Extraction::Failed(_) => ERROR_GENERATING_DESCRIPTION,
        }
    }

    /// Whether OCR produced text worth indexing.
    #[must_use]
    pub fn has_ocr(&self) -> bool {
        let text = self.ocr_text();
        !text.is_empty() && text != NO_TEXT_FOUND && text != ERROR_EXTRACTING_TEXT
    }

    /// Render header, description and (when present) OCR sections.
    #[must_use]
    pub fn into_document(self, source: &str) -> Document {
        let mut lines = vec![
            format!("[Image: {}]", self.file_name),
            format!("[Format: {}]", self.format),
            String::new(),
            "=== Description ===".to_string(),
            self.description_text().to_string(),
            String::new(),
        ];
        if self.has_ocr() {
            lines.push("=== OCR Content ===".to_string());
            lines.push(self.ocr_text().to_string());
        }

        let mut metadata = DocumentMetadata::new(source, DocumentKind::Image, self.format.clone());
        metadata.has_ocr = Some(self.has_ocr());
        if let Some((width, height)) = self.dimensions {
            metadata.extra.insert("width".to_string(), width.to_string());
            metadata.extra.insert("height".to_string(), height.to_string());
        }

        Document::new(lines.join("\n"), metadata)
    }
}

/// Upper-cased extension, with `jpg` reported as `JPEG`.
#[must_use]
pub fn image_format(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_uppercase();
    if ext == "JPG" {
        "JPEG".to_string()
    } else {
        ext
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("Failed to load image: {e}"))?;
    Ok(img.dimensions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::GenerateError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Vision model with canned answers per pass; `None` fails the call.
    struct MockVision {
        ocr: Option<&'static str>,
        description: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl MockVision {
        fn new(ocr: Option<&'static str>, description: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                ocr,
                description,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl VisionModel for MockVision {
        fn model_name(&self) -> &str {
            "mock-vision"
        }

        async fn describe(&self, _image: &[u8], instruction: &str) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = if instruction == OCR_PROMPT {
                self.ocr
            } else {
                self.description
            };
            answer
                .map(str::to_string)
                .ok_or_else(|| GenerateError::Unreachable("connection refused".to_string()))
        }
    }

    /// Create a simple 3x2 PNG image for testing
    fn create_test_png() -> Vec<u8> {
        use image::{ImageBuffer, Rgba};

        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(3, 2, |_, _| Rgba([255, 255, 255, 255]));

        let mut bytes: Vec<u8> = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut bytes);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        bytes
    }

    fn reading(ocr: Extraction, description: Extraction) -> ImageReading {
        ImageReading {
            file_name: "invoice.png".to_string(),
            format: "PNG".to_string(),
            ocr,
            description,
            dimensions: None,
        }
    }

    // ==================== Format Tests ====================

    #[test]
    fn test_image_format() {
        assert_eq!(image_format(&PathBuf::from("a.jpg")), "JPEG");
        assert_eq!(image_format(&PathBuf::from("a.JPG")), "JPEG");
        assert_eq!(image_format(&PathBuf::from("a.jpeg")), "JPEG");
        assert_eq!(image_format(&PathBuf::from("a.png")), "PNG");
    }

    // ==================== Rendering Tests ====================

    #[test]
    fn test_render_with_ocr() {
        let document = reading(
            Extraction::Extracted("INVOICE #123".to_string()),
            Extraction::Extracted("An invoice.".to_string()),
        )
        .into_document("invoice.png");

        assert_eq!(
            document.content,
            "[Image: invoice.png]\n[Format: PNG]\n\n=== Description ===\nAn invoice.\n\n=== OCR Content ===\nINVOICE #123"
        );
        assert_eq!(document.metadata.kind, DocumentKind::Image);
        assert_eq!(document.metadata.format, "PNG");
        assert_eq!(document.metadata.has_ocr, Some(true));
        assert_eq!(document.source(), "invoice.png");
    }

    #[test]
    fn test_render_no_text_found_omits_ocr_section() {
        let document = reading(
            Extraction::Extracted(NO_TEXT_FOUND.to_string()),
            Extraction::Extracted("A photo of a cat.".to_string()),
        )
        .into_document("cat.png");

        assert!(!document.content.contains("=== OCR Content ==="));
        assert!(!document.content.contains(NO_TEXT_FOUND));
        assert!(document.content.contains("A photo of a cat."));
        assert_eq!(document.metadata.has_ocr, Some(false));
    }

    #[test]
    fn test_render_empty_ocr_omits_section() {
        let document = reading(
            Extraction::Extracted(String::new()),
            Extraction::Extracted("Blank page.".to_string()),
        )
        .into_document("blank.png");

        assert!(!document.content.contains("=== OCR Content ==="));
        assert_eq!(document.metadata.has_ocr, Some(false));
    }

    #[test]
    fn test_render_failed_ocr_keeps_description() {
        let document = reading(
            Extraction::Failed("timeout".to_string()),
            Extraction::Extracted("A receipt.".to_string()),
        )
        .into_document("receipt.png");

        assert!(document.content.contains("A receipt."));
        assert!(!document.content.contains(ERROR_EXTRACTING_TEXT));
        assert_eq!(document.metadata.has_ocr, Some(false));
    }

    #[test]
    fn test_render_failed_description_uses_sentinel() {
        let document = reading(
            Extraction::Extracted("TOTAL 42".to_string()),
            Extraction::Failed("model error".to_string()),
        )
        .into_document("scan.png");

        assert!(document
            .content
            .contains(&format!("=== Description ===\n{ERROR_GENERATING_DESCRIPTION}")));
        assert!(document.content.contains("TOTAL 42"));
        assert_eq!(document.metadata.has_ocr, Some(true));
    }

    #[test]
    fn test_render_records_dimensions() {
        let mut image = reading(
            Extraction::Extracted(String::new()),
            Extraction::Extracted("x".to_string()),
        );
        image.dimensions = Some((640, 480));

        let document = image.into_document("x.png");
        assert_eq!(document.metadata.extra.get("width").map(String::as_str), Some("640"));
        assert_eq!(document.metadata.extra.get("height").map(String::as_str), Some("480"));
    }

    // ==================== Extraction Tests ====================

    #[tokio::test]
    async fn test_extract_png_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invoice.png");
        tokio::fs::write(&path, create_test_png()).await.unwrap();

        let vision = MockVision::new(Some("  INVOICE #123\n"), Some("An invoice."));
        let extractor = ImageExtractor::new(vision.clone());

        let document = extractor.extract(&path, "invoice.png").await.unwrap();

        assert_eq!(vision.calls.load(Ordering::SeqCst), 2);
        assert!(document.content.contains("=== OCR Content ===\nINVOICE #123"));
        assert_eq!(document.metadata.has_ocr, Some(true));
        assert_eq!(document.metadata.extra.get("width").map(String::as_str), Some("3"));
        assert_eq!(document.metadata.extra.get("height").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_extract_survives_vision_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        tokio::fs::write(&path, b"not really a jpeg").await.unwrap();

        let extractor = ImageExtractor::new(MockVision::new(None, None));
        let document = extractor.extract(&path, "scan.jpg").await.unwrap();

        assert_eq!(document.metadata.format, "JPEG");
        assert_eq!(document.metadata.has_ocr, Some(false));
        assert!(document.content.contains(ERROR_GENERATING_DESCRIPTION));
        assert!(document.metadata.extra.is_empty());
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let extractor = ImageExtractor::new(MockVision::new(Some("x"), Some("y")));
        let result = extractor
            .extract(Path::new("/nonexistent/file.png"), "file.png")
            .await;
        assert!(matches!(result, Err(ExtractError::Io(_))));
    }
}
