pub mod pdftotext;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::ToolDiag;

/// Upstream collaborator that renders a PDF as plain text with page-break
/// markers. Any failure here is fatal for the document.
pub trait TextExtractor {
    fn doctor(&self) -> Result<ToolDiag>;
    fn extract_text(&self, input: &Path) -> Result<String>;
}
