use std::path::Path;

use lopdf::Document;

use crate::error::PaperfetchError;

/// Extract plain text per page, in page order. A page whose text cannot be
/// decoded contributes an empty string; one bad page does not sink the
/// document.
pub fn extract_pages(path: &Path) -> Result<Vec<String>, PaperfetchError> {
    let doc = Document::load(path)
        .map_err(|err| PaperfetchError::PdfRead(format!("{}: {err}", path.display())))?;

    let mut pages = Vec::new();
    for (page_number, _) in doc.get_pages() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => pages.push(text),
            Err(err) => {
                tracing::warn!("text extraction failed on page {page_number}: {err}");
                pages.push(String::new());
            }
        }
    }
    tracing::debug!("extracted {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// Cheap extension check used by the CLI before any parsing happens.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_check() {
        assert!(is_pdf_path(Path::new("paper.pdf")));
        assert!(is_pdf_path(Path::new("paper.PDF")));
        assert!(!is_pdf_path(Path::new("paper.txt")));
        assert!(!is_pdf_path(Path::new("paper")));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = extract_pages(Path::new("definitely-missing.pdf")).unwrap_err();
        assert!(matches!(err, PaperfetchError::PdfRead(_)));
    }
}
