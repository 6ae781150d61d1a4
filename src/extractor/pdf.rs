//! PDF 텍스트 추출
//!
//! pdf-extract 크레이트로 페이지별 텍스트를 얻습니다.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

/// "--- Page N ---", "=== N ===" 형태의 페이지 구분 줄
const PAGE_MARKER_PATTERN: &str = r"(?m)^\s*[-=]+\s*(?:Page\s*)?\d+\s*[-=]+\s*$";

/// 페이지 구분 줄 정규식 (최초 사용 시 한 번 컴파일)
fn page_marker() -> Option<&'static Regex> {
    static PAGE_MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    PAGE_MARKER
        .get_or_init(|| match Regex::new(PAGE_MARKER_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Invalid page marker pattern: {}", e);
                None
            }
        })
        .as_ref()
}

/// PDF에서 페이지별 텍스트 추출
///
/// 스캔 문서처럼 텍스트가 없으면 빈 페이지 하나를 반환합니다.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;
    extract_pages_from_mem(&bytes).with_context(|| format!("Failed to extract text from PDF: {:?}", path))
}

/// 메모리의 PDF 바이트에서 페이지별 텍스트 추출
pub fn extract_pages_from_mem(bytes: &[u8]) -> Result<Vec<String>> {
    let text = pdf_extract::extract_text_from_mem(bytes)?;

    if text.trim().is_empty() {
        tracing::warn!("No text extracted from PDF. It might be a scanned document.");
        return Ok(vec![String::new()]);
    }

    Ok(split_pdf_pages(&text))
}

/// PDF 텍스트를 페이지별로 분리
///
/// pdf-extract는 페이지 사이에 폼피드(`\x0c`)를 넣습니다.
/// 폼피드가 없으면 "--- Page N ---" 같은 구분 줄을 찾고, 그마저 없으면 전체가 한 페이지입니다.
fn split_pdf_pages(text: &str) -> Vec<String> {
    let pages: Vec<String> = text
        .split('\x0c')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if pages.len() > 1 {
        return pages;
    }

    if let Some(page_pattern) = page_marker() {
        let pages: Vec<String> = page_pattern
            .split(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if pages.len() > 1 {
            return pages;
        }
    }

    vec![text.trim().to_string()]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::knowledge::SourceDocument;

    #[test]
    fn test_split_pdf_pages_with_formfeed() {
        let text = "Page 1 content\x0cPage 2 content\x0cPage 3 content";
        let pages = split_pdf_pages(text);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], "Page 1 content");
        assert_eq!(pages[1], "Page 2 content");
    }

    #[test]
    fn test_split_pdf_pages_with_markers() {
        let text = "Intro text\n--- Page 2 ---\nSecond page\n=== 3 ===\nThird page";
        let pages = split_pdf_pages(text);
        assert_eq!(pages, vec!["Intro text", "Second page", "Third page"]);
    }

    #[test]
    fn test_split_pdf_pages_no_separator() {
        let text = "  Just some text without page breaks\n";
        let pages = split_pdf_pages(text);
        assert_eq!(pages, vec!["Just some text without page breaks"]);
    }

    #[test]
    fn test_page_marker_compiled_once() {
        let first = page_marker().unwrap();
        let second = page_marker().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(first.is_match("--- Page 12 ---"));
    }

    #[test]
    fn test_pages_stay_separate_in_document_text() {
        let text = "The review ends with approval.\n\x0cThe sponsor then markets the drug.\n";
        let document = SourceDocument {
            name: "guidance.pdf".to_string(),
            path: PathBuf::from("guidance.pdf"),
            pages: split_pdf_pages(text),
        };

        assert_eq!(document.pages.len(), 2);
        assert_eq!(
            document.text(),
            "The review ends with approval.\nThe sponsor then markets the drug."
        );
    }

    #[test]
    fn test_extract_garbage_bytes_fails() {
        assert!(extract_pages_from_mem(b"this is not a pdf").is_err());
    }

    #[test]
    fn test_extract_missing_file_fails() {
        let err = extract_pages(Path::new("/nonexistent/guidance.pdf")).unwrap_err();
        assert!(err.to_string().contains("Failed to read PDF"));
    }
}
