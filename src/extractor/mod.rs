//! 콘텐츠 추출 모듈
//!
//! 파일에서 페이지별 텍스트를 추출합니다.
//! - PDF 파일: pdf-extract로 텍스트 추출

pub mod pdf;

use std::path::Path;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

// ============================================================================
// TextExtractor Trait
// ============================================================================

/// 페이지별 텍스트 추출기 트레이트
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 파일에서 페이지별 텍스트 추출
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

// ============================================================================
// PdfTextExtractor
// ============================================================================

/// PDF 텍스트 추출기
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
        // 파서 패닉은 JoinError로 잡혀 해당 파일만 실패 처리됨
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || pdf::extract_pages(&path))
            .await
            .map_err(|e| anyhow!("PDF extraction task failed: {}", e))?
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pdf_extractor_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\nthis file was truncated").unwrap();

        let result = PdfTextExtractor.extract_pages(&path).await;
        assert!(result.is_err());
    }
}
