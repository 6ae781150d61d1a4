//! 파일 수집 모듈
//!
//! 지식베이스 폴더에서 PDF 파일을 찾습니다.
//! 기본적으로 폴더 바로 아래의 파일만 보고, 결과는 파일 이름 순으로 정렬합니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

// ============================================================================
// Collected File
// ============================================================================

/// 수집된 PDF 파일 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// 파일 경로
    pub path: PathBuf,
    /// 파일 이름
    pub file_name: String,
    /// 파일 크기 (바이트)
    pub size: u64,
}

/// PDF 확장자 여부 (대소문자 무시)
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

// ============================================================================
// File Collector
// ============================================================================

/// 파일 수집기 설정 (기본값: 폴더 바로 아래만)
///
/// 숨김 파일은 항상 제외하고 .gitignore는 보지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    /// 하위 폴더까지 탐색
    pub recursive: bool,
}

/// PDF 파일 수집기
#[derive(Debug, Clone, Default)]
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    /// 새 수집기 생성
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 수집기 생성
    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// 폴더에서 PDF 파일 수집
    ///
    /// 폴더가 없거나 폴더가 아니면 에러입니다. PDF가 없으면 빈 목록입니다.
    pub fn collect_pdfs(&self, dir: &Path) -> Result<Vec<CollectedFile>> {
        if !dir.exists() {
            anyhow::bail!("Directory not found: {:?}", dir);
        }

        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {:?}", dir);
        }

        let mut builder = WalkBuilder::new(dir);
        builder
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false);
        if !self.config.recursive {
            builder.max_depth(Some(1));
        }

        let mut files = Vec::new();

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            // 파일만 처리
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            if !is_pdf(path) {
                continue;
            }

            let size = entry
                .metadata()
                .with_context(|| format!("Failed to read metadata: {:?}", path))
                .map(|m| m.len())
                .unwrap_or_else(|e| {
                    tracing::debug!("{:#}", e);
                    0
                });

            files.push(CollectedFile {
                path: path.to_path_buf(),
                file_name: entry.file_name().to_string_lossy().into_owned(),
                size,
            });
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        tracing::info!("Collected {} PDF files from {:?}", files.len(), dir);
        Ok(files)
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// 수집 통계
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total_files: usize,
    pub total_size: u64,
}

impl CollectionStats {
    /// 수집된 파일 목록에서 통계 계산
    pub fn from_files(files: &[CollectedFile]) -> Self {
        files.iter().fold(Self::default(), |mut stats, file| {
            stats.total_files += 1;
            stats.total_size += file.size;
            stats
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("guidance.pdf")));
        assert!(is_pdf(Path::new("GUIDANCE.PDF")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_collect_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"bb").unwrap();
        std::fs::write(dir.path().join("a.PDF"), b"a").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.pdf"), b"c").unwrap();

        let files = FileCollector::with_defaults().collect_pdfs(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);

        let stats = CollectionStats::from_files(&files);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 3);
    }

    #[test]
    fn test_collect_pdfs_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.pdf"), b"c").unwrap();

        let collector = FileCollector::new(CollectorConfig { recursive: true });
        assert_eq!(collector.collect_pdfs(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_collect_pdfs_skips_hidden_and_ignores_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".draft.pdf"), b"h").unwrap();
        std::fs::write(dir.path().join("listed.pdf"), b"l").unwrap();
        std::fs::write(dir.path().join(".gitignore"), "listed.pdf\n").unwrap();

        let files = FileCollector::with_defaults().collect_pdfs(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["listed.pdf"]);
    }

    #[test]
    fn test_collect_pdfs_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileCollector::with_defaults().collect_pdfs(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_collect_pdfs_missing_dir() {
        let result = FileCollector::with_defaults().collect_pdfs(Path::new("/nonexistent/data_pdfs"));
        assert!(result.is_err());
    }
}
