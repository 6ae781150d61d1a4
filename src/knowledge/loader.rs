//! Knowledge Loader - 지식베이스 로드
//!
//! 단일 텍스트 파일 또는 PDF 폴더에서 지식베이스를 만듭니다.
//! PDF 폴더는 파일별 결과를 모아 [`LoadReport`]로 돌려주며,
//! 한 파일의 추출 실패가 전체 로드를 중단시키지 않습니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::collector::FileCollector;
use crate::extractor::TextExtractor;

/// 문서 사이 구분자
pub const DOCUMENT_SEPARATOR: &str = "\n\n";
/// 페이지 사이 구분자
pub const PAGE_SEPARATOR: &str = "\n";

// ============================================================================
// Knowledge Base
// ============================================================================

/// 원본 문서 (PDF 한 개)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// 파일 이름
    pub name: String,
    /// 파일 경로
    pub path: PathBuf,
    /// 페이지별 텍스트
    pub pages: Vec<String>,
}

impl SourceDocument {
    /// 모든 페이지를 줄바꿈으로 이어붙인 텍스트
    ///
    /// 페이지 경계에서 앞 페이지의 마지막 단어와 다음 페이지의 첫 단어가 붙지 않습니다.
    pub fn text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }

    /// 문자 수
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.chars().count()).sum()
    }
}

/// 지식베이스
///
/// 프로세스 시작 시 한 번 만들고 이후 변경하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeBase {
    /// 단일 텍스트 파일 내용
    Text(String),
    /// PDF 문서 목록
    Documents(Vec<SourceDocument>),
}

impl KnowledgeBase {
    /// 전체 텍스트
    ///
    /// 문서 목록은 각 문서 뒤에 빈 줄 구분자를 붙여 이어붙입니다.
    pub fn full_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Documents(docs) => docs.iter().fold(String::new(), |mut acc, doc| {
                acc.push_str(&doc.text());
                acc.push_str(DOCUMENT_SEPARATOR);
                acc
            }),
        }
    }

    /// 로드된 내용이 없는지
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Documents(docs) => docs.is_empty(),
        }
    }

    /// 문서 수 (텍스트 파일은 1)
    pub fn document_count(&self) -> usize {
        match self {
            Self::Text(text) if text.is_empty() => 0,
            Self::Text(_) => 1,
            Self::Documents(docs) => docs.len(),
        }
    }

    /// 인덱싱용 문서 목록
    ///
    /// 텍스트 파일은 페이지 하나짜리 문서로 취급합니다.
    pub fn documents(&self, text_source_name: &str) -> Vec<SourceDocument> {
        match self {
            Self::Text(text) if text.is_empty() => vec![],
            Self::Text(text) => vec![SourceDocument {
                name: text_source_name.to_string(),
                path: PathBuf::from(text_source_name),
                pages: vec![text.clone()],
            }],
            Self::Documents(docs) => docs.clone(),
        }
    }
}

// ============================================================================
// Load Report
// ============================================================================

/// 파일별 로드 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// 추출 성공
    Loaded { pages: usize, chars: usize },
    /// 추출 실패 (건너뜀)
    Failed { error: String },
}

/// 파일 하나의 로드 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
}

/// 배치 로드 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files: Vec<FileReport>,
}

impl LoadReport {
    /// 성공한 파일 수
    pub fn loaded_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Loaded { .. }))
            .count()
    }

    /// 실패한 파일 목록
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Failed { error } => Some((f.file_name.as_str(), error.as_str())),
            FileOutcome::Loaded { .. } => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }
}

// ============================================================================
// Loaders
// ============================================================================

/// 단일 텍스트 파일 로드
///
/// 파일이 없으면 에러입니다.
pub async fn load_text_file(path: &Path) -> Result<KnowledgeBase> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read knowledge file: {:?}", path))?;

    tracing::info!("Loaded knowledge file {:?} ({} bytes)", path, text.len());
    Ok(KnowledgeBase::Text(text))
}

/// PDF 폴더 로드
///
/// 폴더의 PDF를 파일 이름 순으로 추출합니다. 파일별 실패는 경고 로그를 남기고 건너뜁니다.
/// PDF가 없으면 빈 지식베이스를 반환하며, 빈 지식베이스 처리는 호출자 책임입니다.
pub async fn load_pdf_directory(
    dir: &Path,
    collector: &FileCollector,
    extractor: &dyn TextExtractor,
) -> Result<(KnowledgeBase, LoadReport)> {
    let files = collector
        .collect_pdfs(dir)
        .with_context(|| format!("Failed to list PDF directory: {:?}", dir))?;

    let mut documents = Vec::with_capacity(files.len());
    let mut report = LoadReport::default();

    for file in files {
        match extractor.extract_pages(&file.path).await {
            Ok(pages) => {
                let document = SourceDocument {
                    name: file.file_name.clone(),
                    path: file.path,
                    pages,
                };
                let outcome = FileOutcome::Loaded {
                    pages: document.pages.len(),
                    chars: document.char_count(),
                };
                tracing::info!("Successfully read {}", document.name);
                documents.push(document);
                report.files.push(FileReport {
                    file_name: file.file_name,
                    outcome,
                });
            }
            Err(e) => {
                tracing::warn!("Error reading {}: {:#}", file.file_name, e);
                report.files.push(FileReport {
                    file_name: file.file_name,
                    outcome: FileOutcome::Failed {
                        error: format!("{:#}", e),
                    },
                });
            }
        }
    }

    tracing::info!(
        "Loaded {} of {} PDF files from {:?}",
        report.loaded_count(),
        report.files.len(),
        dir
    );

    Ok((KnowledgeBase::Documents(documents), report))
}

// ============================================================================
// Tests
// ============================================================================
