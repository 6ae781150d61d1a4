//! RAG Pipeline - 지식베이스 로드부터 답변까지
//!
//! 설정 단계(로드 → 빈 지식베이스 확인 → 인덱싱)는 한 번만 수행하고,
//! 이후 질문마다 [`Pipeline::ask`]로 답변을 생성합니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use thiserror::Error;

use crate::collector::FileCollector;
use crate::config::Settings;
use crate::embedding::{EmbeddingProvider, OpenAiEmbedding};
use crate::extractor::{PdfTextExtractor, TextExtractor};
use crate::knowledge::{
    build_index, load_pdf_directory, load_text_file, recursive_chunker, IndexError, LoadReport,
    Retriever,
};
use crate::llm::{ChatModel, OpenAiChat};

use super::generator::{join_chunks, AnswerGenerator, ConversationTurn};
use super::prompt::PromptTemplate;

// ============================================================================
// Configuration Types
// ============================================================================

/// 지식 원천
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeSource {
    /// 단일 텍스트 파일
    TextFile(PathBuf),
    /// PDF 폴더
    PdfDirectory(PathBuf),
}

impl KnowledgeSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::TextFile(path) | Self::PdfDirectory(path) => path,
        }
    }

    /// 전체 텍스트 모드에서 사용할 템플릿
    fn full_text_template(&self) -> PromptTemplate {
        match self {
            Self::TextFile(_) => PromptTemplate::KnowledgeText,
            Self::PdfDirectory(_) => PromptTemplate::PdfDocuments,
        }
    }

    /// 텍스트 파일을 문서로 취급할 때의 이름
    fn display_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

/// 컨텍스트 구성 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ContextMode {
    /// 지식베이스 전체 텍스트를 프롬프트에 포함
    FullText,
    /// 질문과 가까운 청크만 포함
    #[default]
    Retrieval,
}

impl std::fmt::Display for ContextMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullText => write!(f, "full-text"),
            Self::Retrieval => write!(f, "retrieval"),
        }
    }
}

/// 설정 단계 오류
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("No knowledge base loaded. Make sure your PDFs are in the '{}' folder.", .path.display())]
    EmptyKnowledgeBase { path: PathBuf },

    #[error("No knowledge base loaded. The knowledge file '{}' is empty.", .path.display())]
    EmptyKnowledgeFile { path: PathBuf },

    #[error(transparent)]
    Index(#[from] IndexError),
}

// ============================================================================
// Providers
// ============================================================================

/// 외부 의존성 묶음 (임베딩, 채팅, 추출기)
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub chat: Arc<dyn ChatModel>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl Providers {
    /// OpenAI 호환 API 구현체로 구성 (API 키 필수)
    pub fn openai(settings: &Settings) -> Result<Self> {
        Ok(Self {
            embedder: Arc::new(OpenAiEmbedding::from_settings(settings)?),
            chat: Arc::new(OpenAiChat::from_settings(settings)?),
            extractor: Arc::new(PdfTextExtractor),
        })
    }
}

// ============================================================================
// Pipeline
// ============================================================================

enum PipelineContext {
    FullText {
        text: String,
        template: PromptTemplate,
    },
    Retrieval(Retriever),
}

/// 설정이 끝난 질의응답 파이프라인
///
/// 생성 후 변경하지 않으므로 `Arc`로 공유해 동시에 질문할 수 있습니다.
pub struct Pipeline {
    source: KnowledgeSource,
    context: PipelineContext,
    generator: AnswerGenerator,
}

impl Pipeline {
    /// 지식베이스 로드 및 (검색 모드면) 인덱스 구성
    pub async fn setup(
        settings: &Settings,
        source: KnowledgeSource,
        mode: ContextMode,
        providers: &Providers,
    ) -> Result<(Self, LoadReport)> {
        tracing::info!("Setting up pipeline: {:?} ({} mode)", source, mode);

        let (knowledge, report) = match &source {
            KnowledgeSource::TextFile(path) => (load_text_file(path).await?, LoadReport::default()),
            KnowledgeSource::PdfDirectory(dir) => {
                load_pdf_directory(dir, &FileCollector::with_defaults(), providers.extractor.as_ref())
                    .await?
            }
        };

        if knowledge.is_empty() {
            let path = source.path().to_path_buf();
            return Err(match source {
                KnowledgeSource::TextFile(_) => SetupError::EmptyKnowledgeFile { path },
                KnowledgeSource::PdfDirectory(_) => SetupError::EmptyKnowledgeBase { path },
            }
            .into());
        }

        let context = match mode {
            ContextMode::FullText => {
                let text = knowledge.full_text();
                tracing::info!(
                    "Using full knowledge text as context ({} chars)",
                    text.chars().count()
                );
                PipelineContext::FullText {
                    text,
                    template: source.full_text_template(),
                }
            }
            ContextMode::Retrieval => {
                let chunker = recursive_chunker(settings.chunk);
                let documents = knowledge.documents(&source.display_name());
                let index = build_index(&documents, chunker.as_ref(), providers.embedder.as_ref())
                    .await
                    .map_err(SetupError::from)?;
                PipelineContext::Retrieval(Retriever::new(
                    index,
                    providers.embedder.clone(),
                    settings.top_k,
                ))
            }
        };

        let pipeline = Self {
            source,
            context,
            generator: AnswerGenerator::new(providers.chat.clone()),
        };
        Ok((pipeline, report))
    }

    /// 질문 하나에 답변
    pub async fn ask(&self, question: &str) -> Result<ConversationTurn> {
        match &self.context {
            PipelineContext::FullText { text, template } => {
                self.generator.answer(question, text, *template).await
            }
            PipelineContext::Retrieval(retriever) => {
                let results = retriever.retrieve(question).await?;
                let context = join_chunks(&results);
                self.generator
                    .answer(question, &context, PromptTemplate::RetrievedContext)
                    .await
            }
        }
    }

    pub fn source(&self) -> &KnowledgeSource {
        &self.source
    }

    pub fn mode(&self) -> ContextMode {
        match self.context {
            PipelineContext::FullText { .. } => ContextMode::FullText,
            PipelineContext::Retrieval(_) => ContextMode::Retrieval,
        }
    }

    /// 인덱스된 청크 수 (전체 텍스트 모드는 0)
    pub fn chunk_count(&self) -> usize {
        match &self.context {
            PipelineContext::FullText { .. } => 0,
            PipelineContext::Retrieval(retriever) => retriever.len(),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source)
            .field("mode", &self.mode())
            .field("chunks", &self.chunk_count())
            .field("model", &self.generator.model())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
