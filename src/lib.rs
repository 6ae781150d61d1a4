//! fda-rag - FDA 의약품 승인 절차 질의응답 시스템
//!
//! FDA 규제 문서(텍스트 파일 또는 PDF 폴더)를 지식베이스로 삼아
//! OpenAI 호환 API로 질문에 답하는 RAG 파이프라인입니다.
//! 전체 텍스트 모드와 벡터 검색 모드를 지원하며, CLI와 웹 폼으로 사용할 수 있습니다.

pub mod cli;
pub mod collector;
pub mod config;
pub mod embedding;
pub mod extractor;
pub mod knowledge;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod web;

// Re-exports
pub use config::{ConfigError, Settings};
pub use embedding::{EmbeddingProvider, OpenAiEmbedding};
pub use extractor::{PdfTextExtractor, TextExtractor};
pub use knowledge::{
    build_index, default_chunker, load_pdf_directory, load_text_file, Chunk, ChunkConfig,
    Chunker, IndexError, KnowledgeBase, LoadReport, Retriever, SearchResult, VectorIndex,
};
pub use llm::{ChatMessage, ChatModel, OpenAiChat};
pub use openai::{ApiError, OpenAiClient};
pub use rag::{
    ContextMode, ConversationTurn, KnowledgeSource, Pipeline, PromptTemplate, Providers,
    SetupCache, SetupError,
};
