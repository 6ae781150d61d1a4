//! Knowledge 모듈 - 지식베이스 로드, 청킹, 인덱싱, 검색
//!
//! - Loader: 텍스트 파일 또는 PDF 폴더 → KnowledgeBase
//! - Chunker: 재귀 경계 인식 분할 (1000 / 200)
//! - Index: 청크 임베딩 → 인메모리 벡터 인덱스
//! - Retriever: 질의 임베딩 → 상위 k개 청크

mod chunker;
mod index;
mod loader;
mod retriever;
mod vector;

// Re-exports
pub use chunker::{
    default_chunker, locate_chunks, recursive_chunker, split_page, Chunk, ChunkConfig, Chunker,
    RecursiveChunker, DEFAULT_SEPARATORS,
};
pub use index::{build_index, chunk_documents, IndexError};
pub use loader::{
    load_pdf_directory, load_text_file, FileOutcome, FileReport, KnowledgeBase, LoadReport,
    SourceDocument, DOCUMENT_SEPARATOR, PAGE_SEPARATOR,
};
pub use retriever::Retriever;
pub use vector::{cosine_similarity, SearchResult, VectorEntry, VectorIndex, VectorIndexError};
