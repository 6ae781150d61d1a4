//! Indexer - 청킹 + 임베딩 + 벡터 인덱스 구성
//!
//! 문서마다 페이지 단위로 청킹하고, 모든 청크를 임베딩 서비스에 보낸 뒤
//! 인메모리 [`VectorIndex`]를 만듭니다. 프로세스당 한 번 수행되는 비싼 작업입니다.

use anyhow::Context;
use thiserror::Error;

use crate::embedding::EmbeddingProvider;

use super::chunker::{split_page, Chunk, Chunker};
use super::loader::SourceDocument;
use super::vector::{VectorEntry, VectorIndex, VectorIndexError};

/// 인덱싱 오류
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no text chunks were produced from {documents} document(s)")]
    NoChunks { documents: usize },

    #[error("embedding provider returned {actual} vectors for {expected} chunks")]
    CountMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Vector(#[from] VectorIndexError),

    #[error("failed to embed chunks: {0:#}")]
    Embedding(anyhow::Error),
}

/// 문서 목록을 청크로 분할
///
/// 텍스트 파일처럼 페이지가 하나인 문서는 페이지 번호를 붙이지 않습니다.
pub fn chunk_documents(documents: &[SourceDocument], chunker: &dyn Chunker) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| {
            let numbered = doc.pages.len() > 1;
            doc.pages.iter().enumerate().flat_map(move |(i, page)| {
                let page_number = numbered.then_some(i + 1);
                split_page(chunker, &doc.name, page_number, page)
            })
        })
        .collect()
}

/// 벡터 인덱스 구성
pub async fn build_index(
    documents: &[SourceDocument],
    chunker: &dyn Chunker,
    embedder: &dyn EmbeddingProvider,
) -> Result<VectorIndex, IndexError> {
    let chunks = chunk_documents(documents, chunker);
    if chunks.is_empty() {
        return Err(IndexError::NoChunks {
            documents: documents.len(),
        });
    }

    tracing::info!(
        "Split {} document(s) into {} chunks ({})",
        documents.len(),
        chunks.len(),
        chunker.name()
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder
        .embed_batch(&texts)
        .await
        .with_context(|| format!("embedding provider: {}", embedder.name()))
        .map_err(IndexError::Embedding)?;

    if embeddings.len() != chunks.len() {
        return Err(IndexError::CountMismatch {
            expected: chunks.len(),
            actual: embeddings.len(),
        });
    }

    let entries = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| VectorEntry { chunk, embedding })
        .collect();

    let index = VectorIndex::from_entries(entries)?;
    tracing::info!(
        "Built vector index: {} vectors, dimension {}",
        index.len(),
        index.dimension()
    );

    Ok(index)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::knowledge::chunker::{ChunkConfig, RecursiveChunker};
    use crate::knowledge::tests::KeywordEmbedder;

    fn doc(name: &str, pages: &[&str]) -> SourceDocument {
        SourceDocument {
            name: name.to_string(),
            path: PathBuf::from(name),
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_chunk_documents_metadata() {
        let chunker = RecursiveChunker::new(ChunkConfig {
            chunk_size: 20,
            chunk_overlap: 0,
        });
        let docs = vec![
            doc("multi.pdf", &["first page text", "second page text"]),
            doc("single.pdf", &["only page"]),
        ];

        let chunks = chunk_documents(&docs, &chunker);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].source, "multi.pdf");
        assert_eq!(chunks[0].page, Some(1));
        assert_eq!(chunks[1].page, Some(2));
        assert_eq!(chunks[2].source, "single.pdf");
        assert_eq!(chunks[2].page, None);
    }

    #[tokio::test]
    async fn test_build_index_embeds_once() {
        let embedder = KeywordEmbedder::default();
        let chunker = RecursiveChunker::with_defaults();
        let docs = vec![doc("a.pdf", &["The IND covers clinical trials."]), doc("b.pdf", &["NDA review."])];

        let index = build_index(&docs, &chunker, &embedder).await.unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(embedder.embedded_texts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_build_index_no_chunks() {
        let embedder = KeywordEmbedder::default();
        let chunker = RecursiveChunker::with_defaults();
        let docs = vec![doc("scan.pdf", &[""])];

        let err = build_index(&docs, &chunker, &embedder).await.unwrap_err();

        assert!(matches!(err, IndexError::NoChunks { documents: 1 }));
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 0);
    }
}
