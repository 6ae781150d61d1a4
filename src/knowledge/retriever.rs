//! Retriever - 질의와 가장 가까운 청크 검색
//!
//! 질의를 임베딩한 뒤 벡터 인덱스에서 상위 k개를 가져옵니다. 재순위화는 없습니다.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingProvider;

use super::vector::{SearchResult, VectorIndex};

/// 벡터 검색기
pub struct Retriever {
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    /// 인덱스와 임베더로 생성
    pub fn new(index: VectorIndex, embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    /// 질의와 가장 유사한 청크 `top_k`개
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let results = self.index.search(&query_embedding, self.top_k);
        tracing::debug!(
            "Retrieved {} chunks (top_k={}) for query {:?}",
            results.len(),
            self.top_k,
            query
        );
        Ok(results)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// 인덱스된 청크 수
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("vectors", &self.index.len())
            .field("embedder", &self.embedder.name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::knowledge::chunker::RecursiveChunker;
    use crate::knowledge::index::build_index;
    use crate::knowledge::loader::SourceDocument;
    use crate::knowledge::tests::KeywordEmbedder;

    #[tokio::test]
    async fn test_retrieve_top_k() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let docs: Vec<SourceDocument> = [
            ("ind.pdf", "An IND application is needed before clinical trials."),
            ("nda.pdf", "The NDA review decides approval."),
            ("other.pdf", "Cafeteria opening hours."),
        ]
        .iter()
        .map(|(name, text)| SourceDocument {
            name: name.to_string(),
            path: PathBuf::from(name),
            pages: vec![text.to_string()],
        })
        .collect();

        let index = build_index(&docs, &RecursiveChunker::with_defaults(), embedder.as_ref())
            .await
            .unwrap();
        let retriever = Retriever::new(index, embedder.clone(), 1);

        let results = retriever.retrieve("When is an IND required?").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source, "ind.pdf");
        assert_eq!(retriever.len(), 3);
        assert_eq!(retriever.top_k(), 1);
    }
}
