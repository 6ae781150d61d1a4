//! Vector Index - 인메모리 유사도 검색
//!
//! (청크, 임베딩) 쌍을 메모리에 보관하고 코사인 유사도로 전체 스캔합니다.
//! 생성 후에는 변경하지 않습니다.

use thiserror::Error;

use super::chunker::Chunk;

// ============================================================================
// Types
// ============================================================================

/// 벡터 엔트리 (인덱스 구성용)
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// 원본 청크
    pub chunk: Chunk,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 검색 결과
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// 청크
    pub chunk: Chunk,
    /// 유사도 스코어 (-1.0 ~ 1.0)
    pub similarity: f32,
}

/// 인덱스 구성 오류
#[derive(Debug, Error, PartialEq)]
pub enum VectorIndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual} (chunk {index})")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        index: usize,
    },
}

// ============================================================================
// VectorIndex
// ============================================================================

/// 인메모리 벡터 인덱스
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<VectorEntry>,
    dimension: usize,
}

impl VectorIndex {
    /// 엔트리로 인덱스 생성
    ///
    /// 모든 임베딩의 차원이 같아야 합니다.
    pub fn from_entries(entries: Vec<VectorEntry>) -> Result<Self, VectorIndexError> {
        let dimension = entries.first().map(|e| e.embedding.len()).unwrap_or(0);

        if let Some((index, entry)) = entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.embedding.len() != dimension)
        {
            return Err(VectorIndexError::DimensionMismatch {
                expected: dimension,
                actual: entry.embedding.len(),
                index,
            });
        }

        Ok(Self { entries, dimension })
    }

    /// 벡터 검색 (유사도 내림차순 상위 `limit`개)
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<SearchResult> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query_embedding, &e.embedding)))
            .collect();

        // 동점이면 원래 순서 유지 (stable sort)
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(i, similarity)| SearchResult {
                chunk: self.entries[i].chunk.clone(),
                similarity,
            })
            .collect()
    }

    /// 벡터 개수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 임베딩 차원
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 두 벡터 간의 코사인 유사도를 계산합니다.
/// 결과는 -1.0 ~ 1.0 범위입니다.
///
/// # Arguments
/// * `a` - 첫 번째 벡터
/// * `b` - 두 번째 벡터
///
/// # Returns
/// 코사인 유사도 (-1.0 ~ 1.0)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, embedding: Vec<f32>) -> VectorEntry {
        VectorEntry {
            chunk: Chunk {
                text: text.to_string(),
                source: "doc.pdf".to_string(),
                page: Some(1),
                start_index: 0,
            },
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_same() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) - -1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_or_empty() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = VectorIndex::from_entries(vec![
            entry("far", vec![0.0, 1.0]),
            entry("near", vec![1.0, 0.1]),
            entry("exact", vec![1.0, 0.0]),
        ])
        .unwrap();

        let results = index.search(&[1.0, 0.0], 2);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "exact");
        assert_eq!(results[1].chunk.text, "near");
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[test]
    fn test_search_limit_exceeds_len() {
        let index = VectorIndex::from_entries(vec![entry("only", vec![1.0, 0.0])]).unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 4).len(), 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.dimension(), 2);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = VectorIndex::from_entries(vec![
            entry("a", vec![1.0, 0.0]),
            entry("b", vec![1.0, 0.0, 0.0]),
        ]);
        assert_eq!(
            result.err(),
            Some(VectorIndexError::DimensionMismatch {
                expected: 2,
                actual: 3,
                index: 1,
            })
        );
    }
}
