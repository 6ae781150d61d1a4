//! 임베딩 모듈 - OpenAI 호환 API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 임베딩 프로바이더입니다.
//! 시맨틱 검색을 위한 핵심 모듈입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OpenAiEmbedding::from_settings(&settings)?;
//! let embedding = embedder.embed("What is an IND?").await?;
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::openai::{ApiError, OpenAiClient};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Embedding
// ============================================================================

/// 요청당 최대 입력 수
const DEFAULT_BATCH_SIZE: usize = 1000;

/// OpenAI 임베딩 구현체
///
/// `POST {base_url}/embeddings`
#[derive(Debug)]
pub struct OpenAiEmbedding {
    client: OpenAiClient,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedding {
    /// 클라이언트와 모델로 생성
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// 설정에서 생성
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = OpenAiClient::from_settings(settings)?;
        Ok(Self::new(client, settings.embedding_model.clone()))
    }

    /// 요청당 입력 수 지정
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let response: EmbedResponse = self.client.post_json("/embeddings", &request).await?;

        // 응답 순서는 index 필드 기준
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

/// 임베딩 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// 임베딩 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::Empty("no embedding returned").into())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                "Embedding batch {} ({} texts, model={})",
                i + 1,
                batch.len(),
                self.model
            );

            let vectors = self
                .request(batch)
                .await
                .context("Embedding request failed")?;

            if vectors.len() != batch.len() {
                anyhow::bail!(
                    "Embedding count mismatch: sent {}, received {}",
                    batch.len(),
                    vectors.len()
                );
            }
            results.extend(vectors);
        }

        Ok(results)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::openai::test_support::{client, spawn_stub};

    /// 입력 길이를 1차원 벡터로 돌려주는 스텁 (역순으로 응답)
    fn embeddings_router(calls: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/v1/embeddings",
            post(move |Json(body): Json<Value>| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let inputs = body["input"].as_array().cloned().unwrap_or_default();
                    let data: Vec<Value> = inputs
                        .iter()
                        .enumerate()
                        .rev()
                        .map(|(i, text)| {
                            let len = text.as_str().unwrap_or_default().len() as f32;
                            json!({ "object": "embedding", "index": i, "embedding": [len] })
                        })
                        .collect();
                    Json(json!({ "object": "list", "data": data, "model": body["model"] }))
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_embed_batch_orders_by_index() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(embeddings_router(calls.clone())).await;
        let embedder = OpenAiEmbedding::new(client(&base), "text-embedding-ada-002");

        let texts = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors, vec![vec![1.0], vec![3.0], vec![2.0]]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_embed_batch_splits_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(embeddings_router(calls.clone())).await;
        let embedder = OpenAiEmbedding::new(client(&base), "m").with_batch_size(2);

        let texts: Vec<String> = (1..=5).map(|n| "x".repeat(n)).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(vectors[4], vec![5.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_embed_single() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = spawn_stub(embeddings_router(calls)).await;
        let embedder = OpenAiEmbedding::new(client(&base), "m");

        assert_eq!(embedder.embed("four").await.unwrap(), vec![4.0]);
        assert_eq!(embedder.name(), "m");
    }

    #[tokio::test]
    async fn test_embed_count_mismatch() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|| async { Json(json!({ "data": [] })) }),
        );
        let base = spawn_stub(router).await;
        let embedder = OpenAiEmbedding::new(client(&base), "m");

        let err = embedder
            .embed_batch(&["a".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn test_from_settings_without_key() {
        assert!(OpenAiEmbedding::from_settings(&Settings::default()).is_err());
    }
}
