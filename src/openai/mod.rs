//! OpenAI 호환 HTTP 클라이언트
//!
//! 채팅 완성과 임베딩 API가 공유하는 요청/인증/에러 처리입니다.
//! 재시도나 백오프는 하지 않습니다. 실패는 그대로 호출자에게 전파됩니다.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Settings;

// ============================================================================
// Errors
// ============================================================================

/// API 호출 오류
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to send request to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("API response was empty: {0}")]
    Empty(&'static str),
}

/// OpenAI 에러 응답
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ============================================================================
// OpenAiClient
// ============================================================================

/// OpenAI 호환 API 클라이언트
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// 설정에서 생성 (API 키 필수)
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_api_key()?;
        Self::new(&settings.base_url, api_key, settings.request_timeout)
    }

    /// 엔드포인트와 키를 지정하여 생성
    ///
    /// 타임아웃이 None이면 reqwest 기본값(제한 없음)을 따릅니다.
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON POST 요청
    ///
    /// 2xx가 아니면 응답 본문의 `error.message`를 담은 [`ApiError::Status`]를 반환합니다.
    pub async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::Request { url, source })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

// ============================================================================
// Test Support
// ============================================================================

/// 로컬 axum 스텁 서버
#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use super::OpenAiClient;

    /// 라우터를 임의 포트에 띄우고 베이스 URL 반환
    pub async fn spawn_stub(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{}/v1", addr)
    }

    pub fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(base_url, "sk-test", Some(Duration::from_secs(5))).unwrap()
    }
}

// ============================================================================
// Tests
// ============================================================================
