//! 설정 모듈
//!
//! 프로세스 시작 시 한 번 만들어 파이프라인에 전달하는 `Settings` 구조체입니다.
//! 전역 클라이언트 대신 명시적으로 주입합니다.
//!
//! 우선순위: CLI 플래그 > 환경변수 > `.env` 파일 > 기본값

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::knowledge::ChunkConfig;

/// OpenAI API 기본 엔드포인트
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// 기본 채팅 모델
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
/// 기본 임베딩 모델
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// PDF 폴더 기본 경로
pub const DEFAULT_PDF_DIR: &str = "data_pdfs";
/// 검색 결과 기본 개수
pub const DEFAULT_TOP_K: usize = 4;

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
const CHAT_MODEL_ENV: &str = "FDA_RAG_CHAT_MODEL";
const EMBEDDING_MODEL_ENV: &str = "FDA_RAG_EMBEDDING_MODEL";
const REQUEST_TIMEOUT_ENV: &str = "FDA_RAG_REQUEST_TIMEOUT";

// ============================================================================
// Errors
// ============================================================================

/// 설정 오류
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "API key not found. Set OPENAI_API_KEY in the environment or in a .env file.\n\
         Get your API key at: https://platform.openai.com/api-keys"
    )]
    MissingApiKey,

    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid chunk config: chunk_size={chunk_size}, chunk_overlap={chunk_overlap}")]
    InvalidChunkConfig {
        chunk_size: usize,
        chunk_overlap: usize,
    },

    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("invalid request timeout {value:?}: expected a positive number of seconds")]
    InvalidTimeout { value: String },
}

// ============================================================================
// Settings
// ============================================================================

/// 런타임 설정
#[derive(Debug, Clone)]
pub struct Settings {
    /// OpenAI 호환 API 키 (chat/serve에만 필요)
    pub api_key: Option<String>,
    /// API 베이스 URL (끝의 `/` 제거됨)
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    /// 청킹 설정
    pub chunk: ChunkConfig,
    /// 검색 시 반환할 청크 수
    pub top_k: usize,
    /// HTTP 요청 타임아웃 (None이면 HTTP 클라이언트 기본값, 제한 없음)
    pub request_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk: ChunkConfig::default(),
            top_k: DEFAULT_TOP_K,
            request_timeout: None,
        }
    }
}

impl Settings {
    /// 환경변수에서 설정 로드
    ///
    /// 작업 디렉토리의 `.env` 파일을 먼저 읽습니다 (이미 설정된 변수는 덮어쓰지 않음).
    pub fn from_env() -> Result<Self, ConfigError> {
        let loaded = load_dotenv(Path::new(".env"));
        if loaded > 0 {
            tracing::debug!("Loaded {} variables from .env", loaded);
        }

        let mut settings = Self {
            api_key: non_empty_var(API_KEY_ENV),
            ..Default::default()
        };

        if let Some(base_url) = non_empty_var(BASE_URL_ENV) {
            settings.base_url = base_url;
        }
        if let Some(model) = non_empty_var(CHAT_MODEL_ENV) {
            settings.chat_model = model;
        }
        if let Some(model) = non_empty_var(EMBEDDING_MODEL_ENV) {
            settings.embedding_model = model;
        }
        if let Some(value) = non_empty_var(REQUEST_TIMEOUT_ENV) {
            settings.request_timeout = Some(parse_timeout_secs(&value)?);
        }

        settings.validate()
    }

    /// 값 검증 및 정규화
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        self.base_url = self.base_url.trim_end_matches('/').to_string();

        if !self.chunk.is_valid() {
            return Err(ConfigError::InvalidChunkConfig {
                chunk_size: self.chunk.chunk_size,
                chunk_overlap: self.chunk.chunk_overlap,
            });
        }

        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK);
        }

        Ok(self)
    }

    /// API 키 반환 (없으면 에러)
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// API 키 존재 여부
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 비어있지 않은 환경변수 값
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 초 단위 타임아웃 파싱
fn parse_timeout_secs(value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidTimeout {
            value: value.to_string(),
        })
}

/// `.env` 파일을 읽어 환경변수로 설정
///
/// 이미 설정된 변수는 유지합니다. 설정한 변수 수를 반환합니다.
/// 파일이 없으면 0, 잘못된 줄은 경고 후 건너뜁니다.
pub fn load_dotenv(path: &Path) -> usize {
    let Ok(entries) = dotenvy::from_path_iter(path) else {
        return 0;
    };

    let mut count = 0;
    for entry in entries {
        match entry {
            Ok((key, value)) => {
                if std::env::var_os(&key).is_none() {
                    std::env::set_var(&key, value);
                    count += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Skipping invalid line in {:?}: {}", path, e);
            }
        }
    }
    count
}

// ============================================================================
// Tests
// ============================================================================
