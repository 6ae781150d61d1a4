//! Web 모듈 - 단일 페이지 질의응답 폼 (axum)
//!
//! `GET /?q=...` 한 번에 질문 하나를 처리합니다. 파이프라인 설정은
//! PDF 폴더 경로별로 한 번만 수행되고 이후 요청은 캐시된 파이프라인을 씁니다.
//! 대화 기록은 남기지 않습니다.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Settings;
use crate::rag::{ContextMode, KnowledgeSource, Pipeline, Providers, SetupCache};

/// 기본 바인드 주소
pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

const PAGE_TITLE: &str = "FDA 'Truth-Seeking' Assistant";
const HEADING: &str = "💊 'Truth-Seeking' AI Assistant for FDA Drug Approval";
const DESCRIPTION: &str = "Welcome! This AI assistant is designed to answer questions about the FDA's drug approval process. \
It uses a Retrieval-Augmented Generation (RAG) pipeline, which means it bases its answers <em>only</em> on a knowledge base of official FDA documents. \
Ask a question below to get a factual, verifiable answer.";

// ============================================================================
// State
// ============================================================================

/// 공유 서버 상태
pub struct AppState {
    pub settings: Settings,
    pub pdf_dir: PathBuf,
    pub mode: ContextMode,
    pub providers: Providers,
    pub cache: SetupCache<Pipeline>,
}

impl AppState {
    pub fn new(settings: Settings, pdf_dir: PathBuf, mode: ContextMode, providers: Providers) -> Self {
        Self {
            settings,
            pdf_dir,
            mode,
            providers,
            cache: SetupCache::new(),
        }
    }

    /// 캐시된 파이프라인 (최초 호출 시 설정)
    pub async fn pipeline(&self) -> Result<Arc<Pipeline>> {
        self.cache
            .get_or_try_init(&self.pdf_dir, || async {
                let (pipeline, report) = Pipeline::setup(
                    &self.settings,
                    KnowledgeSource::PdfDirectory(self.pdf_dir.clone()),
                    self.mode,
                    &self.providers,
                )
                .await?;
                tracing::info!(
                    "Knowledge base ready: {} loaded, {} skipped, {} chunks",
                    report.loaded_count(),
                    report.failed_count(),
                    pipeline.chunk_count()
                );
                Ok(pipeline)
            })
            .await
    }
}

// ============================================================================
// Router
// ============================================================================

/// 라우터 구성
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ask_page))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 서버 실행
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Web form listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct AskQuery {
    #[serde(default)]
    q: Option<String>,
}

async fn ask_page(State(state): State<Arc<AppState>>, Query(query): Query<AskQuery>) -> Response {
    let pipeline = match state.pipeline().await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("Failed to load the knowledge base: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_setup_error(&format!("{:#}", e))),
            )
                .into_response();
        }
    };

    let question = query.q.unwrap_or_default();
    if question.is_empty() {
        return Html(render_page("", None)).into_response();
    }

    let span = tracing::info_span!("ask", request_id = %Uuid::new_v4());
    match pipeline.ask(&question).instrument(span).await {
        Ok(turn) => Html(render_page(&question, Some(&turn.answer))).into_response(),
        Err(e) => AppError(e).into_response(),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// 답변 생성 실패 → 500
struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Answer generation failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal Server Error: {:#}", self.0),
        )
            .into_response()
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render_page(question: &str, answer: Option<&str>) -> String {
    let answer_html = answer
        .map(|a| format!("<section class=\"answer\">{}</section>\n", html_escape(a)))
        .unwrap_or_default();

    format!(
        "{head}<p>{DESCRIPTION}</p>\n\
         <form method=\"get\" action=\"/\">\n\
         <label for=\"q\">Ask your question here:</label>\n\
         <input type=\"text\" id=\"q\" name=\"q\" value=\"{value}\" autofocus>\n\
         </form>\n\
         {answer_html}</body>\n</html>\n",
        head = page_head(),
        value = html_escape(question),
    )
}

fn render_setup_error(error: &str) -> String {
    format!(
        "{head}<p class=\"error\">Failed to load the knowledge base. Error: {error}</p>\n</body>\n</html>\n",
        head = page_head(),
        error = html_escape(error),
    )
}

fn page_head() -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n<h1>{}</h1>\n",
        html_escape(PAGE_TITLE),
        HEADING
    )
}

/// HTML 특수문자 이스케이프
fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::Ordering;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::knowledge::tests::{FakeExtractor, KeywordEmbedder};
    use crate::rag::tests::RecordingChat;

    fn state(
        dir: &Path,
        chat: Arc<RecordingChat>,
        embedder: Arc<KeywordEmbedder>,
    ) -> Arc<AppState> {
        let providers = Providers {
            embedder,
            chat,
            extractor: Arc::new(FakeExtractor::default()),
        };
        Arc::new(AppState::new(
            Settings::default(),
            dir.to_path_buf(),
            ContextMode::Retrieval,
            providers,
        ))
    }

    async fn get_page(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn knowledge_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ind.pdf"),
            "An IND application is required before clinical trials.",
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_form_without_question() {
        let dir = knowledge_dir();
        let chat = Arc::new(RecordingChat::new("unused"));
        let app = build_router(state(dir.path(), chat.clone(), Arc::default()));

        let (status, body) = get_page(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Truth-Seeking"));
        assert!(body.contains("<form"));
        assert!(body.contains("Ask your question here:"));
        assert!(!body.contains("class=\"answer\""));
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_question_renders_answer_and_indexes_once() {
        let dir = knowledge_dir();
        let chat = Arc::new(RecordingChat::new("Yes, an <IND> is required."));
        let embedder = Arc::new(KeywordEmbedder::default());
        let app = build_router(state(dir.path(), chat.clone(), embedder.clone()));

        let (status, body) = get_page(app.clone(), "/?q=Is+an+IND+required%3F").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Yes, an &lt;IND&gt; is required."));
        assert!(body.contains("value=\"Is an IND required?\""));

        let (status, _) = get_page(app, "/?q=Second+question").await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(chat.call_count(), 2);
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
        assert!(chat.last_messages()[1].content.contains("Question: Second question"));
    }

    #[tokio::test]
    async fn test_setup_failure_page() {
        let dir = tempfile::tempdir().unwrap();
        let chat = Arc::new(RecordingChat::new("unused"));
        let app = build_router(state(dir.path(), chat.clone(), Arc::default()));

        let (status, body) = get_page(app, "/?q=anything").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Failed to load the knowledge base. Error: No knowledge base loaded."));
        assert!(!body.contains("<form"));
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_failure_is_500() {
        let dir = knowledge_dir();
        let app = build_router(state(
            dir.path(),
            Arc::new(RecordingChat::failing()),
            Arc::default(),
        ));

        let (status, body) = get_page(app, "/?q=Is+an+IND+required%3F").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_healthz() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state(
            dir.path(),
            Arc::new(RecordingChat::new("unused")),
            Arc::default(),
        ));

        let (status, body) = get_page(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }
}
