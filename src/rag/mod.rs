//! RAG 모듈 - 프롬프트 구성, 답변 생성, 파이프라인 오케스트레이션
//!
//! - Prompt: 세 가지 고정 템플릿
//! - Generator: 컨텍스트 + 질문 → 채팅 완성
//! - Pipeline: 로드 → 인덱싱 → 질의응답
//! - Cache: 웹 서버용 경로별 설정 메모이제이션

mod cache;
mod generator;
mod pipeline;
mod prompt;

// Re-exports
pub use cache::SetupCache;
pub use generator::{join_chunks, AnswerGenerator, ConversationTurn, CHUNK_SEPARATOR};
pub use pipeline::{ContextMode, KnowledgeSource, Pipeline, Providers, SetupError};
pub use prompt::PromptTemplate;

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::llm::{ChatMessage, ChatModel};

    /// 보낸 메시지를 기록하고 고정 답변을 돌려주는 채팅 모델
    pub(crate) struct RecordingChat {
        answer: Option<String>,
        calls: AtomicUsize,
        messages: Mutex<Vec<ChatMessage>>,
    }

    impl RecordingChat {
        pub fn new(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                calls: AtomicUsize::new(0),
                messages: Mutex::new(Vec::new()),
            }
        }

        /// 항상 API 오류를 내는 모델
        pub fn failing() -> Self {
            Self {
                answer: None,
                calls: AtomicUsize::new(0),
                messages: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_messages(&self) -> Vec<ChatMessage> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingChat {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.messages.lock().unwrap() = messages.to_vec();
            self.answer
                .clone()
                .ok_or_else(|| anyhow::anyhow!("API error (status 500): upstream unavailable"))
        }

        fn model(&self) -> &str {
            "recording"
        }
    }
}
