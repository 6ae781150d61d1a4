//! Answer Generator - 프롬프트 조립 후 채팅 완성 호출

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::knowledge::SearchResult;
use crate::llm::ChatModel;

use super::prompt::PromptTemplate;

/// 검색된 청크 사이 구분자
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// 질문-답변 한 쌍 (저장하지 않음)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// 답변 생성기
#[derive(Clone)]
pub struct AnswerGenerator {
    chat: Arc<dyn ChatModel>,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// 컨텍스트로 질문에 답변
    ///
    /// API 오류는 잡지 않고 그대로 전파합니다.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        template: PromptTemplate,
    ) -> Result<ConversationTurn> {
        let asked_at = Utc::now();
        let messages = template.build_messages(question, context);

        tracing::debug!(
            "Sending {:?} prompt to {} ({} context chars)",
            template,
            self.chat.model(),
            context.chars().count()
        );

        let answer = self.chat.complete(&messages).await?;

        Ok(ConversationTurn {
            question: question.to_string(),
            answer,
            asked_at,
        })
    }

    pub fn model(&self) -> &str {
        self.chat.model()
    }
}

/// 검색 결과 청크를 하나의 컨텍스트로 결합
pub fn join_chunks(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

// ============================================================================
// Tests
// ============================================================================
