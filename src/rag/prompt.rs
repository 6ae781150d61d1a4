//! 프롬프트 템플릿
//!
//! 모든 템플릿은 주어진 컨텍스트로만 답하고, 답이 없으면 찾을 수 없다고 말하도록 지시합니다.
//! 컨텍스트와 질문은 사용자 메시지에 그대로 들어갑니다.

use crate::llm::ChatMessage;

/// 프롬프트 템플릿
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// 텍스트 파일 전체를 컨텍스트로 사용
    KnowledgeText,
    /// PDF 문서 전체 텍스트를 컨텍스트로 사용
    PdfDocuments,
    /// 검색된 청크를 컨텍스트로 사용
    RetrievedContext,
}

const KNOWLEDGE_TEXT_SYSTEM: &str = "You are a helpful assistant specializing in the FDA's drug approval process. \
Answer the user's questions based on the provided text. \
If the answer is not in the text, say that you cannot find the answer in the provided information.";

const PDF_DOCUMENTS_SYSTEM: &str = "You are a helpful assistant specializing in the FDA's drug approval process. \
Answer the user's questions based ONLY on the provided text from the PDF documents. \
If the answer is not in the text, say that you cannot find the answer in the provided documents.";

const RETRIEVED_CONTEXT_SYSTEM: &str = "You are a helpful assistant for the FDA drug approval process. \
Answer the user's question based only on the context provided in the <context> tags. \
If you don't know the answer from the context provided, just say that you cannot find the answer in the provided documents.";

impl PromptTemplate {
    /// 시스템 지시문
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Self::KnowledgeText => KNOWLEDGE_TEXT_SYSTEM,
            Self::PdfDocuments => PDF_DOCUMENTS_SYSTEM,
            Self::RetrievedContext => RETRIEVED_CONTEXT_SYSTEM,
        }
    }

    /// 사용자 메시지 (컨텍스트 + 질문)
    pub fn user_message(&self, question: &str, context: &str) -> String {
        match self {
            Self::KnowledgeText => format!(
                "Here is the information I have about the FDA drug approval process:\n\n\
                 {context}\n\nPlease answer the following question:\n{question}"
            ),
            Self::PdfDocuments => format!(
                "Here is the information I have about the FDA drug approval process from several documents:\n\n\
                 {context}\n\nPlease answer the following question:\n{question}"
            ),
            Self::RetrievedContext => {
                format!("<context>\n{context}\n</context>\n\nQuestion: {question}")
            }
        }
    }

    /// 시스템 + 사용자 메시지 목록
    pub fn build_messages(&self, question: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_instruction()),
            ChatMessage::user(self.user_message(question, context)),
        ]
    }
}

// ============================================================================
// Tests
// ============================================================================
