//! Text Chunking Module
//!
//! 재귀적 경계 인식 텍스트 분할을 제공합니다.
//! 문단 → 줄 → 단어 → 문자 순으로 경계를 찾고,
//! 고정 크기 청크 사이에 오버랩을 둡니다.

use std::collections::VecDeque;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정 (단위: 문자 수)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// 최대 청크 크기
    pub chunk_size: usize,
    /// 인접 청크 간 오버랩 크기
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkConfig {
    /// 오버랩이 청크 크기보다 작아야 유효
    pub fn is_valid(&self) -> bool {
        self.chunk_size > 0 && self.chunk_overlap < self.chunk_size
    }
}

/// 기본 분할 경계 (우선순위 순)
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

// ============================================================================
// Chunk
// ============================================================================

/// 원본 문서 정보를 가진 청크
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 청크 텍스트
    pub text: String,
    /// 원본 파일 이름
    pub source: String,
    /// 원본 페이지 번호 (1부터 시작)
    pub page: Option<usize>,
    /// 페이지 텍스트 내 대략적인 시작 위치 (바이트)
    pub start_index: usize,
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청크 간 오버랩 (문자 수)
    fn overlap(&self) -> usize {
        0
    }

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// RecursiveChunker
// ============================================================================

/// 재귀 경계 인식 청커
///
/// 가장 큰 경계(문단)부터 시도하고, 조각이 여전히 크면 다음 경계로 재귀합니다.
/// 경계 문자열은 다음 조각의 앞에 붙여 보존합니다.
pub struct RecursiveChunker {
    config: ChunkConfig,
    separators: Vec<&'static str>,
}

impl RecursiveChunker {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self {
            config,
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    /// 기본 설정으로 생성 (1000 / 200)
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // 텍스트에 존재하는 첫 번째 경계 선택
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&'static str] = &[];
        for (i, &sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<&str> = Vec::new();

        for piece in split_keep_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// 작은 조각들을 최대 크기까지 병합하고, 끝부분을 오버랩으로 다음 청크에 넘김
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let ChunkConfig {
            chunk_size,
            chunk_overlap,
        } = self.config;

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > chunk_size && !current.is_empty() {
                if total > chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        chunk_size
                    );
                }

                if let Some(doc) = join_pieces(&current) {
                    docs.push(doc);
                }

                // 오버랩 크기 이하가 될 때까지 앞쪽 조각 제거
                while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_pieces(&current) {
            docs.push(doc);
        }

        docs
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }
        self.split_recursive(text, &self.separators)
    }

    fn overlap(&self) -> usize {
        self.config.chunk_overlap
    }

    fn name(&self) -> &'static str {
        "RecursiveChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 문자 수
#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 경계 문자열을 다음 조각의 앞에 붙여 분할 (빈 조각 제외)
///
/// 빈 경계는 문자 단위 분할입니다.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut starts = vec![0];
    starts.extend(text.match_indices(separator).map(|(i, _)| i));
    starts.push(text.len());

    starts
        .windows(2)
        .map(|w| &text[w[0]..w[1]])
        .filter(|s| !s.is_empty())
        .collect()
}

/// 조각 결합 후 앞뒤 공백 제거 (비어있으면 None)
fn join_pieces(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 마지막 `n` 문자의 바이트 길이
fn tail_byte_len(s: &str, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    s.char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| s.len() - i)
        .unwrap_or(s.len())
}

/// 원문에서 각 청크의 시작 위치 찾기
///
/// 이전 청크의 끝에서 오버랩만큼 뒤로 간 지점부터 검색합니다.
/// 찾지 못하면 처음부터 다시 검색하고, 그래도 없으면 0입니다.
pub fn locate_chunks(text: &str, chunks: Vec<String>, overlap: usize) -> Vec<(usize, String)> {
    let mut located = Vec::with_capacity(chunks.len());
    let mut search_from = 0usize;

    for chunk in chunks {
        let start = text
            .get(search_from..)
            .and_then(|rest| rest.find(chunk.as_str()))
            .map(|i| search_from + i)
            .or_else(|| text.find(chunk.as_str()))
            .unwrap_or(0);

        search_from = start + chunk.len() - tail_byte_len(&chunk, overlap);
        located.push((start, chunk));
    }

    located
}

/// 페이지 텍스트를 메타데이터가 붙은 청크로 분할
pub fn split_page(chunker: &dyn Chunker, source: &str, page: Option<usize>, text: &str) -> Vec<Chunk> {
    let chunks = chunker.chunk(text);
    locate_chunks(text, chunks, chunker.overlap())
        .into_iter()
        .map(|(start_index, text)| Chunk {
            text,
            source: source.to_string(),
            page,
            start_index,
        })
        .collect()
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(RecursiveChunker::with_defaults())
}

/// 설정을 지정한 재귀 청커 생성
pub fn recursive_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(RecursiveChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================
