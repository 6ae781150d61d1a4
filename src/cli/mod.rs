//! CLI 모듈
//!
//! fda-rag CLI 명령어 정의 및 구현

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::collector::{CollectionStats, FileCollector};
use crate::config::{Settings, DEFAULT_PDF_DIR};
use crate::knowledge::{FileOutcome, LoadReport};
use crate::rag::{ContextMode, KnowledgeSource, Pipeline, Providers, SetupError};
use crate::web::{self, AppState, DEFAULT_ADDR};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "fda-rag")]
#[command(version, about = "FDA 의약품 승인 절차 질의응답 (RAG)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 검색 시 사용할 청크 수
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// 최대 청크 크기 (문자)
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// 인접 청크 겹침 (문자)
    #[arg(long, global = true)]
    pub chunk_overlap: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 터미널에서 질의응답
    Chat {
        /// 단일 텍스트 지식 파일 (기본 모드: full-text)
        #[arg(long, conflicts_with = "pdf_dir")]
        knowledge_file: Option<PathBuf>,

        /// PDF 폴더 (기본값: data_pdfs)
        #[arg(long)]
        pdf_dir: Option<PathBuf>,

        /// 컨텍스트 구성 방식
        #[arg(long, value_enum)]
        mode: Option<ContextMode>,
    },

    /// 웹 폼 서버 실행
    Serve {
        /// PDF 폴더
        #[arg(long, default_value = DEFAULT_PDF_DIR)]
        pdf_dir: PathBuf,

        /// 바인드 주소
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: SocketAddr,

        /// 컨텍스트 구성 방식
        #[arg(long, value_enum, default_value_t = ContextMode::Retrieval)]
        mode: ContextMode,
    },

    /// 설정 및 지식베이스 상태 확인
    Status {
        /// PDF 폴더
        #[arg(long, default_value = DEFAULT_PDF_DIR)]
        pdf_dir: PathBuf,
    },
}

impl Cli {
    /// 환경변수 설정에 CLI 플래그 적용
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::from_env()?;
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
        }
        if let Some(chunk_size) = self.chunk_size {
            settings.chunk.chunk_size = chunk_size;
        }
        if let Some(chunk_overlap) = self.chunk_overlap {
            settings.chunk.chunk_overlap = chunk_overlap;
        }
        Ok(settings.validate()?)
    }
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;

    match cli.command {
        Commands::Chat {
            knowledge_file,
            pdf_dir,
            mode,
        } => {
            let (source, mode) = resolve_source(knowledge_file, pdf_dir, mode);
            cmd_chat(settings, source, mode).await
        }
        Commands::Serve {
            pdf_dir,
            addr,
            mode,
        } => cmd_serve(settings, pdf_dir, addr, mode).await,
        Commands::Status { pdf_dir } => cmd_status(&settings, &pdf_dir),
    }
}

/// 지식 원천과 모드 결정
///
/// 텍스트 파일은 모드를 지정하지 않으면 전체 텍스트 모드입니다.
fn resolve_source(
    knowledge_file: Option<PathBuf>,
    pdf_dir: Option<PathBuf>,
    mode: Option<ContextMode>,
) -> (KnowledgeSource, ContextMode) {
    match knowledge_file {
        Some(file) => (
            KnowledgeSource::TextFile(file),
            mode.unwrap_or(ContextMode::FullText),
        ),
        None => (
            KnowledgeSource::PdfDirectory(pdf_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_PDF_DIR))),
            mode.unwrap_or_default(),
        ),
    }
}

/// 터미널 질의응답
async fn cmd_chat(settings: Settings, source: KnowledgeSource, mode: ContextMode) -> Result<()> {
    let providers = Providers::openai(&settings)?;

    println!("[*] 지식베이스 로드 중: {} ({} mode)", source.path().display(), mode);

    let (pipeline, report) = match Pipeline::setup(&settings, source, mode, &providers).await {
        Ok(setup) => setup,
        Err(e) => match e.downcast_ref::<SetupError>() {
            Some(SetupError::EmptyKnowledgeBase { .. } | SetupError::EmptyKnowledgeFile { .. }) => {
                println!("{}", e);
                return Ok(());
            }
            _ => return Err(e),
        },
    };

    print_load_report(&report);
    if pipeline.mode() == ContextMode::Retrieval {
        println!("[OK] 벡터 인덱스: {} 청크", pipeline.chunk_count());
    }

    println!("\nWelcome to the FDA Drug Approval Assistant!");
    println!("My knowledge comes from the documents you provided.");
    println!("Ask a question (or type 'quit' to exit).");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let answered = run_repl(&pipeline, stdin, &mut stdout).await?;

    tracing::debug!("Chat session ended after {} answers", answered);
    Ok(())
}

/// 웹 폼 서버
async fn cmd_serve(
    settings: Settings,
    pdf_dir: PathBuf,
    addr: SocketAddr,
    mode: ContextMode,
) -> Result<()> {
    let providers = Providers::openai(&settings)?;

    println!("[*] PDF 폴더: {}", pdf_dir.display());
    println!("[*] 서버 시작: http://{} ({} mode)", addr, mode);
    println!("    지식베이스는 첫 요청 시 로드됩니다.");

    let state = Arc::new(AppState::new(settings, pdf_dir, mode, providers));
    web::serve(addr, state).await
}

/// 상태 확인
fn cmd_status(settings: &Settings, pdf_dir: &Path) -> Result<()> {
    println!("fda-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] API 엔드포인트: {}", settings.base_url);
    println!("[*] 채팅 모델: {}", settings.chat_model);
    println!("[*] 임베딩 모델: {}", settings.embedding_model);
    println!(
        "[*] 청킹: {} / {} (top_k {})",
        settings.chunk.chunk_size, settings.chunk.chunk_overlap, settings.top_k
    );

    if settings.has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export OPENAI_API_KEY=your-key (또는 .env 파일)");
    }

    match FileCollector::with_defaults().collect_pdfs(pdf_dir) {
        Ok(files) if files.is_empty() => {
            println!("[!] PDF 폴더 {}: PDF 없음", pdf_dir.display());
        }
        Ok(files) => {
            let stats = CollectionStats::from_files(&files);
            println!(
                "[OK] PDF 폴더 {}: {} 파일, {}",
                pdf_dir.display(),
                stats.total_files,
                format_bytes(stats.total_size as usize)
            );
        }
        Err(e) => {
            println!("[!] PDF 폴더 조회 실패: {:#}", e);
        }
    }

    Ok(())
}

// ============================================================================
// REPL
// ============================================================================

/// 질의응답 루프
///
/// `quit`(대소문자 무시) 또는 입력 끝에서 종료하고, 답변한 질문 수를 반환합니다.
/// 빈 줄도 질문으로 처리합니다.
pub async fn run_repl<R, W>(pipeline: &Pipeline, mut input: R, out: &mut W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut answered = 0;

    loop {
        write!(out, "\nYour question: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            writeln!(out)?;
            break;
        }

        let question = strip_newline(&line);
        if is_quit(question) {
            break;
        }

        let turn = pipeline.ask(question).await?;
        writeln!(out, "\nAssistant: {}", turn.answer)?;
        answered += 1;
    }

    Ok(answered)
}

/// 종료 명령 여부
fn is_quit(input: &str) -> bool {
    input.eq_ignore_ascii_case("quit")
}

/// 끝의 줄바꿈만 제거
fn strip_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn print_load_report(report: &LoadReport) {
    for file in &report.files {
        match &file.outcome {
            FileOutcome::Loaded { pages, chars } => {
                println!(
                    "  - Successfully read {} ({} pages, {} chars)",
                    file.file_name, pages, chars
                );
            }
            FileOutcome::Failed { error } => {
                println!("[!] Error reading {}: {}", file.file_name, truncate_text(error, 200));
            }
        }
    }

    if !report.files.is_empty() {
        println!(
            "[OK] {} 파일 로드, {} 파일 건너뜀",
            report.loaded_count(),
            report.failed_count()
        );
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
