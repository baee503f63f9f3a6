//! CLI 모듈
//!
//! docqa CLI 명령어 정의 및 구현

mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::chat::{ChatApp, HybridAnswerRouter, LengthPreference, ProcessSummary};
use crate::collector::FileCollector;
use crate::config::AppConfig;
use crate::embedding::{create_embedder, has_api_key};
use crate::extractor::{ContentExtractor, DocumentSource};
use crate::knowledge::ChunkConfig;
use crate::llm::ChatCompletionsModel;
use crate::server::{AppState, QueryPipeline};
use crate::session::{Session, SessionStore};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "docqa")]
#[command(version, about = "대화형 문서 질의응답 시스템", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 청킹 옵션
#[derive(Args, Debug, Clone, Default)]
pub struct ChunkArgs {
    /// 청크 크기 (문자 수)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// 청크 간 겹침 (문자 수)
    #[arg(long)]
    chunk_overlap: Option<usize>,
}

/// 문서 입력 옵션
#[derive(Args, Debug, Clone, Default)]
pub struct DocumentArgs {
    /// 문서 파일 경로 또는 URL (여러 번 지정 가능)
    #[arg(short, long = "doc")]
    docs: Vec<String>,

    /// 문서 폴더 (재귀)
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 대화형 채팅 시작
    Chat {
        #[command(flatten)]
        documents: DocumentArgs,

        /// 답변 길이 (short, medium, long)
        #[arg(short, long, default_value = "medium")]
        length: String,

        /// 이어서 대화할 세션 ID
        #[arg(short, long)]
        session: Option<String>,

        #[command(flatten)]
        chunks: ChunkArgs,
    },

    /// 질문 하나에 답변
    Ask {
        /// 질문
        question: String,

        #[command(flatten)]
        documents: DocumentArgs,

        /// 답변 길이 (short, medium, long)
        #[arg(short, long, default_value = "medium")]
        length: String,

        #[command(flatten)]
        chunks: ChunkArgs,
    },

    /// REST API 서버 실행
    Serve {
        /// 바인드 주소 (기본: DOCQA_BIND 또는 127.0.0.1:8000)
        #[arg(short, long)]
        bind: Option<String>,

        #[command(flatten)]
        chunks: ChunkArgs,
    },

    /// 세션 관리
    Sessions {
        #[command(subcommand)]
        action: Option<SessionAction>,
    },

    /// 상태 확인
    Status,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// 세션 목록
    List,
    /// 새 세션 생성
    New,
    /// 세션 이름 변경
    Rename {
        /// 세션 ID
        id: String,
        /// 새 이름
        name: String,
    },
    /// 세션 삭제
    Delete {
        /// 세션 ID
        id: String,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Chat {
            documents,
            length,
            session,
            chunks,
        } => cmd_chat(&config, documents, &length, session, chunks).await,
        Commands::Ask {
            question,
            documents,
            length,
            chunks,
        } => cmd_ask(&config, &question, documents, &length, chunks).await,
        Commands::Serve { bind, chunks } => cmd_serve(&config, bind, chunks).await,
        Commands::Sessions { action } => {
            cmd_sessions(&config, action.unwrap_or(SessionAction::List))
        }
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 대화형 채팅 명령어 (chat)
async fn cmd_chat(
    config: &AppConfig,
    documents: DocumentArgs,
    length: &str,
    session: Option<String>,
    chunks: ChunkArgs,
) -> Result<()> {
    let mut app = build_chat_app(config, &chunks)?;
    app.set_length(LengthPreference::parse(length));

    if let Some(id) = session {
        app.switch_session(&id)
            .with_context(|| format!("세션 전환 실패: {}", id))?;
    }

    let sources = collect_sources(&documents)?;
    if !sources.is_empty() {
        process_and_report(&mut app, &sources).await;
    }

    repl::run_repl(&mut app).await
}

/// 단일 질문 명령어 (ask)
async fn cmd_ask(
    config: &AppConfig,
    question: &str,
    documents: DocumentArgs,
    length: &str,
    chunks: ChunkArgs,
) -> Result<()> {
    let mut app = build_chat_app(config, &chunks)?;
    app.set_length(LengthPreference::parse(length));

    let sources = collect_sources(&documents)?;
    if !sources.is_empty() {
        process_and_report(&mut app, &sources).await;
    }

    let answer = app.ask(question).await;
    println!("{}", answer.text);
    println!();
    println!("  ({})", answer.source.label());

    Ok(())
}

/// REST 서버 명령어 (serve)
async fn cmd_serve(config: &AppConfig, bind: Option<String>, chunks: ChunkArgs) -> Result<()> {
    if !config.has_llm_key() {
        println!("[!] GROQ_API_KEY가 설정되지 않았습니다. 모든 요청이 실패합니다.");
    }

    let chunk_config = chunk_config(config.api_chunks, &chunks)?;
    let llm = ChatCompletionsModel::new(&config.api_llm)?;
    let loader = ContentExtractor::new().context("문서 추출기 생성 실패")?;

    let pipeline = QueryPipeline::new(Arc::new(loader), create_embedder(), Arc::new(llm))
        .with_chunk_config(chunk_config)
        .with_top_k(config.api_top_k);

    let bind = bind.unwrap_or_else(|| config.bind.clone());
    println!("[*] REST API 서버 시작: http://{}", bind);
    println!("    POST /api/v1/hackrx/run");

    crate::server::serve(AppState::new(pipeline), &bind).await
}

/// 세션 관리 명령어 (sessions)
fn cmd_sessions(config: &AppConfig, action: SessionAction) -> Result<()> {
    let store = SessionStore::open(config.sessions_path()).context("세션 저장소 열기 실패")?;

    match action {
        SessionAction::List => {
            let sessions = store.list().context("세션 목록 조회 실패")?;
            if sessions.is_empty() {
                println!("[!] 저장된 세션이 없습니다.");
                return Ok(());
            }

            println!("[OK] 세션 ({} 개):\n", sessions.len());
            for session in &sessions {
                print_session(session, false);
            }
        }
        SessionAction::New => {
            let session = store.create().context("세션 생성 실패")?;
            println!("[OK] 세션 생성: {} ({})", session.display_name, session.id);
        }
        SessionAction::Rename { id, name } => {
            let session = store.rename(&id, &name).context("세션 이름 변경 실패")?;
            println!("[OK] 세션 이름 변경: {}", session.display_name);
        }
        SessionAction::Delete { id } => {
            if store.get(&id)?.is_none() {
                bail!("세션을 찾을 수 없습니다: {}", id);
            }
            if store.delete(&id).context("세션 삭제 실패")? {
                println!("[OK] 세션 삭제됨: {}", id);
            } else {
                println!("[!] 마지막 남은 세션은 삭제할 수 없습니다.");
            }
        }
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &AppConfig) -> Result<()> {
    println!("docqa v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", config.data_dir.display());
    println!("[*] 모델: {} ({})", config.chat_llm.model, config.chat_llm.base_url);

    if config.has_llm_key() {
        println!("[OK] LLM API 키: 설정됨");
    } else {
        println!("[!] LLM API 키: 미설정");
        println!("    설정: export GROQ_API_KEY=your-key");
    }

    if has_api_key() {
        println!("[OK] 임베딩 API 키: 설정됨 (유사도 검색)");
    } else {
        println!("[!] 임베딩 API 키: 미설정 (원문 폴백 검색)");
        println!("    설정: export OPENAI_API_KEY=your-key");
    }

    match SessionStore::open(config.sessions_path()).and_then(|store| store.count()) {
        Ok(count) => println!("[OK] 저장된 세션: {} 개", count),
        Err(e) => println!("[!] 세션 저장소 조회 실패: {}", e),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 채팅 컨트롤러 구성
fn build_chat_app(config: &AppConfig, chunks: &ChunkArgs) -> Result<ChatApp> {
    if !config.has_llm_key() {
        println!("[!] GROQ_API_KEY가 설정되지 않았습니다. 답변 대신 오류 메시지가 표시됩니다.");
    }

    let chunk_config = chunk_config(config.chat_chunks, chunks)?;
    let store = SessionStore::open(config.sessions_path()).context("세션 저장소 열기 실패")?;
    let llm = Arc::new(ChatCompletionsModel::new(&config.chat_llm)?);
    let loader = ContentExtractor::new().context("문서 추출기 생성 실패")?;

    let router = HybridAnswerRouter::new(llm.clone()).with_top_k(config.chat_top_k);
    let app = ChatApp::new(store, llm, Arc::new(loader), chunk_config, create_embedder())
        .with_router(router);

    Ok(app)
}

/// 기본 청킹 설정에 CLI 옵션 적용
fn chunk_config(base: ChunkConfig, args: &ChunkArgs) -> Result<ChunkConfig> {
    base.with_overrides(args.chunk_size, args.chunk_overlap)
        .context("잘못된 청킹 설정")
}

/// 문서 입력 옵션 → 수집 대상
fn collect_sources(args: &DocumentArgs) -> Result<Vec<DocumentSource>> {
    let mut sources: Vec<DocumentSource> =
        args.docs.iter().map(|d| DocumentSource::parse(d)).collect();

    if let Some(ref dir) = args.dir {
        let files = FileCollector::with_defaults()
            .collect_directory(dir)
            .context("폴더 수집 실패")?;
        sources.extend(files.into_iter().map(|f| DocumentSource::File(f.path)));
    }

    Ok(sources)
}

/// 문서 처리 후 결과 출력
async fn process_and_report(app: &mut ChatApp, sources: &[DocumentSource]) {
    println!("[*] 문서 처리 중 ({} 개)...", sources.len());

    match app.process_documents(sources).await {
        Ok(summary) => print_process_summary(&summary),
        Err(e) => println!("[!] 문서 처리 실패: {:#}", e),
    }
}

fn print_process_summary(summary: &ProcessSummary) {
    for failure in &summary.failures {
        println!("[!] {}: {}", failure.source, failure.error);
    }

    println!(
        "[OK] 문서 {} 개 → 청크 {} 개 처리 완료",
        summary.documents, summary.chunks
    );
    if summary.degraded {
        println!("    (임베딩 없음: 유사도 대신 앞부분 청크를 사용합니다)");
    }
}

fn print_session(session: &Session, current: bool) {
    let marker = if current { "*" } else { " " };
    println!(
        " {} {}  {}",
        marker,
        session.id,
        truncate_text(&session.display_name, 40)
    );
    println!(
        "      {} | 메시지 {} 개{}",
        session.last_updated.format("%Y-%m-%d %H:%M"),
        session.messages.len(),
        if session.has_processed_docs {
            " | 문서 처리됨"
        } else {
            ""
        }
    );
}

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

// ============================================================================
// Tests
// ============================================================================
