//! 대화형 REPL
//!
//! 일반 입력은 질문으로 처리하고, `/`로 시작하는 입력은 명령으로 처리합니다.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::chat::{ChatApp, LengthPreference};
use crate::extractor::DocumentSource;

use super::{print_session, process_and_report, truncate_text};

const HELP: &str = "\
명령어:
  /docs <경로|URL> ...   문서 처리 (공백으로 구분)
  /summarize             업로드한 문서 요약
  /clear                 대화 기록 삭제
  /length <short|medium|long>
  /stats                 대화 통계
  /sessions              세션 목록
  /new                   새 세션
  /switch <id>           세션 전환
  /rename <이름>         현재 세션 이름 변경
  /delete <id>           세션 삭제
  /help                  도움말
  /quit                  종료";

/// REPL 명령
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Ask(String),
    Docs(Vec<String>),
    Summarize,
    Clear,
    Length(String),
    Stats,
    Sessions,
    New,
    Switch(String),
    Rename(String),
    Delete(String),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "docs" | "doc" if !arg.is_empty() => {
            ReplCommand::Docs(arg.split_whitespace().map(String::from).collect())
        }
        "summarize" | "summary" => ReplCommand::Summarize,
        "clear" => ReplCommand::Clear,
        "length" => ReplCommand::Length(arg.to_string()),
        "stats" => ReplCommand::Stats,
        "sessions" => ReplCommand::Sessions,
        "new" => ReplCommand::New,
        "switch" if !arg.is_empty() => ReplCommand::Switch(arg.to_string()),
        "rename" if !arg.is_empty() => ReplCommand::Rename(arg.to_string()),
        "delete" if !arg.is_empty() => ReplCommand::Delete(arg.to_string()),
        "help" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

/// REPL 실행
pub(super) async fn run_repl(app: &mut ChatApp) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("=== docqa ===");
    println!(
        "세션: {} | 답변 길이: {} | /help 로 명령어 확인",
        app.session().display_name,
        app.length()
    );
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if !handle(app, parse_command(trimmed)).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("[!] CTRL-C: /quit 으로 종료합니다.");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                tracing::error!("Readline error: {}", err);
                break;
            }
        }
    }

    println!("종료합니다.");
    Ok(())
}

/// 명령 처리 (false면 종료)
async fn handle(app: &mut ChatApp, command: ReplCommand) -> bool {
    match command {
        ReplCommand::Ask(question) => {
            let answer = app.ask(&question).await;
            println!();
            println!("{}", answer.text);
            println!("  ({})", answer.source.label());
            println!();
        }
        ReplCommand::Docs(inputs) => {
            let sources: Vec<DocumentSource> =
                inputs.iter().map(|i| DocumentSource::parse(i)).collect();
            process_and_report(app, &sources).await;
        }
        ReplCommand::Summarize => match app.summarize_documents().await {
            Some(answer) => {
                println!();
                println!("{}", answer.text);
                println!("  ({})", answer.source.label());
                println!();
            }
            None => println!("[!] 먼저 /docs 로 문서를 처리하세요."),
        },
        ReplCommand::Clear => {
            app.clear_history();
            println!("[OK] 대화 기록을 삭제했습니다.");
        }
        ReplCommand::Length(value) => {
            let length = LengthPreference::parse(&value);
            app.set_length(length);
            println!("[OK] 답변 길이: {}", length);
        }
        ReplCommand::Stats => {
            let stats = app.stats();
            println!("  질문: {}", stats.questions);
            println!("  답변: {}", stats.responses);
            println!("  문서 기반: {}", stats.document_based);
            println!("  일반 지식: {}", stats.general_knowledge);
            println!(
                "  문서: {}",
                if stats.documents_processed {
                    "처리됨"
                } else {
                    "없음"
                }
            );
        }
        ReplCommand::Sessions => match app.list_sessions() {
            Ok(sessions) => {
                let current = app.session().id.clone();
                for session in &sessions {
                    print_session(session, session.id == current);
                }
            }
            Err(e) => println!("[!] 세션 목록 조회 실패: {}", e),
        },
        ReplCommand::New => match app.new_session() {
            Ok(session) => println!("[OK] 새 세션: {}", session.display_name),
            Err(e) => println!("[!] 세션 생성 실패: {}", e),
        },
        ReplCommand::Switch(id) => match app.switch_session(&id) {
            Ok(session) => println!(
                "[OK] 세션 전환: {} (메시지 {} 개)",
                session.display_name,
                session.messages.len()
            ),
            Err(e) => println!("[!] {}", e),
        },
        ReplCommand::Rename(name) => {
            let id = app.session().id.clone();
            match app.rename_session(&id, &name) {
                Ok(session) => println!("[OK] 세션 이름: {}", session.display_name),
                Err(e) => println!("[!] 이름 변경 실패: {}", e),
            }
        }
        ReplCommand::Delete(id) => match app.delete_session(&id) {
            Ok(true) => println!(
                "[OK] 세션 삭제됨. 현재 세션: {}",
                truncate_text(&app.session().display_name, 40)
            ),
            Ok(false) => println!("[!] 삭제할 수 없습니다 (없는 세션이거나 마지막 세션)."),
            Err(e) => println!("[!] 세션 삭제 실패: {}", e),
        },
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => return false,
        ReplCommand::Unknown(line) => println!("[!] 알 수 없는 명령: {} (/help)", line),
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_question() {
        assert_eq!(
            parse_command("  What is in the file? "),
            ReplCommand::Ask("What is in the file?".to_string())
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            parse_command("/docs a.pdf https://x/doc.docx"),
            ReplCommand::Docs(vec!["a.pdf".to_string(), "https://x/doc.docx".to_string()])
        );
        assert_eq!(parse_command("/length long"), ReplCommand::Length("long".to_string()));
        assert_eq!(
            parse_command("/rename Claims review"),
            ReplCommand::Rename("Claims review".to_string())
        );
        assert_eq!(parse_command("/summarize"), ReplCommand::Summarize);
        assert_eq!(parse_command("/exit"), ReplCommand::Quit);
    }

    #[test]
    fn test_missing_argument_is_unknown() {
        assert_eq!(parse_command("/docs"), ReplCommand::Unknown("/docs".to_string()));
        assert_eq!(parse_command("/switch"), ReplCommand::Unknown("/switch".to_string()));
        assert_eq!(parse_command("/bogus"), ReplCommand::Unknown("/bogus".to_string()));
    }
}
