//! Interactive terminal chat.
//!
//! Lines starting with `/` are commands; anything else is a question.
//! Input goes through `rustyline`, so arrow-key editing and in-session
//! history work as in a shell. Ctrl-C or Ctrl-D exits.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/add <file.pdf>...` | Index more PDFs (clears history on success) |
//! | `/reset` | Clear indexed documents and history |
//! | `/stats` | Show index statistics |
//! | `/history` | Print the conversation so far |
//! | `/quit` | Exit |

use anyhow::Result;
use std::path::PathBuf;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::controller::RagController;
use crate::models::{IngestResult, Role, UploadedFile};
use crate::session::SessionState;

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Add(Vec<PathBuf>),
    Reset,
    Stats,
    History,
    Quit,
    Help,
    Ask(String),
    Empty,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Input::Ask(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "add" => Input::Add(parts.map(PathBuf::from).collect()),
        "reset" | "clear" => Input::Reset,
        "stats" => Input::Stats,
        "history" => Input::History,
        "quit" | "exit" => Input::Quit,
        _ => Input::Help,
    }
}

/// Runs the chat loop on stdin/stdout, indexing `files` first.
pub async fn run_chat(mut controller: RagController, files: Vec<PathBuf>) -> Result<()> {
    let mut session = SessionState::new();

    if !files.is_empty() {
        add_files(&mut session, &mut controller, &files).await;
    }

    println!("ChatRAG: talk with your documents. Type /help for commands.");

    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match tokio::task::block_in_place(|| editor.readline("> ")) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        match parse_input(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Add(paths) if paths.is_empty() => println!("usage: /add <file.pdf>..."),
            Input::Add(paths) => add_files(&mut session, &mut controller, &paths).await,
            Input::Reset => {
                session.reset(&mut controller);
                println!("Document memory cleared.");
            }
            Input::Stats => {
                let stats = controller.stats();
                println!(
                    "entries: {}  sources: {}  dims: {}",
                    stats.entries,
                    stats.sources,
                    stats.dims.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                );
            }
            Input::History => {
                for message in session.messages() {
                    let who = match message.role {
                        Role::User => "you",
                        Role::Assistant => "assistant",
                    };
                    println!("[{}] {}", who, message.content);
                }
            }
            Input::Ask(prompt) => match session.send(&controller, &prompt).await {
                Ok(answer) => println!("{}\n", answer),
                Err(e) => eprintln!("error: {:#}", e),
            },
        }
    }

    Ok(())
}

async fn add_files(session: &mut SessionState, controller: &mut RagController, paths: &[PathBuf]) {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        match UploadedFile::from_path(path) {
            Ok(file) => uploads.push(file),
            Err(e) => eprintln!("skipping {}: {:#}", path.display(), e),
        }
    }

    println!("Indexing {} document(s)...", uploads.len());
    let result = session.upload(controller, &uploads).await;
    print_ingest_result(&result);
}

fn print_ingest_result(result: &IngestResult) {
    if result.success {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
    }
}

fn print_help() {
    println!("/add <file.pdf>...  index more PDFs");
    println!("/reset              clear indexed documents and history");
    println!("/stats              show index statistics");
    println!("/history            print the conversation");
    println!("/quit               exit");
}
