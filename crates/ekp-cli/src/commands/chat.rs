// ABOUTME: Implementation of 'ekp chat' interactive conversation
// ABOUTME: Line-based REPL over the Q&A or agent session with slash commands

use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use ekp_client::{AppStore, CacheKey, Message, SubmitError};

use super::render::{document_line, print_message};
use super::ChatMode;

/// One line of chat input.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    Question(String),
    Clear,       // /clear
    Docs,        // /docs
    Select(i64), // /select <id>
    Refresh,     // /refresh
    Tools,       // /tools
    Steps,       // /steps
    Help,        // /help
    Quit,        // /quit or /exit
    Unknown(String),
    Empty,
}

impl ChatInput {
    pub fn parse(input: &str) -> ChatInput {
        let input = input.trim();
        if input.is_empty() {
            return ChatInput::Empty;
        }
        let Some(rest) = input.strip_prefix('/') else {
            return ChatInput::Question(input.to_string());
        };

        let parts: Vec<&str> = rest.splitn(2, ' ').collect();
        match parts[0] {
            "clear" => ChatInput::Clear,
            "docs" => ChatInput::Docs,
            "select" => match parts.get(1).map(|s| s.trim().parse::<i64>()) {
                Some(Ok(id)) => ChatInput::Select(id),
                _ => ChatInput::Unknown("select (requires a document id, e.g. /select 42)".to_string()),
            },
            "refresh" => ChatInput::Refresh,
            "tools" => ChatInput::Tools,
            "steps" => ChatInput::Steps,
            "help" => ChatInput::Help,
            "quit" | "exit" => ChatInput::Quit,
            other => ChatInput::Unknown(other.to_string()),
        }
    }
}

pub async fn run(store: &AppStore, mode: ChatMode) -> Result<()> {
    let label = match mode {
        ChatMode::Qa => "Knowledge Q&A",
        ChatMode::Agent => "Agent",
    };
    println!("{}", label.bold());
    println!("{}", "Type a question, /help for commands, /quit to leave".dimmed());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut show_steps = false;

    loop {
        prompt(mode)?;
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        // EOF
        let Some(line) = line else { break };

        match ChatInput::parse(&line) {
            ChatInput::Empty => {}
            ChatInput::Question(question) => ask(store, mode, &question, show_steps).await?,
            ChatInput::Clear => {
                let removed = clear(store, mode).await;
                println!("{}", format!("Cleared {} messages", removed).dimmed());
            }
            ChatInput::Docs => docs(store, mode).await,
            ChatInput::Select(id) => select(store, mode, id).await,
            ChatInput::Refresh => refresh(store, mode).await,
            ChatInput::Tools => tools(store).await,
            ChatInput::Steps => {
                show_steps = !show_steps;
                let state = if show_steps { "on" } else { "off" };
                println!("{}", format!("Reasoning steps {}", state).dimmed());
            }
            ChatInput::Help => print_help(mode),
            ChatInput::Quit => break,
            ChatInput::Unknown(cmd) => {
                println!("{} /{}", "Unknown command:".yellow(), cmd);
            }
        }
    }

    Ok(())
}

fn prompt(mode: ChatMode) -> Result<()> {
    let name = match mode {
        ChatMode::Qa => "qa",
        ChatMode::Agent => "agent",
    };
    print!("{} ", format!("{}>", name).blue().bold());
    std::io::stdout().flush()?;
    Ok(())
}

async fn ask(store: &AppStore, mode: ChatMode, question: &str, show_steps: bool) -> Result<()> {
    let submitted = match mode {
        ChatMode::Qa => store.qa().submit(question).await,
        ChatMode::Agent => store.agent().submit(question).await,
    };
    let handle = match submitted {
        Ok(handle) => handle,
        Err(SubmitError::EmptyQuestion) => return Ok(()),
        Err(e) => {
            println!("{}", e.to_string().yellow());
            return Ok(());
        }
    };

    println!("{}", "thinking...".dimmed());
    tokio::select! {
        joined = handle => joined?,
        _ = tokio::signal::ctrl_c() => {
            // Clearing orphans the in-flight reply so it is dropped on arrival
            let removed = clear(store, mode).await;
            info!(removed, "question cancelled; session cleared");
            println!("{}", "Cancelled; conversation cleared".yellow());
            return Ok(());
        }
    }

    if let Some(reply) = messages(store, mode).await.last() {
        print_message(reply, show_steps);
    }
    println!();
    Ok(())
}

async fn messages(store: &AppStore, mode: ChatMode) -> Vec<Message> {
    match mode {
        ChatMode::Qa => store.qa().messages().await,
        ChatMode::Agent => store.agent().messages().await,
    }
}

async fn clear(store: &AppStore, mode: ChatMode) -> usize {
    match mode {
        ChatMode::Qa => store.qa().clear().await,
        ChatMode::Agent => store.agent().clear().await,
    }
}

async fn docs(store: &AppStore, mode: ChatMode) {
    if mode != ChatMode::Qa {
        println!("{}", "Document selection applies to Q&A chat only".dimmed());
        return;
    }
    if !store.qa().toggle_selector().await {
        println!("{}", "Document selector hidden".dimmed());
        return;
    }

    let docs = match store.cache().documents().await {
        Ok(docs) => docs,
        Err(e) => {
            println!("{} {}", "Failed to load documents:".red(), e);
            return;
        }
    };
    if docs.is_empty() {
        println!("{}", "No documents uploaded".dimmed());
        return;
    }

    let selection = store.qa().selection().await;
    let scope = if selection.is_empty() {
        "searching all documents".to_string()
    } else {
        format!("{} selected", selection.len())
    };
    println!("{} {}", "Documents".bold(), format!("({})", scope).dimmed());
    for doc in docs.iter() {
        println!("{}", document_line(doc, selection.contains(doc.id)));
    }
}

async fn select(store: &AppStore, mode: ChatMode, id: i64) {
    if mode != ChatMode::Qa {
        println!("{}", "Document selection applies to Q&A chat only".dimmed());
        return;
    }
    match store.cache().documents().await {
        Ok(docs) if !docs.iter().any(|d| d.id == id) => {
            println!("{} #{}", "No such document:".yellow(), id);
            return;
        }
        Ok(_) => {}
        Err(e) => {
            println!("{} {}", "Failed to load documents:".red(), e);
            return;
        }
    }

    if store.qa().toggle_document(id).await {
        println!("{} #{}", "Selected".green(), id);
    } else {
        println!("{} #{}", "Unselected".dimmed(), id);
    }
}

async fn refresh(store: &AppStore, mode: ChatMode) {
    let key = match mode {
        ChatMode::Qa => CacheKey::Documents,
        ChatMode::Agent => CacheKey::AgentTools,
    };
    match store.cache().refresh(key).await {
        Ok(_) => println!("{}", format!("Refreshed {}", key).dimmed()),
        Err(e) => println!("{} {}", format!("Failed to refresh {}:", key).red(), e),
    }
}

async fn tools(store: &AppStore) {
    match store.cache().agent_tools().await {
        Ok(list) if list.tools.is_empty() => println!("{}", "No tools available".dimmed()),
        Ok(list) => {
            for tool in &list.tools {
                println!("{} {} {}", "●".green(), tool.name.bold(), tool.description.dimmed());
            }
        }
        Err(e) => println!("{} {}", "Failed to load tools:".red(), e),
    }
}

fn print_help(mode: ChatMode) {
    println!("{}", "Commands".bold());
    println!("  /clear          {}", "Start a new conversation".dimmed());
    if mode == ChatMode::Qa {
        println!("  /docs           {}", "Show or hide the document selector".dimmed());
        println!("  /select <id>    {}", "Toggle a document in the search scope".dimmed());
    } else {
        println!("  /tools          {}", "List agent tools".dimmed());
        println!("  /steps          {}", "Toggle reasoning step output".dimmed());
    }
    println!("  /refresh        {}", "Reload cached data".dimmed());
    println!("  /quit           {}", "Leave chat".dimmed());
}
