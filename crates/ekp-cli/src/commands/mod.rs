// ABOUTME: CLI command definitions using clap
// ABOUTME: Defines subcommands for documents, Q&A, agent, health, and chat

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod agent;
pub mod ask;
pub mod chat;
pub mod docs;
pub mod health;
pub mod history;
pub mod render;

#[derive(Parser)]
#[command(name = "ekp", about = "Enterprise knowledge platform client", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// AI service URL (e.g., http://localhost:8000)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Business service URL used for its health probe
    #[arg(long, global = true)]
    pub biz_url: Option<String>,

    /// Agent session id
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Log at INFO level for every crate
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage knowledge base documents
    #[command(subcommand)]
    Docs(DocsCommand),

    /// Ask a question against the knowledge base
    Ask {
        /// Question text
        question: String,

        /// Restrict retrieval to this document (repeatable)
        #[arg(long = "doc")]
        docs: Vec<i64>,

        /// Number of excerpts to retrieve
        #[arg(long)]
        top_k: Option<u32>,
    },

    /// Show answered questions
    History {
        /// Show a single record in full
        #[arg(long)]
        id: Option<i64>,
    },

    /// Talk to the tool-using agent
    #[command(subcommand)]
    Agent(AgentCommand),

    /// Check service health
    Health {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Interactive conversation
    Chat {
        /// Which assistant to talk to
        #[arg(value_enum, default_value_t = ChatMode::Qa)]
        mode: ChatMode,
    },
}

#[derive(Subcommand)]
pub enum DocsCommand {
    /// List all documents
    List,

    /// Show one document
    Show {
        /// Document ID
        id: i64,
    },

    /// Upload a file
    Upload {
        /// Path to the file
        path: PathBuf,

        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Delete a document
    Delete {
        /// Document ID to delete
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Send one question to the agent
    Query {
        /// Question text
        question: String,

        /// Print the reasoning steps
        #[arg(long)]
        steps: bool,
    },

    /// List tools the agent can call
    Tools,

    /// Show what the service remembers for the session
    History,

    /// Forget the session on the service
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChatMode {
    Qa,
    Agent,
}
