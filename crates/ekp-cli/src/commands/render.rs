// ABOUTME: Terminal rendering shared by the one-shot commands and chat
// ABOUTME: Formats documents, answers with sources, agent steps, and status words

use colored::Colorize;
use ekp_client::{AgentStep, Document, DocumentStatus, Message, MessageState, QaSource, Role};

/// Max characters of a source excerpt shown inline.
const EXCERPT_CHARS: usize = 120;

/// Truncate to `max_chars` characters, adding "..." if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

pub fn format_status(status: DocumentStatus) -> String {
    let label = status.label();
    match status {
        DocumentStatus::Completed => label.green().to_string(),
        DocumentStatus::Pending | DocumentStatus::Processing => label.yellow().to_string(),
        DocumentStatus::Failed => label.red().to_string(),
    }
}

/// One line per document, with a marker for selected ones.
pub fn document_line(doc: &Document, selected: bool) -> String {
    let marker = if selected { "●".green() } else { "○".dimmed() };
    format!(
        "{} {} {} {} {}",
        marker,
        format!("#{}", doc.id).dimmed(),
        doc.title.bold(),
        format!("({}, {})", doc.display_size(), doc.file_type).dimmed(),
        format_status(doc.status)
    )
}

pub fn print_sources(sources: &[QaSource]) {
    if sources.is_empty() {
        return;
    }
    println!("  {}", "Sources".dimmed());
    for (i, source) in sources.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("[{}]", i + 1).dimmed(),
            source.document_title.bold(),
            format!("{}%", source.relevance_percent()).cyan()
        );
        println!("      {}", truncate(source.content.trim(), EXCERPT_CHARS).dimmed());
    }
}

pub fn print_steps(steps: &[AgentStep]) {
    for (i, step) in steps.iter().enumerate() {
        println!("  {} {}", format!("Step {}", i + 1).bold(), step.thought);
        if !step.action.is_empty() {
            println!(
                "    {}: {} {}",
                "Action".dimmed(),
                step.action,
                step.action_input
            );
        }
        if !step.observation.is_empty() {
            println!("    {}: {}", "Observation".dimmed(), step.observation);
        }
    }
}

pub fn print_tools_used(tools: &[String]) {
    if !tools.is_empty() {
        println!("  {}: {}", "Tools".dimmed(), tools.join(", ").cyan());
    }
}

/// Print one conversation message.
pub fn print_message(message: &Message, show_steps: bool) {
    match (message.role, message.state) {
        (Role::User, _) => println!("{} {}", "you>".blue().bold(), message.content),
        (Role::Assistant, MessageState::Pending) => println!("{}", "thinking...".dimmed()),
        (Role::Assistant, MessageState::Failed) => println!("{}", message.content.red()),
        (Role::Assistant, MessageState::Resolved) => {
            println!("{}", message.content);
            if let Some(sources) = &message.sources {
                print_sources(sources);
            }
            if show_steps {
                if let Some(steps) = &message.reasoning_steps {
                    print_steps(steps);
                }
            }
            if let Some(tools) = &message.tools_used {
                print_tools_used(tools);
            }
        }
    }
}
