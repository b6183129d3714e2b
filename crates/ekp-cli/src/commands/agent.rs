// ABOUTME: Implementation of 'ekp agent' commands
// ABOUTME: Queries the agent, lists its tools, and shows or clears the session

use anyhow::{bail, Result};
use colored::Colorize;

use ekp_client::{AppStore, MessageState};

use super::render::print_message;
use super::AgentCommand;

pub async fn run(store: &AppStore, cmd: AgentCommand) -> Result<()> {
    match cmd {
        AgentCommand::Query { question, steps } => query(store, &question, steps).await,
        AgentCommand::Tools => tools(store).await,
        AgentCommand::History => history(store).await,
        AgentCommand::Clear => clear(store).await,
    }
}

async fn query(store: &AppStore, question: &str, show_steps: bool) -> Result<()> {
    let agent = store.agent();
    agent.submit(question).await?.await?;

    let messages = agent.messages().await;
    let Some(reply) = messages.last() else {
        bail!("No answer received");
    };
    print_message(reply, show_steps);

    if reply.state == MessageState::Failed {
        bail!("Agent could not answer");
    }
    Ok(())
}

async fn tools(store: &AppStore) -> Result<()> {
    let list = store.cache().agent_tools().await?;

    if list.tools.is_empty() {
        println!("{}", "No tools available".dimmed());
        return Ok(());
    }

    println!("{}", format!("Agent Tools ({})", list.tools.len()).bold());
    println!();
    for tool in &list.tools {
        println!("{} {}", "●".green(), tool.name.bold());
        if !tool.description.is_empty() {
            println!("    {}", tool.description.dimmed());
        }
    }
    Ok(())
}

async fn history(store: &AppStore) -> Result<()> {
    let agent = store.agent();
    let remote = agent.remote_history().await?;

    if remote.history.is_empty() {
        println!(
            "{}",
            format!("No history for session {}", agent.session_id()).dimmed()
        );
        return Ok(());
    }

    println!("{}", format!("Session {}", remote.session_id).bold());
    println!();
    for turn in &remote.history {
        let role = match turn.role.as_str() {
            "user" => turn.role.blue().bold(),
            _ => turn.role.green().bold(),
        };
        println!("{}> {}", role, turn.content);
    }
    Ok(())
}

async fn clear(store: &AppStore) -> Result<()> {
    let agent = store.agent();
    // Surface the remote result here; the session itself treats it as best effort
    store.api().clear_agent_session(agent.session_id()).await?;
    println!("{} Cleared session {}", "✓".green(), agent.session_id());
    Ok(())
}
