// ABOUTME: Implementation of 'ekp ask' command
// ABOUTME: Sends one question through the Q&A session and prints the answer

use anyhow::{bail, Result};

use ekp_client::{AppStore, MessageState};

use super::render::print_message;

pub async fn run(store: &AppStore, question: &str, docs: &[i64]) -> Result<()> {
    let qa = store.qa();
    for id in docs {
        if !qa.selection().await.contains(*id) {
            qa.toggle_document(*id).await;
        }
    }

    qa.submit(question).await?.await?;

    let messages = qa.messages().await;
    let Some(reply) = messages.last() else {
        bail!("No answer received");
    };
    print_message(reply, false);

    if reply.state == MessageState::Failed {
        bail!("Question could not be answered");
    }
    Ok(())
}
