// ABOUTME: Implementation of 'ekp docs' commands
// ABOUTME: Lists, shows, uploads, and deletes knowledge base documents

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use ekp_client::{AppStore, FileUpload, MutationOutcome};

use super::render::{document_line, format_status};
use super::DocsCommand;

pub async fn run(store: &AppStore, cmd: DocsCommand) -> Result<()> {
    match cmd {
        DocsCommand::List => list(store).await,
        DocsCommand::Show { id } => show(store, id).await,
        DocsCommand::Upload { path, mime } => upload(store, &path, mime).await,
        DocsCommand::Delete { id } => delete(store, id).await,
    }
}

async fn list(store: &AppStore) -> Result<()> {
    let docs = store.cache().documents().await?;

    if docs.is_empty() {
        println!("{}", "No documents uploaded".dimmed());
        return Ok(());
    }

    println!("{}", format!("Documents ({})", docs.len()).bold());
    println!();
    for doc in docs.iter() {
        println!("{}", document_line(doc, false));
    }
    Ok(())
}

async fn show(store: &AppStore, id: i64) -> Result<()> {
    let doc = store.api().get_document(id).await?;

    println!("{}", doc.title.bold());
    println!("  {}:      {}", "ID".dimmed(), doc.id);
    println!("  {}:  {}", "Status".dimmed(), format_status(doc.status));
    println!("  {}:    {}", "Type".dimmed(), doc.file_type);
    println!("  {}:    {}", "Size".dimmed(), doc.display_size());
    if let Some(path) = &doc.file_path {
        println!("  {}:    {}", "Path".dimmed(), path);
    }
    println!("  {}: {}", "Created".dimmed(), doc.created_at);
    if let Some(updated) = &doc.updated_at {
        println!("  {}: {}", "Updated".dimmed(), updated);
    }
    Ok(())
}

async fn upload(store: &AppStore, path: &Path, mime: Option<String>) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_string();

    let mut file = FileUpload::new(file_name, bytes);
    if let Some(mime) = mime.or_else(|| guess_mime(path).map(str::to_string)) {
        file = file.with_mime_type(mime);
    }

    match store.upload(file).await? {
        MutationOutcome::Uploaded(resp) => {
            println!(
                "{} Uploaded {} {}",
                "✓".green(),
                resp.title.bold(),
                format!("(id {}, {})", resp.id, resp.status).dimmed()
            );
            if !resp.message.is_empty() {
                println!("  {}", resp.message.dimmed());
            }
        }
        MutationOutcome::Deleted(_) => {}
    }
    Ok(())
}

async fn delete(store: &AppStore, id: i64) -> Result<()> {
    store.delete(id).await?;
    println!("{} Deleted document {}", "✓".green(), id);
    Ok(())
}

/// MIME type for the file kinds the service ingests.
pub fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "md" | "markdown" => Some("text/markdown"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_known_extensions() {
        assert_eq!(guess_mime(Path::new("a/policy.PDF")), Some("application/pdf"));
        assert_eq!(guess_mime(Path::new("notes.txt")), Some("text/plain"));
        assert_eq!(guess_mime(Path::new("README.md")), Some("text/markdown"));
    }

    #[test]
    fn test_guess_mime_unknown() {
        assert_eq!(guess_mime(Path::new("archive.zip")), None);
        assert_eq!(guess_mime(Path::new("Makefile")), None);
    }
}
