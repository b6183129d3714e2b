// ABOUTME: Implementation of 'ekp health' command
// ABOUTME: Probes the AI and business services once, or keeps polling with --watch

use anyhow::Result;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use ekp_client::{AppStore, CacheKey, CachedValue, ClientError, HealthStatus};

pub async fn run(store: &AppStore, watch: bool) -> Result<()> {
    if watch {
        return watch_health(store).await;
    }

    let (ai, biz) = tokio::join!(store.cache().health(), store.cache().biz_health());
    println!("{}", status_line("AI service", &ai));
    println!("{}", status_line("Business service", &biz));

    if ai.is_err() || biz.is_err() {
        anyhow::bail!("One or more services are unreachable");
    }
    Ok(())
}

async fn watch_health(store: &AppStore) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut ai = store.cache().poll(CacheKey::Health, cancel.clone());
    let mut biz = store.cache().poll(CacheKey::BizHealth, cancel.clone());

    println!(
        "{}",
        format!(
            "Polling every {}s, Ctrl-C to stop",
            store.config().health_poll_secs
        )
        .dimmed()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = ai.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(result) = ai.borrow_and_update().clone() {
                    println!("{}", status_line("AI service", &as_health(result)));
                }
            }
            changed = biz.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(result) = biz.borrow_and_update().clone() {
                    println!("{}", status_line("Business service", &as_health(result)));
                }
            }
        }
    }

    cancel.cancel();
    Ok(())
}

fn as_health(result: Result<CachedValue, ClientError>) -> Result<HealthStatus, ClientError> {
    match result? {
        CachedValue::Health(status) => Ok(status),
        other => Err(ClientError::Decode {
            operation: "health",
            message: format!("unexpected cached value {:?}", other),
        }),
    }
}

/// One status line per service, e.g. `● AI service healthy (ekp-ai-service)`.
pub fn status_line(name: &str, result: &Result<HealthStatus, ClientError>) -> String {
    match result {
        Ok(status) if status.is_healthy() => format!(
            "{} {} {}{}",
            "●".green(),
            name.bold(),
            status.status.green(),
            status
                .service
                .as_deref()
                .map(|s| format!(" ({})", s).dimmed().to_string())
                .unwrap_or_default()
        ),
        Ok(status) => format!("{} {} {}", "●".yellow(), name.bold(), status.status.yellow()),
        Err(e) => format!("{} {} {}", "○".red(), name.bold(), e.to_string().red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: &str) -> HealthStatus {
        HealthStatus {
            status: s.to_string(),
            service: Some("ekp-ai-service".to_string()),
        }
    }

    #[test]
    fn test_status_line_healthy() {
        colored::control::set_override(false);
        let line = status_line("AI service", &Ok(status("healthy")));
        assert_eq!(line, "● AI service healthy (ekp-ai-service)");
    }

    #[test]
    fn test_status_line_degraded() {
        colored::control::set_override(false);
        let line = status_line("AI service", &Ok(status("degraded")));
        assert_eq!(line, "● AI service degraded");
    }

    #[test]
    fn test_status_line_unreachable() {
        colored::control::set_override(false);
        let err = ClientError::Status {
            operation: "health",
            status: 502,
            body: String::new(),
        };
        let line = status_line("Business service", &Err(err));
        assert!(line.starts_with("○ Business service"));
        assert!(line.contains("502"));
    }
}
