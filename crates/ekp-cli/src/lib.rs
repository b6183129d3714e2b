// ABOUTME: Library exports for the ekp CLI
// ABOUTME: Resolves client settings and dispatches parsed commands

use anyhow::{Context, Result};
use ekp_client::{AppStore, ClientConfig};
use tracing::debug;

pub mod commands;

use commands::{Cli, Command};

/// Settings given on the command line. Each one beats env and config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub biz_url: Option<String>,
    pub session: Option<String>,
    pub top_k: Option<u32>,
}

impl Overrides {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_url: cli.api_url.clone(),
            biz_url: cli.biz_url.clone(),
            session: cli.session.clone(),
            top_k: match cli.command {
                Command::Ask { top_k, .. } => top_k,
                _ => None,
            },
        }
    }

    pub fn apply(self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = self.api_url {
            config.api_url = url;
        }
        if let Some(url) = self.biz_url {
            config.biz_url = url;
        }
        if let Some(session) = self.session {
            config.agent_session_id = session;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        config
    }
}

/// Resolve settings (arg > env > config file > default).
pub fn resolve_config(
    file: ClientConfig,
    env: impl Fn(&str) -> Option<String>,
    overrides: Overrides,
) -> Result<ClientConfig> {
    let config = overrides.apply(file.with_env(env));
    config.validate().context("Invalid client settings")?;
    Ok(config)
}

/// Build the store from all settings sources and run `cli.command`.
pub async fn run_command(cli: Cli) -> Result<()> {
    let overrides = Overrides::from_cli(&cli);
    let file = ClientConfig::from_default_file().context("Failed to load config file")?;
    let config = resolve_config(file, |key| std::env::var(key).ok(), overrides)?;
    debug!(api = %config.api_url, biz = %config.biz_url, session = %config.agent_session_id, "resolved settings");
    let store = AppStore::new(config)?;

    match cli.command {
        Command::Docs(cmd) => commands::docs::run(&store, cmd).await,
        Command::Ask { question, docs, .. } => commands::ask::run(&store, &question, &docs).await,
        Command::History { id } => commands::history::run(&store, id).await,
        Command::Agent(cmd) => commands::agent::run(&store, cmd).await,
        Command::Health { watch } => commands::health::run(&store, watch).await,
        Command::Chat { mode } => commands::chat::run(&store, mode).await,
    }
}
