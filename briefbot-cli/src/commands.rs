//! Subcommand handlers.

use crate::{Commands, ConfigAction};
use briefbot_core::channels::telegram::create_telegram_channel;
use briefbot_core::channels::{Channel, ChatSink, SmtpMailer};
use briefbot_core::config::{BotConfig, load_config};
use briefbot_core::providers::GeminiSummarizer;
use briefbot_core::{Adapters, Dispatcher, SessionStore, run_polling};
use briefbot_tools::{GenPdfRenderer, SerpApiSearch};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Run => run_bot(workspace, config_file).await,
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<BotConfig> {
    load_config(Some(workspace), config_file)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".briefbot");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = BotConfig::default().to_toml()?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            println!("Secrets can be left empty and supplied via TELEGRAM_TOKEN, SERPAPI_API_KEY, GEMINI_API_KEY, EMAIL_USER and EMAIL_PASSWORD.");
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_file)?;
            println!("{}", config.redacted().to_toml()?);
            Ok(())
        }
        ConfigAction::Validate => {
            let config = load(workspace, config_file)?;
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
            println!("Configuration is valid.");
            Ok(())
        }
    }
}

/// Build the adapters, connect to Telegram, and poll until Ctrl-C.
async fn run_bot(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<()> {
    let config = load(workspace, config_file)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let adapters = Adapters {
        search: Arc::new(SerpApiSearch::new(&config.search)?),
        summarizer: Arc::new(GeminiSummarizer::new(&config.llm)?),
        renderer: Arc::new(GenPdfRenderer::new(&config.report)),
        email: Arc::new(SmtpMailer::new(config.email.clone())),
    };

    let mut channel = create_telegram_channel(config.telegram.clone());
    channel.connect().await?;
    let channel = Arc::new(channel);
    let sink: Arc<dyn ChatSink> = channel.clone();

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(SessionStore::new()),
        sink,
        adapters,
        config.search.result_limit,
    ));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal_cancel.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    info!(
        model = config.llm.model.as_str(),
        result_limit = config.search.result_limit,
        allowed_chats = config.telegram.allowed_chat_ids.len(),
        "Briefbot is running"
    );
    run_polling(channel.as_ref(), dispatcher, cancel).await;

    if let Ok(mut channel) = Arc::try_unwrap(channel) {
        channel.disconnect().await?;
    }
    info!("Briefbot stopped");
    Ok(())
}
