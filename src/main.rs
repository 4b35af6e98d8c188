//! `aig`: chat with an OpenAI-compatible endpoint, or convert Markdown
//! guides into Word documents.

use aig_kit::doc_processor::{self, ConvertError, GUIDES_DIR};
use aig_kit::{ChatClient, ChatMessage, Completion, LlmConfig};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aig", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file merged over ./aig.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one prompt and print the answer
    Chat {
        prompt: String,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        /// System message sent before the prompt
        #[arg(long)]
        system: Option<String>,

        /// Print fragments as they arrive (single attempt, no retry)
        #[arg(long)]
        stream: bool,
    },
    /// Convert every .md file in a directory to .docx
    Convert {
        /// Defaults to docs/guides under the working directory
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Chat {
            prompt,
            model,
            base_url,
            system,
            stream,
        } => {
            let mut config = LlmConfig::load(cli.config.as_deref())
                .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }

            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(ChatMessage::system(system));
            }
            messages.push(ChatMessage::user(prompt));

            run_chat(config, &messages, stream).await
        }
        Command::Convert { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()
                    .context("Cannot resolve working directory")?
                    .join(GUIDES_DIR),
            };
            run_convert(dir)
        }
    }
}

async fn run_chat(config: LlmConfig, messages: &[ChatMessage], stream: bool) -> Result<()> {
    info!(model = %config.model, base_url = %config.base_url, "Starting chat");
    let client = ChatClient::new(config)?;

    if stream {
        let mut fragments = client.stream_completion(messages).await?;
        let mut stdout = std::io::stdout().lock();
        while let Some(fragment) = fragments.next().await {
            stdout.write_all(fragment.as_bytes())?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
        return Ok(());
    }

    match client.complete(messages).await {
        Completion::Text(text) => {
            println!("{}", text);
            Ok(())
        }
        exhausted @ Completion::ExhaustedRetries { .. } => {
            bail!("{}", exhausted.into_legacy_string())
        }
    }
}

fn run_convert(dir: PathBuf) -> Result<()> {
    match doc_processor::convert_directory(&dir) {
        Ok(written) => {
            for path in written {
                println!("Saved {}", path.display());
            }
            Ok(())
        }
        Err(ConvertError::MissingDirectory(dir)) => {
            println!("Directory not found: {}", dir.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
