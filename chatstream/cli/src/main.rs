//! Chatstream - Terminal Chat Client
//!
//! Line-oriented surface over `chatstream-core`. Each input line is sent to
//! the configured endpoint and the reply is printed as it streams in.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session against the default endpoint
//! chatstream
//!
//! # One question, reply on stdout
//! chatstream "What is a frame decoder?"
//!
//! # Custom endpoint
//! chatstream --endpoint http://10.0.0.5:8000/chat
//!
//! # Offline replay of a recorded event stream, in 3-byte chunks
//! chatstream --replay reply.sse --chunk-size 3 "Hi"
//!
//! # Verbose logging (to stderr)
//! RUST_LOG=chatstream_core=debug chatstream
//! ```
//!
//! # Signals
//!
//! - `SIGINT`: stop the reply being streamed, or exit when idle

mod command;
mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatstream_core::{
    load_config, ChatBackend, ChatController, ConfigOverrides, HttpBackend, ReplayBackend,
    SessionOutcome,
};

use command::{Command, HELP};
use render::Renderer;

/// Log filter when neither `RUST_LOG` nor the config file sets one
const DEFAULT_LOG_FILTER: &str = "chatstream=info,chatstream_core=info";

/// Chatstream - streaming chat in the terminal
#[derive(Parser, Debug)]
#[command(name = "chatstream")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Send this message, print the reply and exit
    message: Option<String>,

    /// Chat endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "CHATSTREAM_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replay a recorded event-stream body instead of contacting the endpoint
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Chunk size in bytes for --replay
    #[arg(long, value_name = "BYTES", default_value_t = 7)]
    chunk_size: usize,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(endpoint) = &self.endpoint {
            overrides = overrides.with_endpoint(endpoint.clone());
        }
        if let Some(path) = &self.config {
            overrides = overrides.with_config_path(path.clone());
        }
        overrides
    }
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over the config file's `[logging] filter`.
fn init_logging(file_filter: Option<&str>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(file_filter.unwrap_or(DEFAULT_LOG_FILTER))
            .context("Invalid log filter in config file")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args.overrides()).context("Failed to load configuration")?;
    init_logging(config.log_filter.as_deref())?;

    if let Some(path) = &config.config_file_path {
        info!(path = %path.display(), "Using config file");
    }

    match &args.replay {
        Some(path) => {
            let body = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read replay file: {}", path.display()))?;
            info!(
                path = %path.display(),
                bytes = body.len(),
                chunk_size = args.chunk_size,
                "Replaying recorded stream"
            );
            let backend = ReplayBackend::new(body, args.chunk_size);
            run(ChatController::new(backend), args.message).await
        }
        None => {
            info!(
                endpoint = %config.client.endpoint,
                source = %config.endpoint_source,
                "Using endpoint"
            );
            let backend = HttpBackend::new(&config.client)?;
            run(ChatController::new(backend), args.message).await
        }
    }
}

async fn run<B: ChatBackend + 'static>(
    controller: ChatController<B>,
    message: Option<String>,
) -> Result<()> {
    match message {
        Some(message) => run_once(&controller, &message).await,
        None => run_interactive(&controller).await,
    }
}

async fn emit(stdout: &mut Stdout, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Send one message, stream the reply to stdout, and report failure
async fn run_once<B: ChatBackend>(controller: &ChatController<B>, message: &str) -> Result<()> {
    let mut renderer = Renderer::reply_only();
    let mut updates = controller.subscribe();
    let mut stdout = tokio::io::stdout();

    let session = controller.send_message(message);
    tokio::pin!(session);

    let outcome = loop {
        tokio::select! {
            outcome = &mut session => break outcome,
            Ok(()) = updates.changed() => {
                let text = renderer.render(&updates.borrow_and_update());
                emit(&mut stdout, &text).await?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                controller.stop();
            }
        }
    };

    let text = renderer.render(&controller.snapshot());
    emit(&mut stdout, &text).await?;
    let text = renderer.finish();
    emit(&mut stdout, &text).await?;

    match outcome {
        SessionOutcome::Completed { .. } | SessionOutcome::Cancelled => Ok(()),
        SessionOutcome::Failed { error } => Err(error).context("Reply failed"),
        SessionOutcome::Rejected => bail!("Nothing to send: the message is empty"),
    }
}

/// Read lines until `/quit`, end of input, or Ctrl-C while idle
async fn run_interactive<B: ChatBackend + 'static>(controller: &ChatController<B>) -> Result<()> {
    let mut renderer = Renderer::transcript();
    let mut updates = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    eprintln!("{HELP}");

    loop {
        tokio::select! {
            Ok(()) = updates.changed() => {
                let text = renderer.render(&updates.borrow_and_update());
                emit(&mut stdout, &text).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match Command::parse(&line) {
                    Command::Send(text) => {
                        // The task is detached; its outcome is already in the snapshot
                        let _ = controller.spawn_send(&text);
                    }
                    Command::Stop => controller.stop(),
                    Command::Clear => controller.clear(),
                    Command::Quit => break,
                    Command::Help => eprintln!("{HELP}"),
                    Command::Unknown(name) => eprintln!("Unknown command {name}. {HELP}"),
                    Command::Empty => {}
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if controller.is_streaming() {
                    controller.stop();
                } else {
                    break;
                }
            }
        }
    }

    controller.stop();
    let text = renderer.render(&controller.snapshot());
    emit(&mut stdout, &text).await?;
    let text = renderer.finish();
    emit(&mut stdout, &text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["chatstream"]).unwrap();
        assert!(args.message.is_none());
        assert!(args.endpoint.is_none());
        assert!(args.replay.is_none());
        assert_eq!(args.chunk_size, 7);
    }

    #[test]
    fn test_args_one_shot_with_overrides() {
        let args = Args::try_parse_from([
            "chatstream",
            "--endpoint",
            "http://127.0.0.1:9000/chat",
            "--replay",
            "reply.sse",
            "--chunk-size",
            "3",
            "Hi there",
        ])
        .unwrap();

        assert_eq!(args.message.as_deref(), Some("Hi there"));
        assert_eq!(args.chunk_size, 3);
        assert_eq!(args.replay, Some(PathBuf::from("reply.sse")));

        let overrides = args.overrides();
        assert_eq!(
            overrides.endpoint.as_deref(),
            Some("http://127.0.0.1:9000/chat")
        );
    }

    #[test]
    fn test_default_log_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
