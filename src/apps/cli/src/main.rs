//! Mason CLI - streamed chat completions in the terminal

mod logging;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::tty::IsTty;
use mason_core::{
    ChatSession, ChatTransport, Conversation, HttpTransport, MasonConfig, SessionState,
    SubmitOutcome,
};
use render::TranscriptRenderer;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Mason chat client
#[derive(Parser, Debug)]
#[command(name = "mason")]
#[command(about = "Chat with a streaming completion endpoint")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Completion URL, bypassing the configured environment
    #[arg(long)]
    endpoint: Option<String>,

    /// Start with web search disabled
    #[arg(long)]
    no_network: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Network,
    Clear,
    Help,
    Prompt(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Command::Quit,
            "/network" => Command::Network,
            "/clear" => Command::Clear,
            "/help" => Command::Help,
            text => Command::Prompt(text),
        }
    }
}

const HELP: &str = "Commands: /network toggles web search, /clear starts over, /quit exits";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config =
        MasonConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.no_network {
        config.network = false;
    }
    let endpoint = match cli.endpoint {
        Some(endpoint) => endpoint,
        None => config.endpoint()?,
    };

    info!(
        "Mason CLI v{} starting: endpoint={}, environment={:?}",
        mason_core::VERSION,
        endpoint,
        config.environment
    );

    let transport = HttpTransport::new(endpoint).context("Failed to create HTTP client")?;
    let session = ChatSession::new(transport, &config);

    run_repl(&session).await
}

async fn run_repl<T: ChatTransport>(session: &ChatSession<T>) -> Result<()> {
    let mut renderer = TranscriptRenderer::new(std::io::stdout().is_tty());
    let mut updates = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Network => {
                let enabled = !session.snapshot().network;
                session.set_network(enabled);
                println!("Web search {}", if enabled { "on" } else { "off" });
            }
            Command::Clear => {
                if session.reset(Conversation::new()) {
                    println!("Conversation cleared");
                }
            }
            Command::Prompt(text) => {
                let outcome = submit_and_render(session, &mut updates, &mut renderer, text).await?;
                debug!("Submission finished: outcome={:?}", outcome);
                if outcome == SubmitOutcome::Busy {
                    warn!("A response is still streaming");
                }
            }
        }
        prompt()?;
    }

    info!("Mason CLI exiting");
    Ok(())
}

async fn submit_and_render<T: ChatTransport>(
    session: &ChatSession<T>,
    updates: &mut watch::Receiver<SessionState>,
    renderer: &mut TranscriptRenderer,
    text: &str,
) -> Result<SubmitOutcome> {
    let mut stdout = std::io::stdout();
    updates.mark_unchanged();

    let submission = session.submit(text);
    tokio::pin!(submission);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submission => break outcome,
            Ok(()) = updates.changed() => {
                let chunk = renderer.render(&updates.borrow_and_update());
                write!(stdout, "{}", chunk)?;
                stdout.flush()?;
            }
        }
    };

    if outcome != SubmitOutcome::EmptyInput {
        let chunk = renderer.render(&session.snapshot());
        writeln!(stdout, "{}", chunk)?;
    }
    Ok(outcome)
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}
