//! Console Bot Example
//!
//! Reads chat lines from stdin, runs them through the Arbiter pipeline and
//! prints the replies. Lookups are served from small in-memory tables with
//! an artificial delay, so concurrent dispatch and ordering can be observed.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot
//! cargo run --package console-bot -- --channel '#mtg' --nick alice
//! ```
//!
//! Try `!help`, `!lightning bolt !fog`, `[[Counterspell]]`, `!rule 601.2`, or the
//! same card twice in a channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arbiter::prelude::*;
use arbiter::runtime::config::LogOutput;
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

const HELP: &str = "Look up cards with !name, &name or [[name]]. \
    Rules: !rule <number>. Policy: !mtr";

#[derive(Parser, Debug)]
#[command(name = "console-bot", about = "Try the Arbiter command router from a terminal")]
struct Args {
    /// Configuration file (defaults to ./arbiter.toml if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat input as channel messages to this channel instead of private messages.
    #[arg(long)]
    channel: Option<String>,

    /// Sender name used for input lines.
    #[arg(long, default_value = "you")]
    nick: String,

    /// Simulated lookup latency in milliseconds.
    #[arg(long, default_value_t = 150)]
    latency_ms: u64,
}

// ============================================================================
// Sink
// ============================================================================

/// Prints each reply line to stdout.
struct ConsoleSink;

#[async_trait]
impl ReplySink for ConsoleSink {
    async fn send(&self, destination: &Destination, line: &str) -> SinkResult<()> {
        println!("[{destination}] {line}");
        Ok(())
    }
}

// ============================================================================
// Routes
// ============================================================================

fn card_table() -> TableResolver {
    TableResolver::new("cards")
        .entry(
            "lightning bolt",
            "Lightning Bolt {R} | Instant | Lightning Bolt deals 3 damage to any target.",
        )
        .entry(
            "fog",
            "Fog {G} | Instant | Prevent all combat damage that would be dealt this turn.",
        )
        .entry(
            "counterspell",
            "Counterspell {U}{U} | Instant | Counter target spell.",
        )
        .entry(
            "jace, the mind sculptor",
            "Jace, the Mind Sculptor {2}{U}{U} | Legendary Planeswalker - Jace\n\
             +2: Look at the top card of target player's library. You may put that card on the bottom of that player's library.\n\
             0: Draw three cards, then put two cards from your hand on top of your library in any order.\n\
             -1: Return target creature to its owner's hand.\n\
             -12: Exile all cards from target player's library, then that player shuffles their hand into their library.",
        )
}

fn rule_table() -> TableResolver {
    TableResolver::new("rules")
        .entry(
            "601.2",
            "601.2. To cast a spell is to take it from where it is, put it on the stack, \
             and pay its costs.",
        )
        .entry("702.2a", "702.2a Deathtouch is a static ability.")
}

fn router(latency: Duration) -> Router {
    let cards = Arc::new(card_table());
    let lookup = FnResolver::new("cards", move |query: String| {
        let cards = Arc::clone(&cards);
        async move {
            tokio::time::sleep(latency).await;
            cards.resolve(&query).await
        }
    });

    Router::new()
        .with(Route::new(StaticResolver::new("help", HELP)).keyword("help").name("help"))
        .with(
            Route::new(StaticResolver::new("policy", "https://magic.wizards.com/en/rules"))
                .keyword("mtr")
                .name("policy"),
        )
        .with(
            Route::new(rule_table())
                .prefix("rule")
                .not_found("Rule {query} not found.")
                .name("rules"),
        )
        .fallback(Route::new(PrefixFallback::new(lookup)).name("cards"))
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    // stdout carries the replies
    if config.logging.output == LogOutput::Stdout {
        config.logging.output = LogOutput::Stderr;
    }

    let runtime = Arc::new(
        ArbiterRuntime::builder()
            .config(config)
            .router(router(Duration::from_millis(args.latency_ms)))
            .sink(ConsoleSink)
            .build()?,
    );

    let (tx, rx) = mpsc::channel(64);
    let message_loop = tokio::spawn({
        let runtime = Arc::clone(&runtime);
        async move { runtime.run(rx).await }
    });

    let destination = match &args.channel {
        Some(channel) => Destination::channel(channel),
        None => Destination::private(&args.nick),
    };
    info!(destination = %destination, "Reading messages from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        tx.send(InboundMessage::new(destination.clone(), &args.nick, line))
            .await?;
    }

    drop(tx);
    message_loop.await??;
    Ok(())
}
