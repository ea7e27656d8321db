//! # NoFake
//!
//! Developer entry point: analyze one message, optionally with prior turns,
//! and print the resulting `AnalysisResult` as JSON on stdout. Logs go to
//! stderr.
//!
//! ```sh
//! GEMINI_API_KEY=... nofake "vaksin covid menyebabkan autisme"
//! ```

use clap::Parser;
use nofake::models::ConversationTurn;
use nofake::{AppConfig, FactChecker, generate_chat_title};
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.config, ?args.history, title = args.title, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => AppConfig::load(path).await?,
        None => AppConfig::default(),
    };

    let history: Vec<ConversationTurn> = match &args.history {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => Vec::new(),
    };
    info!(turns = history.len(), "Loaded conversation history");

    let checker = FactChecker::from_config(&config, args.gemini_api_key.clone())?;

    let result = checker.analyze(&args.query, &history).await;

    // with --title the result is wrapped so stdout stays a single JSON document
    let output = if args.title {
        let title = generate_chat_title(checker.model(), &args.query).await;
        info!(%title, "Conversation title");
        serde_json::json!({ "title": title, "result": result })
    } else {
        serde_json::to_value(&result)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        status = ?result.status,
        "Execution complete"
    );

    Ok(())
}
