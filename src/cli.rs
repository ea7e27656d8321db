//! Command-line interface definitions for the `nofake` developer tool.

use clap::Parser;
use std::path::PathBuf;

/// Fact-check a claim against Indonesian news sources.
///
/// # Examples
///
/// ```sh
/// # Verify a claim
/// nofake "vaksin covid menyebabkan autisme"
///
/// # Ask a follow-up question with prior turns from a JSON file
/// nofake "jelaskan lebih lanjut" --history ./history.json
///
/// # Custom proxies and sites, plus a conversation title
/// nofake "banjir jakarta" --config ./nofake.yaml --title
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The claim or question to analyze
    pub query: String,

    /// JSON file with previous turns: `[{"role": "user", "message": "..."}]`
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Also generate a short conversation title
    #[arg(short, long)]
    pub title: bool,
}
