use std::path::PathBuf;

use clap::Parser;

use crate::request::Method;

const EXAMPLES: &str = "\
Examples:
    reqline https://example.com
    reqline -M POST -H Accept:json --json '{\"key\":\"value\"}' https://api.example.com
    reqline -Q page=2 -Q limit=10 --timeout 5 https://api.example.com/items
    reqline -M PUT --file ./payload.bin https://api.example.com/upload";

/// Represents command line arguments for the HTTP client
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reqline",
    version,
    about = "reqline - Send one HTTP request and save the response body",
    after_help = EXAMPLES
)]
pub struct Args {
    /// Target url (http or https)
    pub url: String,

    /// HTTP method to use
    #[arg(short = 'M', long, value_enum, ignore_case = true, default_value_t = Method::Get)]
    pub method: Method,

    /// Request header as key:value (repeatable)
    #[arg(short = 'H', long = "headers", value_name = "KEY:VALUE")]
    pub headers: Vec<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(short = 'Q', long = "queries", value_name = "KEY=VALUE")]
    pub queries: Vec<String>,

    /// Raw request body
    #[arg(short = 'D', long)]
    pub data: Option<String>,

    /// JSON request body
    #[arg(long)]
    pub json: Option<String>,

    /// File to upload as the request body
    #[arg(long, value_parser = existing_file)]
    pub file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Save the response body to this file instead of the derived name
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Directory response bodies are saved into (must exist)
    #[arg(long, env = "REQLINE_SAVE_DIR", default_value = "./saved")]
    pub save_dir: PathBuf,

    /// Delay in milliseconds between body chunks
    #[arg(long = "chunk-delay", env = "REQLINE_CHUNK_DELAY_MS", default_value_t = 100)]
    pub chunk_delay_ms: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn existing_file(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File '{}' does not exist", raw))
    }
}
