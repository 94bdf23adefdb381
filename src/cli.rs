use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "urlsum",
    about = "Summarize a YouTube video or web page with a hosted LLM",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube or web URL (reads one URL per line from stdin if omitted)
    pub url: Option<String>,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Caption language for YouTube videos [default: en]
    #[arg(short, long)]
    pub lang: Option<String>,

    /// LLM model for summarization [default: llama-3.3-70b-versatile]
    #[arg(short, long)]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL [default: https://api.groq.com/openai/v1]
    #[arg(long)]
    pub api_base: Option<String>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the extracted content without summarizing
    #[arg(long)]
    pub no_summary: bool,

    /// Don't fall back to yt-dlp if captions are unavailable
    #[arg(long)]
    pub no_fallback: bool,

    /// Timeout in seconds for each network call [default: 30]
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Don't show the progress message
    #[arg(short, long)]
    pub quiet: bool,

    /// Show extraction method and metadata
    #[arg(short, long)]
    pub verbose: bool,
}
