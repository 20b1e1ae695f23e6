//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Answer with route, confidence, citations and query
    Full,
    /// Only the answer value
    Answer,
    /// JSON output
    Json,
}

impl From<retail_domain::OutputFormat> for OutputFormat {
    fn from(format: retail_domain::OutputFormat) -> Self {
        match format {
            retail_domain::OutputFormat::Full => OutputFormat::Full,
            retail_domain::OutputFormat::Answer => OutputFormat::Answer,
            retail_domain::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for retail-copilot
#[derive(Parser, Debug)]
#[command(name = "retail-copilot")]
#[command(
    author,
    version,
    about = "Answer retail analytics questions from documents and a SQL database"
)]
#[command(long_about = r#"
Retail Copilot answers natural-language questions about a retail business.

Each question is routed to the document corpus, the database, or both:
1. Route:      a small model classifies the question
2. Retrieve:   BM25 finds the relevant document chunks
3. Query:      a code model writes SQL, repairing it from errors up to twice
4. Synthesize: the evidence is merged into a typed answer with citations

Configuration files are loaded from (in priority order):
1. COPILOT_<SECTION>__<KEY>   Environment variables
2. --config <path>            Explicit config file
3. ./copilot.toml             Project-level config
4. ~/.config/retail-copilot/config.toml   Global config

Example:
  retail-copilot ask "What is the return window for unopened Beverages?" --format-hint int
  retail-copilot batch --input questions.jsonl --out answers.jsonl --jobs 4
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Also write diagnostic logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Write a JSONL transcript of every prompt, response and query
    #[arg(long, value_name = "PATH", global = true)]
    pub conversation_log: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a single question
    Ask(AskArgs),
    /// Answer every question in a JSONL file
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Expected answer shape: int, float, str, {field:type, ...} or list[...]
    #[arg(short = 'f', long, value_name = "HINT")]
    pub format_hint: Option<String>,

    /// Output format (defaults to [output].format, then answer)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Questions file, one {"id", "question", "format_hint"} object per line
    #[arg(short, long, alias = "batch", value_name = "PATH")]
    pub input: PathBuf,

    /// Answers file, one object per line in input order
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// Questions answered concurrently (defaults to [pipeline].jobs)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}
