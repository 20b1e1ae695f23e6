//! CLI entrypoint for Retail Copilot
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use retail_application::{
    AnswerBatchUseCase, AnswerQuestionUseCase, ConversationLogger, NoConversationLogger,
    NoProgress, PipelineContext, ProgressNotifier,
};
use retail_domain::{FormatHint, LexicalRetriever, Question};
use retail_infrastructure::{
    ChatOptions, ConfigLoader, CorpusLoader, ExemplarLoader, FileConfig, JsonlConversationLogger,
    OllamaLlmGateway, SqliteQueryStore, SqliteStoreOptions, read_questions, write_records,
};
use retail_presentation::{
    AskArgs, BatchArgs, Cli, Command, ConsoleFormatter, OutputFormat, OutputFormatter,
    ProgressReporter, SimpleProgress,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = ConfigLoader::load(cli.config.as_deref())
        .map_err(|e| anyhow!("failed to load configuration: {e}"))?;

    // Held until exit so buffered file logs are flushed
    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    let _log_guard = init_logging(cli.verbose, log_file.as_deref())?;

    if cli.no_color || !config.output.color {
        ConsoleFormatter::disable_color();
    }

    info!("Starting Retail Copilot");

    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }
    let errors: Vec<&str> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.message.as_str())
        .collect();
    if !errors.is_empty() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }

    // === Dependency Injection ===
    let use_case = Arc::new(build_use_case(&config, &cli).await?);

    match command {
        Command::Ask(args) => run_ask(&use_case, args, &config, cli.quiet).await,
        Command::Batch(args) => run_batch(use_case, args, cli.quiet).await,
    }
}

/// Console logging by verbosity, plus an optional plain-text log file
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("log file path has no file name: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Check every external resource, load the corpus and exemplars, and
/// assemble the orchestrator. Any missing resource here is fatal.
async fn build_use_case(config: &FileConfig, cli: &Cli) -> Result<AnswerQuestionUseCase> {
    let models = config.model_config();
    let params = config.pipeline_params();

    let options = ChatOptions {
        seed: config.inference.seed,
        temperature: config.inference.temperature,
        num_predict: config.inference.max_tokens,
    };
    let gateway = OllamaLlmGateway::new(
        config.inference.base_url.as_str(),
        options,
        config.inference.timeout(),
    )?;
    gateway
        .health_check(&models.distinct_models())
        .await
        .context("inference backend is not ready")?;

    let store = SqliteQueryStore::open(&SqliteStoreOptions::from(&config.database))
        .context("cannot open the database")?;

    let chunks = CorpusLoader::new(config.corpus.max_chunk_chars)
        .load(&config.corpus.dir)
        .context("cannot load the document corpus")?;
    info!(
        "Indexed {} chunks from {} documents",
        chunks.len(),
        chunks.sources().len()
    );
    let retriever = LexicalRetriever::new(chunks);

    let exemplars = ExemplarLoader::new().load_dir(&config.exemplars.dir);

    let context = Arc::new(PipelineContext::new(
        retriever,
        store.schema().clone(),
        exemplars,
    ));

    let logger: Arc<dyn ConversationLogger> = match cli
        .conversation_log
        .as_ref()
        .or(config.logging.conversation_log.as_ref())
    {
        Some(path) => Arc::new(JsonlConversationLogger::open(path).with_context(|| {
            format!("cannot open conversation log {}", path.display())
        })?),
        None => Arc::new(NoConversationLogger),
    };

    Ok(AnswerQuestionUseCase::with_conversation_logger(
        Arc::new(gateway),
        Arc::new(store),
        context,
        models,
        params,
        logger,
    )?)
}

async fn run_ask(
    use_case: &AnswerQuestionUseCase,
    args: &AskArgs,
    config: &FileConfig,
    quiet: bool,
) -> Result<()> {
    let mut question = Question::parse(args.question.as_str())?;
    if let Some(hint) = &args.format_hint {
        question = question.with_format_hint(FormatHint::parse(hint));
    }

    let progress: &dyn ProgressNotifier = if quiet { &NoProgress } else { &SimpleProgress };
    let outcome = use_case.execute_traced(&question, progress).await;

    let format = args
        .output
        .or(config.output.format.map(OutputFormat::from))
        .unwrap_or(OutputFormat::Answer);
    let output = ConsoleFormatter.render(format, &question, &outcome);
    println!("{}", output.trim_end());

    Ok(())
}

async fn run_batch(
    use_case: Arc<AnswerQuestionUseCase>,
    args: &BatchArgs,
    quiet: bool,
) -> Result<()> {
    let questions = read_questions(&args.input)
        .with_context(|| format!("cannot read questions from {}", args.input.display()))?;

    let mut batch = AnswerBatchUseCase::new(use_case);
    if let Some(jobs) = args.jobs {
        batch = batch.with_concurrency(jobs);
    }

    let records = if quiet {
        batch.execute(&questions, &NoProgress).await
    } else {
        batch.execute(&questions, &ProgressReporter::new()).await
    };

    write_records(&args.out, &records)
        .with_context(|| format!("cannot write answers to {}", args.out.display()))?;

    if !quiet {
        print!("{}", ConsoleFormatter::format_batch_summary(&records, &args.out));
    }

    Ok(())
}
