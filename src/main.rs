use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use recap::batch;
use recap::config::{self, RecapConfig};
use recap::ingest;
use recap::output::{json as json_out, table};
use recap::summarize::normalize::normalize;
use recap::summarize::{
    CompletionBackend, GenerationParams, OpenAiBackend, SummaryRecord, SummaryStatus, Summarizer,
};

#[derive(Parser)]
#[command(name = "recap", version, about = "Meeting recap: one-liner, key points, decisions and action items from a transcript")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to config file (default: ~/.recap/config.toml)
    #[arg(long, global = true, env = "RECAP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize transcripts from files, directories, globs or stdin
    Summarize {
        /// File, directory or glob paths
        paths: Vec<String>,

        /// Read a single transcript from stdin
        #[arg(long)]
        stdin: bool,

        /// Force format: text, vtt, srt, markdown
        #[arg(long)]
        format: Option<String>,

        /// Model identifier for the generative extractor
        #[arg(long)]
        model: Option<String>,

        /// Token budget for the generative reply
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature, clamped to [0, 1]
        #[arg(long)]
        temperature: Option<f32>,

        /// Generative attempts before falling back (0 = heuristic only)
        #[arg(long)]
        retries: Option<u32>,

        /// API key (overrides OPENAI_API_KEY and the config file)
        #[arg(long)]
        api_key: Option<String>,

        /// Skip the generative extractor entirely
        #[arg(long)]
        heuristic: bool,

        /// Print the rendered markdown instead of the card view
        #[arg(long)]
        markdown: bool,

        /// Transcripts summarized in parallel
        #[arg(long, short = 'j', default_value = "4")]
        jobs: usize,
    },

    /// Print the normalized text of a transcript
    Clean {
        /// Transcript file
        path: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Force format: text, vtt, srt, markdown
        #[arg(long)]
        format: Option<String>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented default config if none exists
    Init,
    /// Show the effective config (API key redacted)
    Show,
    /// Print the config file path
    Path,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;
    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };

    match cli.command {
        Commands::Summarize {
            paths,
            stdin,
            format,
            model,
            max_tokens,
            temperature,
            retries,
            api_key,
            heuristic,
            markdown,
            jobs,
        } => {
            let format = parse_format(format.as_deref())?;
            let cfg = RecapConfig::load_from(&config_path)?;
            let summarizer = build_summarizer(&cfg, api_key.as_deref(), heuristic)?;
            let params = GenerationParams {
                model,
                max_tokens,
                temperature,
                retries,
            };

            let records = if stdin {
                let doc = ingest::load_stdin(format)?;
                vec![batch::summarize_doc(&summarizer, &doc, &params)]
            } else if paths.is_empty() {
                bail!("No paths provided. Use --stdin to read from stdin.");
            } else {
                let files = ingest::collect_paths(&paths, format)?;
                if files.is_empty() {
                    bail!("No transcript files found in: {}", paths.join(", "));
                }
                batch::summarize_paths(&summarizer, &files, format, &params, jobs)
            };

            if json_output {
                json_out::print_json(&json_out::records_value(&records)?)?;
            } else if markdown {
                print_markdown(&records);
            } else {
                for record in &records {
                    table::print_record(record);
                }
                if records.len() > 1 {
                    table::print_overview(&records);
                }
            }

            let failed = records
                .iter()
                .filter(|r| r.status == SummaryStatus::Error)
                .count();
            if failed > 0 {
                bail!(
                    "{failed} of {} transcript{} could not be read",
                    records.len(),
                    if records.len() == 1 { "" } else { "s" }
                );
            }
        }

        Commands::Clean { path, stdin, format } => {
            let format = parse_format(format.as_deref())?;
            let doc = match (path, stdin) {
                (_, true) => ingest::load_stdin(format)?,
                (Some(path), false) => ingest::load_file(&path, format)?,
                (None, false) => bail!("No path provided. Use --stdin to read from stdin."),
            };
            let cleaned = normalize(&doc.text);

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "title": doc.title,
                    "source": doc.source,
                    "format": doc.format,
                    "text": cleaned,
                }))?;
            } else {
                println!("{cleaned}");
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Init => {
                if config::init_config(&config_path)? {
                    println!("Created config: {}", config_path.display());
                } else {
                    println!("Config already exists: {}", config_path.display());
                }
            }
            ConfigAction::Show => {
                let cfg = RecapConfig::load_from(&config_path)?;
                if json_output {
                    let mut shown = cfg.clone();
                    if shown.generation.api_key.is_some() {
                        shown.generation.api_key = Some("****".to_string());
                    }
                    json_out::print_json(&shown)?;
                } else {
                    println!("# {}", config_path.display());
                    println!("{}", cfg.display_redacted());
                }
            }
            ConfigAction::Path => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

fn parse_format(format: Option<&str>) -> Result<Option<ingest::Format>> {
    format
        .map(|f| {
            ingest::Format::from_str(f)
                .with_context(|| format!("Unknown format: {f}. Use: text, vtt, srt, markdown"))
        })
        .transpose()
}

/// Wire the OpenAI backend only when generation is switched on; a missing or
/// unresolvable key is left for the retry loop to report so the summary still
/// degrades to heuristics.
fn build_summarizer(cfg: &RecapConfig, cli_key: Option<&str>, heuristic_only: bool) -> Result<Summarizer> {
    if heuristic_only || !cfg.generation.enabled {
        return Ok(Summarizer::heuristic(cfg));
    }

    let api_key = config::credential_or_none(cli_key, config::API_KEY_ENV, &cfg.generation);
    let default_model = cfg
        .generation
        .model
        .as_deref()
        .unwrap_or(config::DEFAULT_MODEL);
    let backend = OpenAiBackend::new(
        api_key,
        &cfg.generation.base_url,
        default_model,
        cfg.generation.timeout(),
    )
    .context("Failed to build HTTP client")?;

    let backend: Arc<dyn CompletionBackend> = Arc::new(backend);
    Ok(Summarizer::new(cfg, Some(backend)))
}

fn print_markdown(records: &[SummaryRecord]) {
    for record in records {
        if records.len() > 1 {
            println!("## {}\n", record.title);
        }
        match (&record.status, &record.error) {
            (SummaryStatus::Error, Some(error)) => println!("_error: {error}_\n"),
            _ if record.summary.markdown.is_empty() => println!("_no usable transcript text_\n"),
            _ => println!("{}\n", record.summary.markdown),
        }
    }
}
