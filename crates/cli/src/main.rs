mod echo;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use pagecraft_core::{
    BatchConfig, ExtractedContent, Layout, PageRecord, PipelineConfig, PromptVersion, RewriteEngine,
    extract_from_html, fetch_and_extract, format_result, format_versioned, generate_all, read_file, read_stdin, reclean,
    reclean_all, refetch_all,
};
use tracing_subscriber::EnvFilter;

use crate::echo::{
    format_size, print_banner, print_batch_summary, print_detail, print_info, print_step, print_success,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetch, clean, rewrite and format web pages
#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(author = "Pagecraft Contributors")]
#[command(version)]
#[command(about = "Fetch, clean, rewrite and format web pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a URL (or read an HTML file / stdin) and print its cleaned text
    Extract {
        /// URL to fetch, local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Print the full extraction record as JSON
        #[arg(long)]
        json: bool,

        /// HTTP timeout in seconds (default: PAGECRAFT_FETCH_TIMEOUT or 20)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Custom User-Agent for HTTP requests
        #[arg(long, value_name = "UA")]
        user_agent: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Re-clean previously extracted text without refetching
    Reclean {
        /// Text file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Rewrite cleaned text into a layout (backend settings come from the environment)
    Generate {
        /// Layout to generate (interstitial, advertorial, or any other name for the generic prompt)
        #[arg(short, long, value_name = "LAYOUT")]
        layout: Layout,

        /// Text file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Print the formatted HTML table instead of markdown
        #[arg(long, conflicts_with = "json")]
        html: bool,

        /// Print the full generation record as JSON
        #[arg(long)]
        json: bool,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render generated markdown as an HTML table
    Format {
        /// Layout the markdown was generated for
        #[arg(short, long, value_name = "LAYOUT")]
        layout: Layout,

        /// Prompt version the markdown was generated with (default: latest for the layout)
        #[arg(long, value_name = "VERSION")]
        prompt_version: Option<String>,

        /// Markdown file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Re-process a JSON array of page records
    Batch {
        /// JSON file with records: [{"id": 1, "url": "...", "cleaned_text": "..."}]
        #[arg(value_name = "RECORDS")]
        records: PathBuf,

        /// Re-download every page before cleaning
        #[arg(long, conflicts_with = "generate")]
        refetch: bool,

        /// Generate this layout for every record instead of cleaning
        #[arg(long, value_name = "LAYOUT")]
        generate: Option<Layout>,

        /// Concurrent workers (default: PAGECRAFT_WORKERS or 4)
        #[arg(long, value_name = "NUM")]
        workers: Option<usize>,

        /// Output file for the JSON report (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        read_stdin().context("Failed to read from stdin")
    } else {
        read_file(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn write_output(output: Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(&path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    match cli.command {
        Command::Extract { input, json, timeout, user_agent, output } => {
            let content = if is_url(&input) {
                if cli.verbose {
                    print_step(1, 2, &format!("Fetching from {}", input.bright_white().underline()));
                }
                let mut config = PipelineConfig::from_env().context("Invalid configuration")?.fetch;
                if let Some(timeout) = timeout {
                    config.timeout = timeout;
                }
                if let Some(user_agent) = user_agent {
                    config.user_agent = user_agent;
                }
                fetch_and_extract(&input, &config).await.context("Failed to fetch URL")?
            } else {
                if cli.verbose {
                    print_step(1, 2, "Reading HTML");
                }
                let html = read_input(&input)?;
                let (cleaned_text, title) = extract_from_html(&html);
                ExtractedContent {
                    cleaned_text,
                    title,
                    content_length: Some(html.len() as u64),
                    ..Default::default()
                }
            };

            if cli.verbose {
                print_step(2, 2, "Cleaned content");
                if let Some(title) = &content.title {
                    print_detail("Title", title);
                }
                if let Some(size) = content.content_length {
                    print_detail("Size", &format_size(size));
                }
                print_detail("Characters", &content.cleaned_text.chars().count().to_string());
                eprintln!();
            }

            let rendered = if json {
                serde_json::to_string_pretty(&content).context("Failed to serialize extraction")?
            } else {
                content.cleaned_text
            };
            write_output(output, &rendered)?;
        }

        Command::Reclean { input, output } => {
            let text = read_input(&input)?;
            write_output(output, &reclean(&text))?;
        }

        Command::Generate { layout, input, html, json, output } => {
            let config = PipelineConfig::from_env().context("Invalid configuration")?;
            let text = read_input(&input)?;

            if cli.verbose {
                print_step(1, 2, &format!("Generating {} with {}", layout, config.rewrite.model));
            }

            let engine = RewriteEngine::new(config.rewrite);
            let result = engine.generate(layout, &text).await.context("Generation failed")?;

            if cli.verbose {
                print_step(2, 2, "Generated content");
                print_detail("Prompt version", &result.prompt_version);
                let usage = |n: Option<u32>| n.map_or_else(|| "unknown".to_string(), |n| n.to_string());
                print_detail("Tokens in", &usage(result.tokens_input));
                print_detail("Tokens out", &usage(result.tokens_output));
                eprintln!();
            }

            let rendered = if json {
                serde_json::to_string_pretty(&result).context("Failed to serialize generation")?
            } else if html {
                format_result(&result, layout)
            } else {
                result.content
            };
            write_output(output, &rendered)?;
        }

        Command::Format { layout, prompt_version, input, output } => {
            let markdown = read_input(&input)?;
            let version = prompt_version.map_or_else(|| PromptVersion::latest_for(layout), |v| PromptVersion::parse(&v));
            write_output(output, &format_versioned(&markdown, layout, &version))?;
        }

        Command::Batch { records, refetch, generate, workers, output } => {
            let config = PipelineConfig::from_env().context("Invalid configuration")?;
            let raw = fs::read_to_string(&records)
                .with_context(|| format!("Failed to read records: {}", records.display()))?;
            let records: Vec<PageRecord> = serde_json::from_str(&raw).context("Failed to parse records")?;
            let workers = workers.unwrap_or(config.batch.workers);
            tracing::debug!(workers, records = records.len(), "starting batch");

            let rendered = if let Some(layout) = generate {
                print_info(&format!("Generating {} for {} record(s)...", layout, records.len()));
                let engine = RewriteEngine::new(config.rewrite);
                let batch = BatchConfig { workers, ..config.batch };
                let report = generate_all(&engine, &records, layout, &batch).await;
                print_batch_summary(&records, &report);
                serde_json::to_string_pretty(&report)
            } else if refetch {
                print_info(&format!("Re-cleaning {} record(s) with refetch...", records.len()));
                let report = refetch_all(&records, &config.fetch, workers).await;
                print_batch_summary(&records, &report);
                serde_json::to_string_pretty(&report)
            } else {
                print_info(&format!("Re-cleaning {} record(s) without refetch...", records.len()));
                let report = reclean_all(&records);
                print_batch_summary(&records, &report);
                serde_json::to_string_pretty(&report)
            };

            write_output(output, &rendered.context("Failed to serialize report")?)?;
        }
    }

    Ok(())
}
