//! # Doc Analytics CLI (`dax`)
//!
//! Talks to a running document-analytics backend.
//!
//! ## Usage
//!
//! ```bash
//! dax --config ./config/dax.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dax docs` | List the document library |
//! | `dax search "<query>"` | Search and show each result's first match |
//! | `dax upload <path>` | Upload a PDF or DOCX file |
//! | `dax classify` | Classify every document |
//! | `dax stats` | Library and search statistics |
//! | `dax get <id>` | Show one document |
//! | `dax health` | Check that the backend is reachable |
//! | `dax shell` | Interactive session with match navigation |
//!
//! ## Examples
//!
//! ```bash
//! # Largest files first
//! dax docs --sort-by file_size --order desc
//!
//! # Every match of every result, as JSON
//! dax search "net revenue" --all-matches --json
//!
//! # Point at another backend
//! dax --base-url http://10.0.0.5:5000/api stats
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use doc_analytics::config::{self, Config, DEFAULT_CONFIG_PATH};
use doc_analytics::http::{read_upload, HttpBackend};
use doc_analytics::{logging, render, shell};
use doc_analytics_core::models::{DocumentId, SortBy, SortOrder};
use doc_analytics_core::{ApiStatus, Coordinator, Outcome};
use serde::Serialize;

/// Doc Analytics CLI: upload, search, classify, and inspect documents held
/// by a document-analytics backend.
#[derive(Parser)]
#[command(
    name = "dax",
    about = "Doc Analytics — command-line client for a document-analytics backend",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dax.toml`; built-in defaults apply when that
    /// file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Backend base URL, overriding `[backend].base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log progress to stderr (`RUST_LOG` takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the document library.
    Docs {
        /// upload_date, title, or file_size.
        #[arg(long)]
        sort_by: Option<SortBy>,
        /// asc or desc.
        #[arg(long)]
        order: Option<SortOrder>,
    },

    /// Search documents by keyword or phrase.
    ///
    /// Each result shows its first match context; `--all-matches` prints
    /// all of them.
    Search {
        query: String,
        #[arg(long)]
        all_matches: bool,
    },

    /// Upload a file, then reload the library and statistics.
    Upload { path: PathBuf },

    /// Classify all documents.
    Classify,

    /// Show library and search statistics.
    Stats,

    /// Show one document by id.
    Get { id: DocumentId },

    /// Check that the backend is reachable and healthy.
    Health,

    /// Start an interactive session.
    Shell,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print queued notices and fail the command if any of them is an error.
fn finish(coord: &Coordinator) -> Result<()> {
    let errors = shell::print_notices(coord);
    if errors > 0 {
        bail!("{} operation{} failed", errors, if errors == 1 { "" } else { "s" });
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut cfg: Config = config::load_or_default(&cli.config)?;
    if let Some(base_url) = &cli.base_url {
        cfg = cfg.with_base_url(base_url)?;
    }

    let mut sort = cfg.library.sort();
    if let Commands::Docs { sort_by, order } = &cli.command {
        sort.sort_by = sort_by.unwrap_or(sort.sort_by);
        sort.sort_order = order.unwrap_or(sort.sort_order);
    }

    let backend = HttpBackend::new(&cfg.backend)?;
    tracing::info!("using backend at {}", backend.base_url());
    let coord = Coordinator::new(Arc::new(backend), sort);

    match cli.command {
        Commands::Docs { .. } => {
            coord.refresh_documents().await;
            let snapshot = coord.snapshot();
            if cli.json {
                print_json(&snapshot.documents)?;
            } else if snapshot.documents_loaded {
                println!(
                    "{}",
                    render::render_documents(&snapshot.documents, snapshot.documents_loaded)
                );
            }
        }
        Commands::Search { query, all_matches } => {
            if coord.search(&query).await == Outcome::Skipped {
                eprintln!("Nothing to search for.");
                return Ok(());
            }
            let snapshot = coord.snapshot();
            if cli.json {
                let results: Vec<_> = snapshot.results.iter().map(|e| &e.result).collect();
                print_json(&results)?;
            } else if snapshot.query.is_some() {
                println!(
                    "{}",
                    render::render_results(
                        snapshot.query.as_deref(),
                        &snapshot.results,
                        snapshot.last_search_time,
                        all_matches,
                        cfg.display.snippet_chars,
                    )
                );
            }
        }
        Commands::Upload { path } => {
            let file = read_upload(&path).await?;
            if coord.upload(Some(file)).await.is_applied() {
                let snapshot = coord.snapshot();
                if cli.json {
                    print_json(&snapshot.last_upload)?;
                } else {
                    if let Some(document) = &snapshot.last_upload {
                        println!("Uploaded {} as #{}", document.filename, document.id);
                    }
                    println!("Library: {} documents", snapshot.documents.len());
                }
            }
        }
        Commands::Classify => {
            if coord.classify_all().await.is_applied() {
                let snapshot = coord.snapshot();
                if cli.json {
                    print_json(&snapshot.documents)?;
                } else {
                    println!(
                        "{}",
                        render::render_documents(&snapshot.documents, snapshot.documents_loaded)
                    );
                }
            }
        }
        Commands::Stats => {
            coord.refresh_statistics().await;
            let snapshot = coord.snapshot();
            if let Some(stats) = &snapshot.statistics {
                if cli.json {
                    print_json(stats)?;
                } else {
                    println!(
                        "{}",
                        render::render_statistics(
                            Some(stats),
                            &snapshot.distribution,
                            cfg.display.bar_width
                        )
                    );
                }
            }
        }
        Commands::Get { id } => {
            if let Some(document) = coord.fetch_document(id).await {
                if cli.json {
                    print_json(&document)?;
                } else {
                    println!("{}", render::render_document(&document));
                }
            }
        }
        Commands::Health => {
            let status = coord.check_health().await;
            if cli.json {
                print_json(&serde_json::json!({
                    "base_url": cfg.backend.base_url,
                    "status": status.label(),
                }))?;
            } else {
                println!("{}", render::render_api_status(status, &cfg.backend.base_url));
            }
            if status != ApiStatus::Connected {
                bail!("backend is not healthy");
            }
        }
        Commands::Shell => {
            shell::run(&coord, &cfg).await?;
        }
    }

    finish(&coord)
}
