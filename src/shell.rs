//! Interactive `dax shell`.
//!
//! One [`Coordinator`] lives for the whole session, so search results,
//! match positions and the sort order persist between commands. Type `help`
//! for the command list.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use doc_analytics_core::models::{DocumentId, SortBy, SortOrder};
use doc_analytics_core::{Coordinator, Outcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::http::read_upload;
use crate::render;

const HELP: &str = "\
Commands:
  search <query>      search documents (blank query does nothing)
  clear               clear search results
  next <id>           next match in result <id>
  prev <id>           previous match in result <id>
  matches <id>        every match in result <id>
  docs                reload the document library
  sort <field>        sort by upload_date, title, or file_size
  order <dir>         asc, desc, or toggle
  get <id>            show one document
  upload <path>       upload a PDF or DOCX file
  classify            classify all documents
  stats               reload statistics
  health              check the backend
  help                this text
  quit                leave the shell";

/// Direction argument of `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    Set(SortOrder),
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Search(String),
    Clear,
    Next(DocumentId),
    Prev(DocumentId),
    Matches(DocumentId),
    Docs,
    Sort(SortBy),
    Order(OrderArg),
    Get(DocumentId),
    Upload(PathBuf),
    Classify,
    Stats,
    Health,
    Help,
    Quit,
    Empty,
}

fn parse_id(arg: &str, usage: &str) -> std::result::Result<DocumentId, String> {
    if arg.is_empty() {
        return Err(format!("usage: {}", usage));
    }
    arg.parse()
        .map_err(|_| format!("'{}' is not a document id", arg))
}

impl ShellCommand {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word {
            "" => Ok(ShellCommand::Empty),
            // Blank queries are passed through; the session skips them.
            "search" | "s" => Ok(ShellCommand::Search(rest.to_string())),
            "clear" => Ok(ShellCommand::Clear),
            "next" | "n" => parse_id(rest, "next <id>").map(ShellCommand::Next),
            "prev" | "p" => parse_id(rest, "prev <id>").map(ShellCommand::Prev),
            "matches" => parse_id(rest, "matches <id>").map(ShellCommand::Matches),
            "docs" | "ls" => Ok(ShellCommand::Docs),
            "sort" => rest.parse().map(ShellCommand::Sort),
            "order" => match rest {
                "toggle" => Ok(ShellCommand::Order(OrderArg::Toggle)),
                other => other
                    .parse()
                    .map(|order| ShellCommand::Order(OrderArg::Set(order))),
            },
            "get" => parse_id(rest, "get <id>").map(ShellCommand::Get),
            "upload" if rest.is_empty() => Err("usage: upload <path>".to_string()),
            "upload" => Ok(ShellCommand::Upload(PathBuf::from(rest))),
            "classify" => Ok(ShellCommand::Classify),
            "stats" => Ok(ShellCommand::Stats),
            "health" => Ok(ShellCommand::Health),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            other => Err(format!("unknown command '{}'. Type 'help'.", other)),
        }
    }
}

/// Print queued notices: info to stdout, errors to stderr. Returns the
/// number of errors.
pub fn print_notices(coord: &Coordinator) -> usize {
    let mut errors = 0;
    for notice in coord.take_notices() {
        if notice.is_error() {
            errors += 1;
            eprintln!("{}", render::render_notice(&notice));
        } else {
            println!("{}", render::render_notice(&notice));
        }
    }
    errors
}

fn print_result(coord: &Coordinator, id: DocumentId, all_matches: bool, config: &Config) {
    let snapshot = coord.snapshot();
    match snapshot.results.iter().find(|e| e.id() == id) {
        Some(entry) => println!(
            "{}",
            render::render_result(entry, all_matches, config.display.snippet_chars)
        ),
        None => println!("No search result with id {}.", id),
    }
}

fn print_documents(coord: &Coordinator) {
    let snapshot = coord.snapshot();
    println!(
        "{}",
        render::render_documents(&snapshot.documents, snapshot.documents_loaded)
    );
}

fn print_statistics(coord: &Coordinator, config: &Config) {
    let snapshot = coord.snapshot();
    println!(
        "{}",
        render::render_statistics(
            snapshot.statistics.as_ref(),
            &snapshot.distribution,
            config.display.bar_width
        )
    );
}

async fn execute(coord: &Coordinator, config: &Config, command: ShellCommand) -> bool {
    match command {
        ShellCommand::Empty => {}
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => return false,
        ShellCommand::Search(query) => {
            if coord.search(&query).await != Outcome::Skipped {
                let snapshot = coord.snapshot();
                println!(
                    "{}",
                    render::render_results(
                        snapshot.query.as_deref(),
                        &snapshot.results,
                        snapshot.last_search_time,
                        false,
                        config.display.snippet_chars,
                    )
                );
            }
        }
        ShellCommand::Clear => coord.clear_search(),
        ShellCommand::Next(id) => {
            coord.next_match(id);
            print_result(coord, id, false, config);
        }
        ShellCommand::Prev(id) => {
            coord.previous_match(id);
            print_result(coord, id, false, config);
        }
        ShellCommand::Matches(id) => print_result(coord, id, true, config),
        ShellCommand::Docs => {
            coord.refresh_documents().await;
            print_documents(coord);
        }
        ShellCommand::Sort(sort_by) => {
            coord.set_sort_by(sort_by).await;
            print_documents(coord);
        }
        ShellCommand::Order(arg) => {
            let order = match arg {
                OrderArg::Set(order) => order,
                OrderArg::Toggle => coord.snapshot().sort.sort_order.toggled(),
            };
            coord.set_sort_order(order).await;
            print_documents(coord);
        }
        ShellCommand::Get(id) => {
            if let Some(document) = coord.fetch_document(id).await {
                println!("{}", render::render_document(&document));
            }
        }
        ShellCommand::Upload(path) => match read_upload(&path).await {
            Ok(file) => {
                if coord.upload(Some(file)).await.is_applied() {
                    if let Some(document) = coord.snapshot().last_upload {
                        println!("Uploaded {} as #{}", document.filename, document.id);
                    }
                    print_documents(coord);
                }
            }
            Err(err) => eprintln!("error: {:#}", err),
        },
        ShellCommand::Classify => {
            if coord.classify_all().await.is_applied() {
                print_documents(coord);
            }
        }
        ShellCommand::Stats => {
            coord.refresh_statistics().await;
            print_statistics(coord, config);
        }
        ShellCommand::Health => {
            let status = coord.check_health().await;
            println!(
                "{}",
                render::render_api_status(status, &config.backend.base_url)
            );
        }
    }
    true
}

/// Run the interactive loop until `quit` or end of input.
pub async fn run(coord: &Coordinator, config: &Config) -> Result<()> {
    let (status, _, _) = tokio::join!(
        coord.check_health(),
        coord.refresh_documents(),
        coord.refresh_statistics()
    );
    println!(
        "{}",
        render::render_api_status(status, &config.backend.base_url)
    );
    print_documents(coord);
    print_notices(coord);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("dax> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        match ShellCommand::parse(&line) {
            Ok(command) => {
                tracing::debug!(?command, "shell command");
                let keep_going = execute(coord, config, command).await;
                print_notices(coord);
                if !keep_going {
                    break;
                }
            }
            Err(message) => eprintln!("{}", message),
        }
    }
    Ok(())
}
