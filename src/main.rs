//! Histoseek command-line binary

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use histoseek::cache::FingerprintCache;
use histoseek::config::{AppConfig, LogFormat};
use histoseek::raster::{DirectorySource, RasterSource};
use histoseek::session::QuerySession;
use histoseek::types::{DistancePolicy, Method, RankedResult};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding the corpus images
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// File extension of corpus images, without the dot
    #[arg(long, global = true)]
    extension: Option<String>,

    /// Histogram method: intensity or colorcode
    #[arg(long, global = true)]
    method: Option<Method>,

    /// Distance used for ranking: raw or normalized
    #[arg(long, global = true)]
    distance: Option<DistancePolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the corpus in enumeration order
    List,
    /// Print the fingerprint of one image
    Fingerprint {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Rank the corpus against one image
    Rank {
        id: String,
        /// Only print the first N results
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Page through the corpus and pick queries interactively
    Browse,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(root) = &self.root {
            config.corpus.root = root.clone();
        }
        if let Some(extension) = &self.extension {
            config.corpus.extension = extension.clone();
        }
        if let Some(method) = self.method {
            config.query.method = method;
        }
        if let Some(distance) = self.distance {
            config.query.distance = distance;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    init_tracing(&config)?;

    let source: Arc<dyn RasterSource> = Arc::new(DirectorySource::new(
        &config.corpus.root,
        &config.corpus.extension,
    ));
    let cache = Arc::new(FingerprintCache::new(config.cache_config()));
    let mut session = QuerySession::new(source, cache, config.session_config());

    let mut out = io::stdout().lock();
    match cli.command {
        Command::List => {
            for id in session.corpus().ids() {
                writeln!(out, "{}", id)?;
            }
        }
        Command::Fingerprint { id, json } => {
            let fingerprint = session
                .member_fingerprint(&id)
                .with_context(|| format!("failed to fingerprint {}", id))?;
            if json {
                serde_json::to_writer_pretty(&mut out, fingerprint.as_ref())?;
                writeln!(out)?;
            } else {
                writeln!(
                    out,
                    "{} ({}, {} pixels)",
                    id,
                    fingerprint.method(),
                    fingerprint.pixel_count()
                )?;
                for (bin, count) in fingerprint.bins().iter().enumerate() {
                    writeln!(out, "{:>3} {}", bin, count)?;
                }
            }
        }
        Command::Rank { id, limit, json } => {
            let result = session
                .select(&id)
                .with_context(|| format!("failed to rank corpus against {}", id))?;
            write_ranking(&mut out, result, limit, json)?;
        }
        Command::Browse => {
            drop(out);
            browse(&mut session)?;
        }
    }

    Ok(())
}

fn write_ranking(
    out: &mut impl Write,
    result: &RankedResult,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(result.len());
    if json {
        let truncated = RankedResult {
            entries: result.entries.iter().take(limit).cloned().collect(),
            ..result.clone()
        };
        serde_json::to_writer_pretty(&mut *out, &truncated)?;
        writeln!(out)?;
        return Ok(());
    }

    for (rank, entry) in result.entries.iter().take(limit).enumerate() {
        match entry.distance {
            Some(distance) => writeln!(out, "{:>4} {:>14.6} {}", rank + 1, distance, entry.id)?,
            None => writeln!(out, "{:>4} {:>14} {}", rank + 1, "unreadable", entry.id)?,
        }
    }
    Ok(())
}

const BROWSE_HELP: &str =
    "commands: select <position|id>, method <intensity|colorcode>, next, prev, page, quit";

fn browse(session: &mut QuerySession) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    writeln!(out, "{}", BROWSE_HELP)?;
    render_page(session, &mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();

        match (words.next(), words.next()) {
            (None, _) => continue,
            (Some("select"), Some(target)) => {
                let selected = match target.parse::<usize>() {
                    Ok(position) => session.select_visible(position).map(|_| ()),
                    Err(_) => session.select(target).map(|_| ()),
                };
                match selected {
                    Ok(()) => render_page(session, &mut out)?,
                    Err(err) => writeln!(out, "error: {}", err)?,
                }
            }
            (Some("method"), Some(name)) => match name.parse::<Method>() {
                Ok(method) => {
                    session.set_method(method);
                    writeln!(out, "method set to {}", method)?;
                }
                Err(err) => writeln!(out, "error: {}", err)?,
            },
            (Some("next"), None) => {
                if !session.next_page() {
                    writeln!(out, "already on the last page")?;
                }
                render_page(session, &mut out)?;
            }
            (Some("prev"), None) => {
                if !session.previous_page() {
                    writeln!(out, "already on the first page")?;
                }
                render_page(session, &mut out)?;
            }
            (Some("page"), None) => render_page(session, &mut out)?,
            (Some("quit" | "exit"), None) => break,
            _ => writeln!(out, "{}", BROWSE_HELP)?,
        }
    }

    Ok(())
}

fn render_page(session: &QuerySession, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "-- page {}/{} | method {} | query {}",
        session.pager().current_page() + 1,
        session.page_count().max(1),
        session.method(),
        session.query().unwrap_or("-"),
    )?;
    for (position, id) in session.visible().iter().enumerate() {
        let marker = if session.query() == Some(id.as_str()) { '*' } else { ' ' };
        writeln!(out, "{}{:>3} {}", marker, position, id)?;
    }
    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("histoseek=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        LogFormat::Text => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
    }

    Ok(())
}
