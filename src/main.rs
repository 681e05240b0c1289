use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use minidex::config::EngineConfig;
use minidex::engine::Engine;
use minidex::output;
use minidex::query::{PhraseStrategy, WildcardStrategy};
use minidex::server::{self, is_daemon_running, QueryClient};
use minidex::utils::progress;

/// How long an in-process query waits for its folder to be indexed
const LOCAL_INDEX_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Parser)]
#[command(name = "minidex")]
#[command(about = "In-memory full-text search over .txt and .fb2 documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a folder, watch it for new files and serve queries
    Serve {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Postfix boolean query, e.g. `java python AND`
    Bool {
        #[arg(required = true)]
        query: Vec<String>,

        /// Index this folder in-process instead of asking the server
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    /// Exact phrase query
    Phrase {
        #[arg(required = true)]
        phrase: Vec<String>,

        #[arg(short, long, value_enum, default_value_t)]
        strategy: PhraseStrategy,

        /// Index this folder in-process instead of asking the server
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    /// Wildcard query over the vocabulary, e.g. `pro*ing`
    Wildcard {
        pattern: String,

        #[arg(short, long, value_enum, default_value_t)]
        strategy: WildcardStrategy,

        /// Index this folder in-process instead of asking the server
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    /// Show server status
    Status,
    /// Stop the running server
    Stop,
}

enum Query {
    Boolean(String),
    Phrase(String, PhraseStrategy),
    Wildcard(String, WildcardStrategy),
}

enum Answer {
    Documents(Vec<PathBuf>),
    Terms(Vec<String>),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let color = !cli.no_color;

    match cli.command {
        Commands::Serve { dir } => {
            if is_daemon_running() {
                bail!("A server is already running. Stop it first with 'minidex stop'");
            }
            server::daemon::serve(&dir, EngineConfig::load())?;
        }
        Commands::Bool { query, path } => {
            run_query(Query::Boolean(query.join(" ")), path, color)?;
        }
        Commands::Phrase {
            phrase,
            strategy,
            path,
        } => {
            run_query(Query::Phrase(phrase.join(" "), strategy), path, color)?;
        }
        Commands::Wildcard {
            pattern,
            strategy,
            path,
        } => {
            run_query(Query::Wildcard(pattern, strategy), path, color)?;
        }
        Commands::Status => match QueryClient::connect() {
            Some(mut client) => output::print_status(&client.status()?, color)?,
            None => println!("Server is not running"),
        },
        Commands::Stop => {
            if server::daemon::stop_daemon()? {
                println!("Server stopped");
            } else {
                println!("Server is not running");
            }
        }
    }

    Ok(())
}

/// Ask the running server, or index `path` (default `.`) in-process when
/// a path is given or no server answers
fn run_query(query: Query, path: Option<PathBuf>, color: bool) -> Result<()> {
    let start = Instant::now();

    let answer = match (path, QueryClient::connect()) {
        (None, Some(mut client)) => remote_query(&mut client, &query)?,
        (path, _) => {
            let root = path.unwrap_or_else(|| PathBuf::from("."));
            local_query(&root, &query)?
        }
    };

    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    match answer {
        Answer::Documents(paths) => {
            output::print_paths(&paths, color)?;
            output::print_summary(paths.len(), "document", elapsed);
        }
        Answer::Terms(terms) => {
            output::print_terms(&terms, color)?;
            output::print_summary(terms.len(), "term", elapsed);
        }
    }
    Ok(())
}

fn remote_query(client: &mut QueryClient, query: &Query) -> Result<Answer> {
    Ok(match query {
        Query::Boolean(q) => Answer::Documents(client.boolean(q)?),
        Query::Phrase(p, strategy) => Answer::Documents(client.phrase(p, *strategy)?),
        Query::Wildcard(p, strategy) => Answer::Terms(client.wildcard(p, *strategy)?),
    })
}

fn local_query(root: &Path, query: &Query) -> Result<Answer> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", root.display()))?;

    let engine = Engine::new(EngineConfig::load())?;

    let pb = progress::spinner(&format!("Indexing {}", root.display()));
    engine.ingest_directory(&root)?;
    let settled = engine.wait_until_indexed(LOCAL_INDEX_TIMEOUT);
    pb.finish_and_clear();

    if !settled {
        log::warn!("indexing did not finish in time, results may be incomplete");
    }

    let sorted_paths = |found: std::collections::HashSet<PathBuf>| {
        let mut paths: Vec<PathBuf> = found.into_iter().collect();
        paths.sort();
        paths
    };

    Ok(match query {
        Query::Boolean(q) => Answer::Documents(sorted_paths(engine.boolean_query(q)?)),
        Query::Phrase(p, strategy) => {
            Answer::Documents(sorted_paths(engine.phrase_query(p, *strategy)))
        }
        Query::Wildcard(p, strategy) => {
            let mut terms: Vec<String> = engine.wildcard_query(p, *strategy)?.into_iter().collect();
            terms.sort_unstable();
            Answer::Terms(terms)
        }
    })
}
