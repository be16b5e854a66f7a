use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use wordex::{api, EmptyTokens, Indexer, IndexerConfig};

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "In-memory inverted index over text files", long_about = None)]
struct Args {
    /// JSON file with indexer settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Do not index the empty token produced by leading/trailing punctuation
    #[arg(long, global = true)]
    drop_empty_tokens: bool,

    /// Stem words and drop English stop words
    #[arg(long, global = true)]
    stem: bool,

    /// Skip symbolic links while walking
    #[arg(long, global = true)]
    no_follow_symlinks: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive prompt (default)
    Repl,
    /// Index a path once and look up words
    Search {
        path: PathBuf,
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Serve index/query over HTTP
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        addr: String,
        /// Paths to index before accepting requests
        #[arg(short, long)]
        index: Vec<PathBuf>,
    },
}

impl Args {
    fn indexer_config(&self) -> Result<IndexerConfig> {
        let mut config = match &self.config {
            Some(path) => IndexerConfig::load(path)?,
            None => IndexerConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.drop_empty_tokens {
            config.empty_tokens = EmptyTokens::Drop;
        }
        if self.stem {
            config.stemming = true;
        }
        if self.no_follow_symlinks {
            config.follow_symlinks = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let engine = Indexer::with_config(args.indexer_config()?);

    match args.command.unwrap_or(Command::Repl) {
        Command::Repl => repl(&engine),
        Command::Search { path, words } => {
            index_path(&engine, &path)?;
            for word in words {
                print_results(&engine, &word);
            }
            Ok(())
        }
        Command::Serve { addr, index } => {
            for path in &index {
                index_path(&engine, path)?;
            }
            tokio::runtime::Runtime::new()
                .context("Failed to start async runtime")?
                .block_on(serve(Arc::new(engine), &addr))
        }
    }
}

async fn serve(engine: Arc<Indexer>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, api::create_router(engine))
        .await
        .context("Server error")
}

// Index one path and report timing
fn index_path(engine: &Indexer, path: &Path) -> Result<()> {
    let start = Instant::now();
    engine
        .index(path)
        .with_context(|| format!("Failed to index {}", path.display()))?;
    println!("Indexed {} in {:?}", path.display(), start.elapsed());
    Ok(())
}

fn print_results(engine: &Indexer, word: &str) {
    let mut files: Vec<String> = engine.query(word).into_iter().collect();
    if files.is_empty() {
        println!("No files found containing the word: '{}'.", word);
        return;
    }

    files.sort();
    println!("Files containing the word '{}':", word);
    for file in files {
        println!("  {}", file);
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  index  - Index a file or directory.");
    println!("  query  - Search for files containing a specific word.");
    println!("  help   - Display this help message.");
    println!("  exit   - Quit the application.");
}

/// Print `message` and read one trimmed line; `None` on end of input.
fn prompt(input: &mut impl BufRead, message: &str) -> Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn repl(engine: &Indexer) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("wordex {}", wordex::VERSION);
    print_help();

    loop {
        let Some(command) = prompt(&mut input, "\n> ")? else {
            return Ok(());
        };

        match command.to_lowercase().as_str() {
            "index" => {
                let Some(path) = prompt(&mut input, "Path of the file or directory to index: ")?
                else {
                    return Ok(());
                };
                let path = PathBuf::from(path);
                if !path.exists() {
                    println!("Error: the path {} does not exist.", path.display());
                    continue;
                }
                if let Err(err) = index_path(engine, &path) {
                    println!("Error: {:#}", err);
                }
            }
            "query" => {
                let Some(word) = prompt(&mut input, "Word to search for: ")? else {
                    return Ok(());
                };
                print_results(engine, &word);
            }
            "help" => print_help(),
            "exit" | "quit" => return Ok(()),
            "" => {}
            other => println!("Unknown command '{}'. Type 'help' for the list.", other),
        }
    }
}
