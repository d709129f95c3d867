//! kinbox CLI: knowledge inbox
//!
//! Commands: init, parse, add, list, search, toggle, serve, completions

mod format;
mod logging;

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use kinbox_bot::{Bot, IncomingMessage};
use kinbox_core::{user_id, Config, InboxError, User};
use kinbox_parser::KnowledgeParser;
use kinbox_store::{ListFilter, Store};

use crate::format::{format_records, OutputFormat};

/// Exit code for a message that could not be parsed.
const EXIT_PARSE_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "kinbox")]
#[command(version)]
#[command(about = "Knowledge inbox: turns loosely formatted messages into searchable records")]
struct Cli {
    /// Config file (default: ./kinbox.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Chat user id whose records to show (default: everyone)
    #[arg(long)]
    user: Option<i64>,
    /// Only unread records
    #[arg(long)]
    unread: bool,
    /// Maximum number of records
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

impl FilterArgs {
    fn to_filter(&self) -> ListFilter {
        ListFilter {
            adder: self.user.map(user_id),
            unread_only: self.unread,
            limit: self.limit,
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create the database
    Init,
    /// Parse a message and print the record as JSON
    Parse {
        /// Message text (read from stdin when omitted)
        text: Option<String>,
        /// Locale for error messages
        #[arg(long)]
        locale: Option<String>,
    },
    /// Parse a message and store it
    Add {
        /// Message text (read from stdin when omitted)
        text: Option<String>,
        /// Chat user id of the adder
        #[arg(long, default_value_t = 0)]
        user: i64,
        /// Locale for error messages
        #[arg(long)]
        locale: Option<String>,
    },
    /// List stored records, newest first
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Full-text search over stored records
    #[command(alias = "s")]
    Search {
        query: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Toggle a record between read and unread
    Toggle { id: String },
    /// Chat loop: one JSON message per stdin line, one JSON reply per stdout line
    Serve,
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "kinbox", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::discover(cli.config.as_deref()).context("loading config")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    logging::init(&config)?;
    let texts = config.texts().context("loading texts")?;

    match cli.command {
        Commands::Init => {
            open_store(&config)?;
            println!("Initialized kinbox database at {}", config.db_path.display());
        }
        Commands::Parse { text, locale } => {
            let text = message_text(text)?;
            let parser = KnowledgeParser::from_config(&config);
            match parser.parse(&text) {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => {
                    let locale = locale.as_deref().unwrap_or(&config.default_locale);
                    eprintln!("{}", texts.render_error(&e, locale));
                    return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
                }
            }
        }
        Commands::Add { text, user, locale } => {
            let text = message_text(text)?;
            let parser = KnowledgeParser::from_config(&config);
            let record = match parser.parse(&text) {
                Ok(record) => record,
                Err(e) => {
                    let locale = locale.as_deref().unwrap_or(&config.default_locale);
                    eprintln!("{}", texts.render_error(&e, locale));
                    return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
                }
            };
            let store = open_store(&config)?;
            let adder = ensure_user(&store, user)?;
            let knw = store.create_knowledge(&adder, record)?;
            tracing::info!(id = %knw.id, %adder, "added knowledge");
            println!("{}", serde_json::to_string_pretty(&knw)?);
        }
        Commands::List { filter } => {
            let store = open_store(&config)?;
            let items = store.list(&filter.to_filter())?;
            println!("{}", format_records(&items, filter.format));
        }
        Commands::Search { query, filter } => {
            let store = open_store(&config)?;
            let items = store.search(&query, &filter.to_filter())?;
            println!("{}", format_records(&items, filter.format));
        }
        Commands::Toggle { id } => {
            let store = open_store(&config)?;
            let is_read = store.toggle_read(&id)?;
            println!("{}", serde_json::json!({ "id": id, "is_read": is_read }));
        }
        Commands::Serve => {
            let bot = Bot::new(
                KnowledgeParser::from_config(&config),
                open_store(&config)?,
                texts,
            );
            serve(&bot).await?;
        }
        // Handled before config loading.
        Commands::Completions { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn open_store(config: &Config) -> Result<Store, InboxError> {
    Store::open(&config.db_path)
}

/// Argument text, or all of stdin.
fn message_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading message from stdin")?;
            Ok(buf)
        }
    }
}

/// Register a CLI-side adder the first time it is used.
fn ensure_user(store: &Store, chat_id: i64) -> Result<String, InboxError> {
    let id = user_id(chat_id);
    if !store.user_exists(&id)? {
        store.create_user(&User {
            id: id.clone(),
            tg_id: chat_id,
            ..User::default()
        })?;
    }
    Ok(id)
}

/// Feed stdin lines to the bot until EOF or Ctrl-C.
async fn serve(bot: &Bot) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    tracing::info!("reading messages from stdin");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let msg: IncomingMessage = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed message line");
                continue;
            }
        };

        if let Some(reply) = bot.handle(&msg) {
            let mut out = serde_json::to_string(&reply)?;
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
