//! Purpose: `igscrape` CLI entry point.
//! Role: Binary crate root; parses args, sets up logging, delegates to command dispatch.
//! Invariants: Each invocation runs at most one scraping operation.
//! Invariants: Logs go to stderr; stdout carries only "Saved ..." lines and completions.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use igscrape::api::{Error, ErrorKind, to_exit_code};
use igscrape::core::config::RunOptions;
use igscrape::core::params::{PostType, ProfileMode};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `igscrape --help`."));
            }
        },
    };

    let _ = dotenvy::dotenv();
    init_tracing();

    let options = RunOptions {
        max_wait: Duration::from_secs(cli.timeout),
        poll_interval: Duration::from_secs(cli.poll_interval),
        output_dir: cli.output_dir,
    };

    command_dispatch::dispatch_command(cli.command, options)
        .map_err(add_config_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Debug, Parser)]
#[command(
    name = "igscrape",
    version,
    about = "Instagram scraper powered by the Thordata Web Scraper API",
    long_about = None,
    after_help = r#"EXAMPLES
  $ igscrape posts --profile https://www.instagram.com/zoobarcelona --limit 20
  $ igscrape profile zoobarcelona
  $ igscrape reels https://www.instagram.com/zoobarcelona --start-date 01-01-2025
  $ igscrape comments https://www.instagram.com/p/ABC123/

CREDENTIALS
  THORDATA_SCRAPER_TOKEN, THORDATA_PUBLIC_TOKEN and THORDATA_PUBLIC_KEY
  are read from the environment or a .env file in the working directory."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "output",
        help = "Directory for result and error files",
        value_hint = ValueHint::DirPath
    )]
    output_dir: PathBuf,
    #[arg(
        long,
        global = true,
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Maximum seconds to wait for a task to finish"
    )]
    timeout: u64,
    #[arg(
        long,
        global = true,
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between task status checks"
    )]
    poll_interval: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PostTypeCli {
    #[value(name = "Post")]
    Post,
    #[value(name = "Reel")]
    Reel,
    #[value(name = "Both")]
    Both,
}

impl From<PostTypeCli> for PostType {
    fn from(value: PostTypeCli) -> Self {
        match value {
            PostTypeCli::Post => PostType::Post,
            PostTypeCli::Reel => PostType::Reel,
            PostTypeCli::Both => PostType::Both,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ProfileModeCli {
    Username,
    Url,
}

impl From<ProfileModeCli> for ProfileMode {
    fn from(value: ProfileModeCli) -> Self {
        match value {
            ProfileModeCli::Username => ProfileMode::Username,
            ProfileModeCli::Url => ProfileMode::Url,
        }
    }
}

#[derive(Args, Debug)]
struct ReelsArgs {
    #[arg(help = "Profile URL, e.g. 'https://www.instagram.com/username'")]
    url: String,
    #[arg(long, default_value_t = 10, help = "Number of reels to scrape")]
    limit: u32,
    #[arg(long, help = "Post IDs to exclude (comma-separated)")]
    exclude: Option<String>,
    #[arg(long, help = "Start date (MM-DD-YYYY)")]
    start_date: Option<String>,
    #[arg(long, help = "End date (MM-DD-YYYY)")]
    end_date: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Get posts from a profile URL")]
    Posts {
        #[arg(
            long,
            help = "Profile URL, e.g. 'https://www.instagram.com/username'"
        )]
        profile: String,
        #[arg(long, default_value_t = 10, help = "Number of posts to scrape")]
        limit: u32,
        #[arg(long, help = "Start date (MM-DD-YYYY), e.g. '01-01-2025'")]
        start_date: Option<String>,
        #[arg(long, help = "End date (MM-DD-YYYY), e.g. '12-31-2025'")]
        end_date: Option<String>,
        #[arg(long, value_enum, default_value = "Post", help = "Post type filter")]
        post_type: PostTypeCli,
    },
    #[command(about = "Get post details by post URL")]
    Post {
        #[arg(help = "Post URL, e.g. 'https://www.instagram.com/p/ABC123/'")]
        url: String,
    },
    #[command(about = "Get profile information")]
    Profile {
        #[arg(help = "Username (e.g. 'zoobarcelona') or profile URL")]
        target: String,
        #[arg(long, value_enum, help = "Force mode. Default: auto-detect")]
        mode: Option<ProfileModeCli>,
    },
    #[command(about = "Get reels from a profile")]
    Reels(ReelsArgs),
    #[command(name = "reels-list", about = "Get reels list from a profile URL")]
    ReelsList(ReelsArgs),
    #[command(about = "Get reel details by reel URL")]
    Reel {
        #[arg(help = "Reel URL, e.g. 'https://www.instagram.com/reel/ABC123/'")]
        url: String,
    },
    #[command(about = "Get comments from a post or reel")]
    Comments {
        #[arg(help = "Post or reel URL")]
        url: String,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn add_config_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Config || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check the THORDATA_* variables in the environment or .env file.")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check network connectivity, --output-dir, and disk space.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn emit_error(err: &Error) {
    let rendered = if io::stderr().is_terminal() {
        error_text(err)
    } else {
        serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
            "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
        })
    };
    eprintln!("{rendered}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(err.kind().as_str()));
    inner.insert("message".to_string(), json!(err.summary()));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(task_id) = err.task_id() {
        inner.insert("task_id".to_string(), json!(task_id));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    let causes = err.causes();
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }
    json!({ "error": Value::Object(inner) })
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", err.summary())];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(task_id) = err.task_id() {
        lines.push(format!("task: {task_id}"));
    }
    if let Some(cause) = err.causes().first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

/// First non-blank line of clap's rendered error, without its `error:` tag.
fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}
