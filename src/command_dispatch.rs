//! Purpose: Hold top-level CLI command dispatch for `igscrape`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap; map commands to operations and files.
//! Invariants: Credentials load before any operation; validation runs before any request.
//! Invariants: A failed operation always leaves an error file and a non-zero exit.

use super::*;

use clap::CommandFactory;
use igscrape::api::{Fetcher, Outcome, Scraper, ThordataClient};
use igscrape::core::config::Config;
use igscrape::core::params::{self, OperationRequest, PostsQuery, ReelsQuery};
use igscrape::output::{file_stem_for, save_error, save_json, timestamp_now};

pub(super) fn dispatch_command(command: Command, options: RunOptions) -> Result<RunOutcome, Error> {
    if let Command::Completion { shell } = command {
        let mut cmd = Cli::command();
        clap_complete::aot::generate(shell, &mut cmd, "igscrape", &mut io::stdout());
        return Ok(RunOutcome::ok());
    }

    let config = Config::from_env()?;
    let (request, name) = operation_for(command)?;

    let client = ThordataClient::new(config);
    let scraper = Scraper::new(client, Fetcher::default())
        .with_timing(options.max_wait, options.poll_interval);

    match scraper.run(&request) {
        Outcome::Data(value) => {
            let path = save_json(&options.output_dir, &name, &value)?;
            println!("Saved to {}", path.display());
            Ok(RunOutcome::ok())
        }
        Outcome::Failed(record) => {
            let path = save_error(&options.output_dir, &name, &timestamp_now(), &record)?;
            println!("Saved error to {}", path.display());
            Err(Error::new(record.kind())
                .with_message(record.error.clone())
                .with_task_id(record.task_id.clone())
                .with_path(path))
        }
    }
}

/// Validated operation plus the output file stem for a command.
fn operation_for(command: Command) -> Result<(OperationRequest, String), Error> {
    match command {
        Command::Posts {
            profile,
            limit,
            start_date,
            end_date,
            post_type,
        } => {
            let name = file_stem_for("posts", &profile);
            let request = params::posts_by_profile(&PostsQuery {
                profile_url: profile,
                limit: Some(limit),
                start_date,
                end_date,
                post_type: post_type.into(),
            })?;
            Ok((request, name))
        }
        Command::Post { url } => Ok((params::post_by_url(&url)?, "post_details".to_string())),
        Command::Profile { target, mode } => Ok((
            params::profile(&target, mode.map(Into::into))?,
            "profile".to_string(),
        )),
        Command::Reels(args) => {
            let name = file_stem_for("reels", &args.url);
            Ok((params::all_reels_by_profile(&reels_query(args))?, name))
        }
        Command::ReelsList(args) => {
            let name = file_stem_for("reels_list", &args.url);
            Ok((params::reels_list_by_profile(&reels_query(args))?, name))
        }
        Command::Reel { url } => Ok((params::reel_by_url(&url)?, "reel_details".to_string())),
        Command::Comments { url } => Ok((params::comments_by_post(&url)?, "comments".to_string())),
        Command::Completion { .. } => {
            Err(Error::new(ErrorKind::Internal).with_message("completion is not a scraping operation"))
        }
    }
}

fn reels_query(args: ReelsArgs) -> ReelsQuery {
    ReelsQuery {
        url: args.url,
        limit: Some(args.limit),
        exclude: args.exclude,
        start_date: args.start_date,
        end_date: args.end_date,
    }
}
