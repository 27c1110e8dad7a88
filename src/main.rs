mod config;
mod context;
mod editor;
mod git;
mod github;
mod pr;

use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::context::PullRequestContext;
use crate::editor::ForegroundRunner;
use crate::git::GitCli;
use crate::github::GitHubClient;
use crate::pr::PullRequestArgs;

/// pullreq — opens GitHub Pull Requests, drafting the title and body from
/// the local commit log in your editor.
#[derive(Parser, Debug)]
#[command(name = "pullreq", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a pull request on GitHub for the repository `origin` points to.
    ///
    /// Base and head accept "branch", "owner:branch" or "owner/repo:branch".
    /// Without TITLE an editor opens to write the title and body in the
    /// same manner as a git commit message.
    #[command(disable_help_flag = true)]
    PullRequest(PullRequestCli),
}

#[derive(Args, Debug)]
struct PullRequestCli {
    /// Pull request title, or the URL of a GitHub issue to attach to
    #[arg(conflicts_with = "issue")]
    title: Option<String>,

    /// Number of an existing issue to turn into a pull request
    #[arg(short, long, value_name = "ISSUE")]
    issue: Option<u64>,

    /// Base branch [default: <owner>:master]
    #[arg(short, long, value_name = "BASE")]
    base: Option<String>,

    /// Head branch [default: <owner>:<current branch>]
    #[arg(short = 'h', long, value_name = "HEAD")]
    head: Option<String>,

    /// Skip the check for commits not yet pushed upstream
    #[arg(short, long)]
    force: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl From<PullRequestCli> for PullRequestArgs {
    fn from(cli: PullRequestCli) -> Self {
        PullRequestArgs {
            title: cli.title,
            issue: cli.issue,
            base: cli.base,
            head: cli.head,
            force: cli.force,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::PullRequest(args) => run_pull_request(args.into()).await,
    }
}

async fn run_pull_request(args: PullRequestArgs) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading configuration");
    let config = config::Config::load()?;
    let workspace_root = std::env::current_dir()?;
    debug!(root = %workspace_root.display(), api_url = %config.api_url(), "workspace");

    let requests = Arc::new(GitHubClient::new(config.api_url(), config.github_token()));
    let ctx = PullRequestContext::new(
        config,
        Arc::new(GitCli::new(workspace_root)),
        Arc::new(ForegroundRunner),
        requests,
    );

    let created = pr::open_pull_request(&ctx, args).await?;
    info!(number = created.number, "done");
    println!("{}", created.html_url.green().bold());

    Ok(())
}
