pub mod draft;
pub mod message;
pub mod types;

pub use types::{BranchRef, CreatedPullRequest, IssueUrl, ParsedMessage};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::context::PullRequestContext;
use crate::editor::{build_editor_command, EditorError};
use crate::git::GitError;
use crate::github::GitHubError;
use types::{IssueRequestParams, PullRequestTarget, RequestParams};

#[derive(Debug, Error)]
pub enum PrError {
    #[error("Failed to access pull request message: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Aborting due to empty pull request title")]
    EmptyTitle,

    #[error("Invalid issue URL: {0}")]
    InvalidIssueUrl(String),

    #[error("Aborted: {count} commits are not yet pushed to {upstream}. Use -f to force")]
    UnpushedCommits { count: usize, upstream: String },

    #[error(transparent)]
    Submit(#[from] GitHubError),
}

/// Options of the `pull-request` command.
#[derive(Debug, Clone, Default)]
pub struct PullRequestArgs {
    /// Title, or the URL of an issue to convert
    pub title: Option<String>,
    /// Issue number to convert
    pub issue: Option<u64>,
    pub base: Option<String>,
    pub head: Option<String>,
    /// Skip the unpushed-commits check
    pub force: bool,
}

/// Parse a GitHub issue URL into its component parts.
/// Expected format: https://github.com/{owner}/{repo}/issues/{number}
pub fn parse_issue_url(url: &str) -> Result<IssueUrl, PrError> {
    let invalid = || PrError::InvalidIssueUrl(url.to_string());

    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;
    if parsed.host_str() != Some("github.com") {
        return Err(invalid());
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "issues" {
        return Err(invalid());
    }

    let number = segments[3].parse::<u64>().map_err(|_| invalid())?;

    Ok(IssueUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        number,
    })
}

fn looks_like_url(title: &str) -> bool {
    let title = title.trim();
    (title.starts_with("https://") || title.starts_with("http://"))
        && !title.contains(char::is_whitespace)
}

/// Open a pull request: resolve base and head, work out the title and body
/// (asking the user through the editor when no title was given) and submit.
#[instrument(skip_all, fields(force = args.force))]
pub async fn open_pull_request(
    ctx: &PullRequestContext,
    args: PullRequestArgs,
) -> Result<CreatedPullRequest, PrError> {
    if !args.force {
        ensure_pushed(ctx)?;
    }

    let base = match args.base {
        Some(base) => BranchRef::new(base),
        None => BranchRef::qualified(&ctx.owner()?, ctx.config.default_base_branch()),
    };
    let head = match args.head {
        Some(head) => BranchRef::new(head),
        None => BranchRef::qualified(&ctx.owner()?, &ctx.repository.current_branch()?),
    };
    info!(base = %base, head = %head, "resolved pull request refs");

    // An issue URL names the repository the issue lives in; the pull
    // request has to be opened there.
    let (issue, issue_repo) = match (args.issue, args.title.as_deref()) {
        (Some(issue), _) => (Some(issue), None),
        (None, Some(title)) if looks_like_url(title) => {
            let url = parse_issue_url(title.trim())?;
            debug!(owner = %url.owner, repo = %url.repo, issue = url.number, "title is an issue URL");
            (Some(url.number), Some((url.owner, url.repo)))
        }
        _ => (None, None),
    };

    let target = match issue {
        Some(issue) => PullRequestTarget::Issue(IssueRequestParams { issue, base, head }),
        None => {
            let message = match args.title {
                Some(title) => ParsedMessage {
                    title: title.trim().to_string(),
                    body: String::new(),
                },
                None => edit_message(ctx, &base, &head)?,
            };
            if message.title.is_empty() {
                return Err(PrError::EmptyTitle);
            }
            PullRequestTarget::Message(RequestParams {
                title: message.title,
                body: message.body,
                base,
                head,
            })
        }
    };

    let (owner, repo) = match issue_repo {
        Some(destination) => destination,
        None => (ctx.owner()?, ctx.repo_name()?),
    };
    info!(owner = %owner, repo = %repo, "submitting pull request");
    let created = ctx.requests.create_pull_request(&owner, &repo, &target).await?;
    Ok(created)
}

fn ensure_pushed(ctx: &PullRequestContext) -> Result<(), PrError> {
    match ctx.repository.unpushed_commits()? {
        Some(unpushed) if unpushed.count > 0 => Err(PrError::UnpushedCommits {
            count: unpushed.count,
            upstream: unpushed.upstream,
        }),
        _ => Ok(()),
    }
}

/// Draft a message from the commit log, let the user edit it and read it
/// back. The draft file stays in place afterwards.
#[instrument(skip_all, fields(base = %base, head = %head))]
fn edit_message(
    ctx: &PullRequestContext,
    base: &BranchRef,
    head: &BranchRef,
) -> Result<ParsedMessage, PrError> {
    let path = ctx.repository.metadata_dir()?.join(draft::DRAFT_FILE);
    draft::compose_draft(&path, base, head, ctx.repository.as_ref())?;

    let editor = ctx.editor()?;
    let command = build_editor_command(&editor, &path);
    debug!(?command, "launching editor");
    ctx.runner.run_interactive(&command)?;

    let message = message::read_message(&path)?;
    debug!(title = %message.title, body_bytes = message.body.len(), "parsed pull request message");
    Ok(message)
}
