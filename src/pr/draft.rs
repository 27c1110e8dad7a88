use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use super::types::BranchRef;
use super::PrError;
use crate::git::Repository;

/// Scratch file name inside the repository's metadata directory.
pub const DRAFT_FILE: &str = "PULLREQ_EDITMSG";

/// Write the editable draft for a pull request from `head` into `base`.
#[instrument(skip_all, fields(base = %base, head = %head))]
pub fn compose_draft(
    path: &Path,
    base: &BranchRef,
    head: &BranchRef,
    repo: &dyn Repository,
) -> Result<(), PrError> {
    let logs = repo.commit_logs(base.local_branch(), head.local_branch())?;
    debug!(log_bytes = logs.len(), "fetched commit logs");

    let draft = render_draft(base, head, &logs);
    write_draft(path, &draft)?;
    debug!(path = %path.display(), "wrote draft");
    Ok(())
}

/// Draft content: instructions followed by the commented-out commit log.
pub fn render_draft(base: &BranchRef, head: &BranchRef, commit_logs: &str) -> String {
    format!(
        "
# Requesting a pull to {base} from {head}
#
# Write a message for this pull request. The first block
# of the text is the title and the rest is description.
#
# Changes:
#
{}
",
        comment_out(commit_logs)
    )
}

/// Prefix every line with `# ` and drop the trailing spaces that leaves on
/// blank lines.
fn comment_out(text: &str) -> String {
    text.trim()
        .split('\n')
        .map(|line| {
            let commented = format!("# {line}");
            commented.trim_end_matches(' ').to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_draft(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())
}
