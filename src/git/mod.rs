use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to launch git: {0}")]
    Launch(#[source] std::io::Error),

    #[error("`git {command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    #[error("Remote `origin` does not point to a GitHub repository: {0}")]
    NotGitHubRemote(String),
}

/// Local commits on the current branch that its upstream lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpushedCommits {
    pub upstream: String,
    pub count: usize,
}

/// The slice of repository state the pull-request flow reads.
pub trait Repository: Send + Sync {
    /// Owner of the repository `origin` points to.
    fn owner(&self) -> Result<String, GitError>;

    /// Name of the repository `origin` points to.
    fn repo_name(&self) -> Result<String, GitError>;

    fn current_branch(&self) -> Result<String, GitError>;

    /// Editor command configured for git.
    fn editor(&self) -> Result<String, GitError>;

    /// The repository's internal metadata directory (`.git`).
    fn metadata_dir(&self) -> Result<PathBuf, GitError>;

    /// Human-readable log of commits on `to` that are not on `from`.
    fn commit_logs(&self, from: &str, to: &str) -> Result<String, GitError>;

    /// `None` when the current branch has no upstream.
    fn unpushed_commits(&self) -> Result<Option<UnpushedCommits>, GitError>;
}

/// [`Repository`] backed by the `git` executable.
pub struct GitCli {
    workspace_root: PathBuf,
}

impl GitCli {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    fn git(&self, args: &[&str]) -> Result<String, GitError> {
        debug!(?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workspace_root)
            .output()
            .map_err(GitError::Launch)?;

        if !output.status.success() {
            return Err(GitError::Command {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn origin(&self) -> Result<(String, String), GitError> {
        let url = self.git(&["remote", "get-url", "origin"])?;
        let url = url.trim();
        parse_remote_url(url).ok_or_else(|| GitError::NotGitHubRemote(url.to_string()))
    }
}

impl Repository for GitCli {
    fn owner(&self) -> Result<String, GitError> {
        self.origin().map(|(owner, _)| owner)
    }

    fn repo_name(&self) -> Result<String, GitError> {
        self.origin().map(|(_, repo)| repo)
    }

    fn current_branch(&self) -> Result<String, GitError> {
        let branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = branch.trim();
        if branch.is_empty() || branch == "HEAD" {
            return Err(GitError::DetachedHead);
        }
        Ok(branch.to_string())
    }

    fn editor(&self) -> Result<String, GitError> {
        // `git var` already honours core.editor, GIT_EDITOR, VISUAL and EDITOR.
        if let Ok(editor) = self.git(&["var", "GIT_EDITOR"]) {
            let editor = editor.trim();
            if !editor.is_empty() {
                return Ok(editor.to_string());
            }
        }

        let editor = ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string());
        Ok(editor)
    }

    fn metadata_dir(&self) -> Result<PathBuf, GitError> {
        let dir = self.git(&["rev-parse", "--git-dir"])?;
        Ok(resolve_against(&self.workspace_root, dir.trim()))
    }

    #[instrument(skip(self))]
    fn commit_logs(&self, from: &str, to: &str) -> Result<String, GitError> {
        let range = format!("{from}...{to}");
        self.git(&[
            "log",
            "--no-color",
            "--format=%h (%aN, %ar)%n%w(78,3,3)%s%n",
            "--cherry",
            &range,
        ])
    }

    fn unpushed_commits(&self) -> Result<Option<UnpushedCommits>, GitError> {
        let upstream = match self.git(&[
            "rev-parse",
            "--abbrev-ref",
            "--symbolic-full-name",
            "@{upstream}",
        ]) {
            Ok(upstream) => upstream.trim().to_string(),
            Err(GitError::Command { stderr, .. }) if is_missing_upstream(&stderr) => {
                debug!(%stderr, "current branch has no upstream");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let count = self.git(&["rev-list", "--count", "@{upstream}..HEAD"])?;
        let count = count.trim().parse::<usize>().map_err(|_| GitError::Command {
            command: "rev-list --count @{upstream}..HEAD".to_string(),
            stderr: format!("unexpected output: {}", count.trim()),
        })?;

        Ok(Some(UnpushedCommits { upstream, count }))
    }
}

/// `rev-parse @{upstream}` failed because there is nothing to compare
/// against, rather than because the repository itself is unusable.
fn is_missing_upstream(stderr: &str) -> bool {
    stderr.contains("no upstream configured")
        || stderr.contains("does not point to a branch")
}

fn is_github_host(host: &str) -> bool {
    host == "github.com" || host.ends_with(".github.com")
}

fn resolve_against(root: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Extract `(owner, repo)` from a GitHub remote URL.
///
/// Accepts `git@github.com:owner/repo.git`, `https://github.com/owner/repo(.git)`
/// and `ssh://git@github.com/owner/repo.git`.
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let path = if let Some(rest) = url.strip_prefix("git@") {
        let (host, path) = rest.split_once(':')?;
        if !is_github_host(host) {
            return None;
        }
        path.to_string()
    } else {
        let parsed = reqwest::Url::parse(url).ok()?;
        if !is_github_host(parsed.host_str()?) {
            return None;
        }
        parsed.path().to_string()
    };

    let mut segments = path.trim_matches('/').split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    if segments.next().is_some() {
        return None;
    }
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory [`Repository`] for exercising the pipeline without git.
    pub struct FakeRepository {
        pub owner: String,
        pub repo: String,
        pub branch: String,
        pub editor: String,
        pub metadata_dir: PathBuf,
        pub logs: String,
        pub unpushed: Option<UnpushedCommits>,
        pub log_requests: Mutex<Vec<(String, String)>>,
    }

    impl FakeRepository {
        pub fn new(metadata_dir: &Path) -> Self {
            Self {
                owner: "octo".to_string(),
                repo: "hello".to_string(),
                branch: "topic".to_string(),
                editor: "vim".to_string(),
                metadata_dir: metadata_dir.to_path_buf(),
                logs: "abc1234 (Mona, 2 hours ago)\n   Add greeting\n".to_string(),
                unpushed: None,
                log_requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl Repository for FakeRepository {
        fn owner(&self) -> Result<String, GitError> {
            Ok(self.owner.clone())
        }

        fn repo_name(&self) -> Result<String, GitError> {
            Ok(self.repo.clone())
        }

        fn current_branch(&self) -> Result<String, GitError> {
            Ok(self.branch.clone())
        }

        fn editor(&self) -> Result<String, GitError> {
            Ok(self.editor.clone())
        }

        fn metadata_dir(&self) -> Result<PathBuf, GitError> {
            Ok(self.metadata_dir.clone())
        }

        fn commit_logs(&self, from: &str, to: &str) -> Result<String, GitError> {
            self.log_requests
                .lock()
                .unwrap()
                .push((from.to_string(), to.to_string()));
            Ok(self.logs.clone())
        }

        fn unpushed_commits(&self) -> Result<Option<UnpushedCommits>, GitError> {
            Ok(self.unpushed.clone())
        }
    }

    #[test]
    fn test_parse_scp_remote() {
        assert_eq!(
            parse_remote_url("git@github.com:octo/hello.git"),
            Some(("octo".to_string(), "hello".to_string()))
        );
    }

    #[test]
    fn test_parse_https_remote() {
        assert_eq!(
            parse_remote_url("https://github.com/octo/hello"),
            Some(("octo".to_string(), "hello".to_string()))
        );
        assert_eq!(
            parse_remote_url("https://github.com/octo/hello.git/"),
            Some(("octo".to_string(), "hello".to_string()))
        );
    }

    #[test]
    fn test_parse_ssh_remote() {
        assert_eq!(
            parse_remote_url("ssh://git@github.com/octo/hello.git"),
            Some(("octo".to_string(), "hello".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        assert_eq!(parse_remote_url("https://gitlab.com/octo/hello.git"), None);
        assert_eq!(parse_remote_url("git@gitlab.com:octo/hello.git"), None);
        assert_eq!(parse_remote_url("https://github.com/octo"), None);
        assert_eq!(parse_remote_url("not a url"), None);
    }

    #[test]
    fn test_parse_rejects_lookalike_hosts() {
        assert_eq!(parse_remote_url("https://notgithub.com/octo/hello.git"), None);
        assert_eq!(parse_remote_url("git@evilgithub.com:octo/hello.git"), None);
        assert_eq!(
            parse_remote_url("https://ssh.github.com/octo/hello.git"),
            Some(("octo".to_string(), "hello".to_string()))
        );
    }

    #[test]
    fn test_only_upstream_errors_mean_no_upstream() {
        assert!(is_missing_upstream(
            "fatal: no upstream configured for branch 'topic'"
        ));
        assert!(is_missing_upstream("fatal: HEAD does not point to a branch"));
        assert!(!is_missing_upstream(
            "fatal: not a git repository (or any of the parent directories): .git"
        ));
        assert!(!is_missing_upstream(""));
    }

    #[test]
    fn test_resolve_relative_git_dir() {
        let root = Path::new("/work/hello");
        assert_eq!(resolve_against(root, ".git"), PathBuf::from("/work/hello/.git"));
        assert_eq!(
            resolve_against(root, "/elsewhere/.git"),
            PathBuf::from("/elsewhere/.git")
        );
    }
}
