use std::fmt;

/// Bare local branch name of a ref given as `branch`, `owner:branch` or
/// `owner/repo:branch`: everything after the last `:`.
///
/// Malformed input is passed through; `"owner:"` yields `""`.
pub fn local_branch(spec: &str) -> &str {
    spec.rsplit_once(':').map_or(spec, |(_, branch)| branch)
}

/// A base or head reference as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef(String);

impl BranchRef {
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    /// Build `owner:branch`, the form the command defaults to.
    pub fn qualified(owner: &str, branch: &str) -> Self {
        Self(format!("{owner}:{branch}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local_branch(&self) -> &str {
        local_branch(&self.0)
    }

    /// Owner qualifier, if the ref carries one.
    pub fn owner(&self) -> Option<&str> {
        let (qualifier, _) = self.0.split_once(':')?;
        let owner = qualifier.split('/').next().unwrap_or(qualifier);
        Some(owner)
    }

    /// `owner:branch` as GitHub expects for the `head` field; the repo part
    /// of `owner/repo:branch` is dropped.
    pub fn head_spec(&self) -> String {
        match self.owner() {
            Some(owner) => format!("{owner}:{}", self.local_branch()),
            None => self.local_branch().to_string(),
        }
    }
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title and body recovered from an edited draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub title: String,
    pub body: String,
}

/// Everything needed to open a pull request from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    pub title: String,
    pub body: String,
    pub base: BranchRef,
    pub head: BranchRef,
}

/// Turns an existing issue into a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequestParams {
    pub issue: u64,
    pub base: BranchRef,
    pub head: BranchRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestTarget {
    Message(RequestParams),
    Issue(IssueRequestParams),
}

impl PullRequestTarget {
    pub fn base(&self) -> &BranchRef {
        match self {
            PullRequestTarget::Message(params) => &params.base,
            PullRequestTarget::Issue(params) => &params.base,
        }
    }

    pub fn head(&self) -> &BranchRef {
        match self {
            PullRequestTarget::Message(params) => &params.head,
            PullRequestTarget::Issue(params) => &params.head,
        }
    }
}

/// The pull request GitHub created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Parsed components of a GitHub issue URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueUrl {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}
