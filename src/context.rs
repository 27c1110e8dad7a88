use std::sync::Arc;

use crate::config::Config;
use crate::editor::InteractiveRunner;
use crate::git::{GitError, Repository};
use crate::github::ReviewRequestService;

/// Collaborators the pull-request command runs against.
///
/// Nothing is looked up when the context is built; repository state is
/// read on demand while the command runs.
#[derive(Clone)]
pub struct PullRequestContext {
    pub config: Config,
    pub repository: Arc<dyn Repository>,
    pub runner: Arc<dyn InteractiveRunner>,
    pub requests: Arc<dyn ReviewRequestService>,
}

impl PullRequestContext {
    pub fn new(
        config: Config,
        repository: Arc<dyn Repository>,
        runner: Arc<dyn InteractiveRunner>,
        requests: Arc<dyn ReviewRequestService>,
    ) -> Self {
        Self {
            config,
            repository,
            runner,
            requests,
        }
    }

    pub fn owner(&self) -> Result<String, GitError> {
        match non_blank(&self.config.github.owner) {
            Some(owner) => Ok(owner),
            None => self.repository.owner(),
        }
    }

    pub fn repo_name(&self) -> Result<String, GitError> {
        match non_blank(&self.config.github.repo) {
            Some(repo) => Ok(repo),
            None => self.repository.repo_name(),
        }
    }

    pub fn editor(&self) -> Result<String, GitError> {
        match non_blank(&self.config.pull_request.editor) {
            Some(editor) => Ok(editor),
            None => self.repository.editor(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
