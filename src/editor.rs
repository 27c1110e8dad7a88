use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, instrument};

/// Editors that understand `-c "set ft=gitcommit"`.
const VIM_FAMILY: [&str; 3] = ["vim", "gvim", "mvim"];

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Editor command is empty")]
    EmptyCommand,

    #[error("Failed to launch editor `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Editor `{program}` exited with {status}")]
    Exited { program: String, status: String },
}

/// Build the argv that opens `path` in `editor`.
///
/// `editor` may carry its own arguments (`code --wait`), and the program may
/// be wrapped in single or double quotes when its path contains spaces.
/// Arguments after the program are split on whitespace; quoting inside them
/// is not interpreted. Vim variants get the gitcommit filetype so comment
/// lines are highlighted. The path is always last.
pub fn build_editor_command(editor: &str, path: &Path) -> Vec<String> {
    let mut command = split_editor(editor);

    let is_vim = command
        .first()
        .and_then(|program| Path::new(program).file_name())
        .and_then(|name| name.to_str())
        .is_some_and(|name| VIM_FAMILY.contains(&name));
    if is_vim {
        command.push("-c".to_string());
        command.push("set ft=gitcommit".to_string());
    }

    command.push(path.display().to_string());
    command
}

fn split_editor(editor: &str) -> Vec<String> {
    let editor = editor.trim();
    let quoted = editor
        .chars()
        .next()
        .filter(|c| *c == '"' || *c == '\'')
        .and_then(|quote| {
            let rest = &editor[1..];
            rest.find(quote).map(|end| (&rest[..end], &rest[end + 1..]))
        });

    match quoted {
        Some((program, args)) => std::iter::once(program.to_string())
            .chain(args.split_whitespace().map(str::to_string))
            .collect(),
        None => editor.split_whitespace().map(str::to_string).collect(),
    }
}

/// Runs a command in the foreground and waits for it to exit.
pub trait InteractiveRunner: Send + Sync {
    fn run_interactive(&self, command: &[String]) -> Result<(), EditorError>;
}

/// Hands the terminal to the child: stdin, stdout and stderr are inherited.
pub struct ForegroundRunner;

impl InteractiveRunner for ForegroundRunner {
    #[instrument(skip(self))]
    fn run_interactive(&self, command: &[String]) -> Result<(), EditorError> {
        let (program, args) = command.split_first().ok_or(EditorError::EmptyCommand)?;

        debug!("waiting for editor to exit");
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| EditorError::Launch {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(EditorError::Exited {
                program: program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
