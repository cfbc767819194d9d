//! Running git, and the typed queries built on top of it.

use crate::change::{Change, StatusSide, parse_name_status, parse_porcelain};
use crate::tag::{TAG_FORMAT, Tag, parse_tags};
use error_set::error_set;
use nom::{
    IResult, Parser,
    character::complete::{char, digit1, hex_digit1, space1},
    sequence::terminated,
};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

error_set! {
    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run {program}: {message}")]
        SpawnFailed { program: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
    }
}

/// Exit status and captured streams of one git invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs git with the given arguments and reports how it went.
///
/// A non-zero exit is not an error at this level; callers decide what a
/// failure means.
pub trait GitRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<CommandOutput, GitCommandError>;
}

/// [`GitRunner`] backed by the git executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCli {
    pub program: String,
    pub repo: PathBuf,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            program: "git".to_string(),
            repo: repo.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }
}

impl GitRunner for GitCli {
    fn run(&self, args: &[&str]) -> Result<CommandOutput, GitCommandError> {
        debug!(program = %self.program, repo = %self.repo.display(), ?args, "running git");

        let output = Command::new(&self.program)
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .map_err(|e| GitCommandError::SpawnFailed {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn command_name(args: &[&str]) -> String {
    args.first().copied().unwrap_or_default().to_string()
}

fn into_text(args: &[&str], output: CommandOutput) -> Result<String, GitCommandError> {
    String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
        command: command_name(args),
        message: e.to_string(),
    })
}

/// Run git and return its stdout, treating a non-zero exit as an error
pub fn run_checked(runner: &dyn GitRunner, args: &[&str]) -> Result<String, GitCommandError> {
    let output = runner.run(args)?;
    if !output.success() {
        return Err(GitCommandError::ExitError {
            command: command_name(args),
            stderr: output.stderr,
        });
    }
    into_text(args, output)
}

/// Which two states of a file a diff compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSource {
    /// Index to working tree
    Unstaged,
    /// HEAD to index
    Staged,
    /// Nothing to working tree, for files git does not track yet
    Untracked,
}

/// Unified diff text of one file
pub fn diff_text(
    runner: &dyn GitRunner,
    path: &str,
    source: DiffSource,
    context: u32,
) -> Result<String, GitCommandError> {
    let unified = format!("-U{context}");
    let mut args = vec!["diff", "--no-ext-diff", "--no-color", unified.as_str()];
    match source {
        DiffSource::Unstaged => args.extend(["--", path]),
        DiffSource::Staged => args.extend(["--cached", "--", path]),
        DiffSource::Untracked => args.extend(["--no-index", "--", "/dev/null", path]),
    }

    let output = runner.run(&args)?;
    // `--no-index` exits with 1 when the files differ
    let differs = source == DiffSource::Untracked && output.code == Some(1);
    if !output.success() && !differs {
        return Err(GitCommandError::ExitError {
            command: command_name(&args),
            stderr: output.stderr,
        });
    }
    into_text(&args, output)
}

/// `<mode> <blob> <stage>\t<path>`, yielding the blob id
fn staged_entry(input: &str) -> IResult<&str, &str> {
    let (path, (_mode, blob, _stage)) = (
        terminated(digit1, space1),
        terminated(hex_digit1, space1),
        terminated(digit1, char('\t')),
    )
        .parse(input)?;
    Ok((path, blob))
}

/// Blob id of the staged version of `path`, if it is in the index
pub fn staged_blob(runner: &dyn GitRunner, path: &str) -> Result<Option<String>, GitCommandError> {
    let output = run_checked(runner, &["ls-files", "-s", "--", path])?;
    Ok(output
        .lines()
        .find_map(|line| staged_entry(line).ok())
        .map(|(_, blob)| blob.to_string()))
}

/// Working copy changes from `git status --porcelain`
pub fn status(runner: &dyn GitRunner) -> Result<Vec<Change>, GitCommandError> {
    let output = run_checked(runner, &["status", "--porcelain", "--untracked-files=all"])?;
    Ok(parse_porcelain(&output))
}

/// Changes staged in the index
pub fn staged_changes(runner: &dyn GitRunner) -> Result<Vec<Change>, GitCommandError> {
    let output = run_checked(runner, &["diff", "--cached", "-M", "--name-status"])?;
    Ok(parse_name_status(&output, StatusSide::Index))
}

/// Files recorded by a stash entry
pub fn stash_changes(runner: &dyn GitRunner, stash: &str) -> Result<Vec<Change>, GitCommandError> {
    let output = run_checked(runner, &["stash", "show", "-M", "--name-status", stash])?;
    Ok(parse_name_status(&output, StatusSide::WorkTree))
}

/// All tags, newest first, with annotated tags resolved to their commit
pub fn tags(runner: &dyn GitRunner) -> Result<Vec<Tag>, GitCommandError> {
    let format = format!("--format={TAG_FORMAT}");
    let output = run_checked(runner, &["tag", "-l", "--sort=-creatordate", &format])?;
    Ok(parse_tags(&output))
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Records every invocation and answers from a script of
    /// `(argument prefix, output)` pairs; unmatched calls succeed with no
    /// output. Patch files named in the arguments are read at call time.
    #[derive(Default)]
    pub struct FakeGit {
        script: Vec<(String, CommandOutput)>,
        calls: Mutex<Vec<String>>,
        patches: Mutex<Vec<String>>,
    }

    impl FakeGit {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, prefix: &str, output: CommandOutput) -> Self {
            self.script.push((prefix.to_string(), output));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn patches(&self) -> Vec<String> {
            self.patches.lock().map(|p| p.clone()).unwrap_or_default()
        }
    }

    impl GitRunner for FakeGit {
        fn run(&self, args: &[&str]) -> Result<CommandOutput, GitCommandError> {
            let call = args.join(" ");
            for arg in args.iter().filter(|arg| arg.ends_with(".patch")) {
                if let (Ok(text), Ok(mut patches)) =
                    (std::fs::read_to_string(arg), self.patches.lock())
                {
                    patches.push(text);
                }
            }
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call.clone());
            }

            Ok(self
                .script
                .iter()
                .find(|(prefix, _)| call.starts_with(prefix.as_str()))
                .map(|(_, output)| output.clone())
                .unwrap_or_else(|| CommandOutput::ok("")))
        }
    }
}
