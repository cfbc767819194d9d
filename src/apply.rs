//! Applying synthesized patches with `git apply`.

use crate::git::{CommandOutput, GitCommandError, GitRunner};
use crate::patch::PatchBody;
use error_set::error_set;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

error_set! {
    /// Errors from applying a patch
    ApplyError := {
        #[display("Failed to write patch file: {message}")]
        TempFile { message: String },
        #[display("git apply rejected the patch: {stderr}")]
        Rejected { stderr: String },
        GitCommandError(GitCommandError),
    }
}

/// What applying a patch should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Add the patch to the index
    Stage,
    /// Remove the patch from the index
    Unstage,
    /// Remove the patch from both the index and the working tree
    DiscardIndex,
    /// Remove the patch from the working tree
    DiscardWorkTree,
}

impl ApplyMode {
    pub fn flags(self) -> &'static [&'static str] {
        match self {
            ApplyMode::Stage => &["--cached", "--index"],
            ApplyMode::Unstage => &["--cached", "--index", "--reverse"],
            ApplyMode::DiscardIndex => &["--index", "--reverse"],
            ApplyMode::DiscardWorkTree => &["--reverse"],
        }
    }
}

/// The repository-state collaborator that owns file-system watching and
/// refreshes
pub trait RepositoryState: Send + Sync {
    /// The repository changed and should be scanned again
    fn notify_dirty(&self);
    fn set_watch_enabled(&self, enabled: bool);
}

/// Repository state for callers without a watcher
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwatched;

impl RepositoryState for Unwatched {
    fn notify_dirty(&self) {}
    fn set_watch_enabled(&self, _enabled: bool) {}
}

/// Keeps the watcher disabled while alive
pub struct WatchSuspension<'a> {
    state: &'a dyn RepositoryState,
}

impl<'a> WatchSuspension<'a> {
    pub fn new(state: &'a dyn RepositoryState) -> Self {
        state.set_watch_enabled(false);
        Self { state }
    }
}

impl Drop for WatchSuspension<'_> {
    fn drop(&mut self) {
        self.state.set_watch_enabled(true);
    }
}

/// Options passed through to `git apply`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Value of `--whitespace`
    pub whitespace: String,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            whitespace: "nowarn".to_string(),
        }
    }
}

/// Writes patches to a transient file and hands them to `git apply`
pub struct PatchApplier<'a> {
    pub runner: &'a dyn GitRunner,
    pub state: &'a dyn RepositoryState,
    pub options: &'a ApplyOptions,
}

impl PatchApplier<'_> {
    /// Apply `patch` in `mode`.
    ///
    /// The watcher is suspended for the whole operation and the patch file
    /// is removed whether or not git accepts it.
    pub fn apply(&self, patch: &PatchBody, mode: ApplyMode) -> Result<(), ApplyError> {
        let _suspension = WatchSuspension::new(self.state);

        let file = write_patch(patch)?;
        let result = self.run_apply(file.path(), mode);
        if let Err(err) = file.close() {
            warn!(%err, "failed to remove patch file");
        }

        let output = result?;
        if !output.success() {
            return Err(ApplyError::Rejected {
                stderr: output.stderr,
            });
        }

        info!(?mode, hunks = patch.hunk_count(), "applied patch");
        self.state.notify_dirty();
        Ok(())
    }

    fn run_apply(
        &self,
        path: &Path,
        mode: ApplyMode,
    ) -> Result<CommandOutput, ApplyError> {
        let path = path.to_str().ok_or_else(|| ApplyError::TempFile {
            message: format!("non UTF-8 path {}", path.display()),
        })?;
        let whitespace = format!("--whitespace={}", self.options.whitespace);

        let mut args = vec!["apply", whitespace.as_str()];
        args.extend(mode.flags());
        args.push(path);
        Ok(self.runner.run(&args)?)
    }
}

fn write_patch(patch: &PatchBody) -> Result<NamedTempFile, ApplyError> {
    let temp_file_error = |e: std::io::Error| ApplyError::TempFile {
        message: e.to_string(),
    };

    let mut file = tempfile::Builder::new()
        .prefix("git-chunks-")
        .suffix(".patch")
        .tempfile()
        .map_err(temp_file_error)?;
    file.write_all(patch.as_bytes()).map_err(temp_file_error)?;
    file.flush().map_err(temp_file_error)?;
    Ok(file)
}
