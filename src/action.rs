//! Stage, unstage and discard a selection of a working copy diff.
//!
//! A selection that covers every change of the file is handled by git as a
//! whole-file operation. Anything smaller goes through patch synthesis and
//! `git apply`.

use crate::apply::{ApplyError, ApplyMode, ApplyOptions, PatchApplier, RepositoryState, WatchSuspension};
use crate::change::Change;
use crate::diff::DiffDocument;
use crate::git::{self, GitCommandError, GitRunner};
use crate::patch::{Direction, PatchError, PatchKind, PatchRequest, PatchTarget, synthesize_patch};
use crate::selection::Selection;
use error_set::error_set;
use std::fmt;
use tracing::{debug, info};

error_set! {
    /// Errors from chunk actions
    ActionError := {
        #[display("{path} is not a working copy change")]
        NotWorkingCopy { path: String },
        #[display("Cannot {action} from the {diff} diff of {path}")]
        WrongDiff { action: String, diff: String, path: String },
        PatchError(PatchError),
        ApplyError(ApplyError),
        GitCommandError(GitCommandError),
    }
}

/// Collaborators an action runs against
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    pub runner: &'a dyn GitRunner,
    pub state: &'a dyn RepositoryState,
    pub options: &'a ApplyOptions,
}

impl ActionContext<'_> {
    fn applier(&self) -> PatchApplier<'_> {
        PatchApplier {
            runner: self.runner,
            state: self.state,
            options: self.options,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkAction {
    Stage,
    Unstage,
    Discard,
}

impl fmt::Display for ChunkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChunkAction::Stage => "stage",
            ChunkAction::Unstage => "unstage",
            ChunkAction::Discard => "discard",
        })
    }
}

/// What an action ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The selection holds no change
    Nothing,
    /// The whole file was handled without a patch
    WholeFile,
    /// A patch with this many hunks was applied
    Patched { hunks: usize },
}

impl ChunkAction {
    /// Run the action on `selection` of `document`.
    ///
    /// Staging needs an unstaged diff and unstaging a staged one. Discarding
    /// works on either, dropping the change from the working tree only or
    /// from both index and working tree.
    pub fn perform(
        self,
        ctx: &ActionContext<'_>,
        document: &DiffDocument,
        selection: &Selection,
    ) -> Result<Outcome, ActionError> {
        let change = document
            .option
            .working_copy
            .as_ref()
            .ok_or_else(|| ActionError::NotWorkingCopy {
                path: document.path.clone(),
            })?;
        let unstaged = document.option.unstaged;

        if matches!((self, unstaged), (ChunkAction::Stage, false) | (ChunkAction::Unstage, true)) {
            return Err(ActionError::WrongDiff {
                action: self.to_string(),
                diff: if unstaged { "unstaged" } else { "staged" }.to_string(),
                path: change.path.clone(),
            });
        }

        if !selection.has_changes {
            debug!(path = %change.path, "selection holds no change");
            return Ok(Outcome::Nothing);
        }

        if !selection.has_lines_outside_selection {
            self.whole_file(ctx, change, unstaged)?;
            return Ok(Outcome::WholeFile);
        }

        let (direction, mode, new_file) = match self {
            ChunkAction::Stage => (Direction::Forward, ApplyMode::Stage, change.is_untracked()),
            ChunkAction::Unstage => (
                Direction::Reverse,
                ApplyMode::Unstage,
                change.is_new_in_index(),
            ),
            ChunkAction::Discard if unstaged => (
                Direction::Reverse,
                ApplyMode::DiscardWorkTree,
                change.is_new_in_index(),
            ),
            ChunkAction::Discard => (
                Direction::Reverse,
                ApplyMode::DiscardIndex,
                change.is_new_in_index(),
            ),
        };

        let mut target = PatchTarget::new(change.path.clone());
        if new_file {
            target = target.with_kind(PatchKind::NewFile);
        }
        if let Some(blob) = git::staged_blob(ctx.runner, &change.path)? {
            target = target.with_blob(blob);
        }

        let patch = synthesize_patch(&PatchRequest {
            document,
            selection,
            target: &target,
            direction,
        })?;
        ctx.applier().apply(&patch, mode)?;

        Ok(Outcome::Patched {
            hunks: patch.hunk_count(),
        })
    }

    fn whole_file(
        self,
        ctx: &ActionContext<'_>,
        change: &Change,
        unstaged: bool,
    ) -> Result<(), GitCommandError> {
        let path = change.path.as_str();
        let mut paths = vec![path];
        if let Some(original) = change.original_path.as_deref() {
            paths.insert(0, original);
        }

        let mut args: Vec<&str> = match self {
            ChunkAction::Stage => vec!["add"],
            ChunkAction::Unstage if change.is_new_in_index() => vec!["rm", "--cached"],
            ChunkAction::Unstage => vec!["restore", "--staged"],
            ChunkAction::Discard if unstaged && change.is_untracked() => vec!["clean", "-f"],
            ChunkAction::Discard if unstaged => vec!["restore"],
            ChunkAction::Discard if change.is_new_in_index() => vec!["rm", "-f"],
            ChunkAction::Discard => vec!["restore", "--staged", "--worktree"],
        };
        args.push("--");
        match self {
            ChunkAction::Unstage | ChunkAction::Discard if !unstaged => args.extend(&paths),
            _ => args.push(path),
        }

        let _suspension = WatchSuspension::new(ctx.state);
        git::run_checked(ctx.runner, &args)?;
        info!(action = %self, path, "handled whole file");
        ctx.state.notify_dirty();
        Ok(())
    }
}
