use error_set::error_set;
use std::sync::Arc;

pub mod action;
pub mod apply;
pub mod change;
pub mod chunk;
pub mod diff;
pub mod git;
pub mod parse;
pub mod patch;
pub mod selection;
pub mod session;
pub mod tag;

pub use action::{ActionContext, ActionError, ChunkAction, Outcome};
pub use apply::{ApplyError, ApplyMode, ApplyOptions, PatchApplier, RepositoryState, Unwatched};
pub use chunk::{ChunkRange, locate_chunk};
pub use diff::{DiffDocument, DiffLine, LineKind, Side, SideBySideView, build_side_by_side};
pub use git::{GitCli, GitCommandError, GitRunner};
pub use parse::{ParseError, RowSpec};
pub use patch::{Direction, PatchBody, PatchError, synthesize_patch};
pub use selection::{Mode, Selection, Target, evaluate_selection};
pub use session::{DiffSession, SessionError};

use change::{Change, ChangeState};
use diff::DiffOption;

error_set! {
    /// Top-level error for git-chunks operations
    GitChunksError := {
        #[display("No changes found in {file}")]
        NoChanges { file: String },
        #[display("Rows {rows} select no change in {file}")]
        EmptySelection { rows: String, file: String },
        ParseError(ParseError),
        PatchError(PatchError),
        ApplyError(ApplyError),
        ActionError(ActionError),
        SessionError(SessionError),
        GitCommandError(GitCommandError),
    }
}

/// Which diff of a file to work on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Index to working tree
    Unstaged,
    /// HEAD to index
    Staged,
}

/// Main interface for git-chunks operations on one repository
pub struct GitChunks {
    runner: Arc<dyn GitRunner>,
    session: DiffSession,
    side_by_side: bool,
}

impl GitChunks {
    /// Create a GitChunks for the repository `git` points at
    pub fn new(git: GitCli, options: ApplyOptions, context: u32) -> Self {
        Self::with_runner(Arc::new(git), Arc::new(Unwatched), options, context)
    }

    pub fn with_runner(
        runner: Arc<dyn GitRunner>,
        state: Arc<dyn RepositoryState>,
        options: ApplyOptions,
        context: u32,
    ) -> Self {
        let session = DiffSession::new(Arc::clone(&runner), state, options, context);
        Self {
            runner,
            session,
            side_by_side: false,
        }
    }

    /// Open documents for display in two columns
    pub fn with_side_by_side(mut self, side_by_side: bool) -> Self {
        self.side_by_side = side_by_side;
        self
    }

    /// Load the diff of `path`, making it the current document
    ///
    /// # Examples
    /// ```no_run
    /// # use git_chunks::{ApplyOptions, DiffKind, GitChunks, GitCli};
    /// # async fn demo() -> Result<(), git_chunks::GitChunksError> {
    /// let mut chunks = GitChunks::new(GitCli::new("."), ApplyOptions::default(), 3);
    /// let doc = chunks.open("src/lib.rs", DiffKind::Unstaged).await?;
    /// println!("{}", git_chunks::diff::format_document(&doc));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(
        &mut self,
        path: &str,
        kind: DiffKind,
    ) -> Result<Arc<DiffDocument>, GitChunksError> {
        let change = self.change(path, kind).await?;
        let option = DiffOption {
            side_by_side: self.side_by_side,
            working_copy: Some(change),
            unstaged: kind == DiffKind::Unstaged,
        };

        let document = self
            .session
            .load(path, option)
            .await?
            .ok_or_else(|| GitChunksError::NoChanges {
                file: path.to_string(),
            })?;
        if !document.has_changes() {
            return Err(GitChunksError::NoChanges {
                file: path.to_string(),
            });
        }
        Ok(document)
    }

    /// Working copy change of `path` on the side `kind` compares
    async fn change(&self, path: &str, kind: DiffKind) -> Result<Change, GitChunksError> {
        let runner = Arc::clone(&self.runner);
        let changes = session::run_blocking(move || git::status(runner.as_ref())).await??;

        changes
            .into_iter()
            .find(|change| {
                change.path == path
                    && match kind {
                        DiffKind::Unstaged => change.worktree != ChangeState::None,
                        DiffKind::Staged => !matches!(
                            change.index,
                            ChangeState::None | ChangeState::Untracked
                        ),
                    }
            })
            .ok_or_else(|| GitChunksError::NoChanges {
                file: path.to_string(),
            })
    }

    /// Render the current document with row indices, combined or as two
    /// columns as its option says
    pub fn render(&mut self) -> Option<String> {
        if self.session.document()?.option.side_by_side {
            let view = self.session.side_by_side()?;
            Some(diff::format_side_by_side(&view))
        } else {
            let document = self.session.document()?;
            Some(diff::format_document(document))
        }
    }

    /// Run `action` on the rows `spec` names in the current document, or in
    /// one column of its side-by-side view
    pub async fn perform(
        &mut self,
        action: ChunkAction,
        spec: RowSpec,
        side: Option<Side>,
    ) -> Result<Outcome, GitChunksError> {
        let document = self
            .session
            .document()
            .cloned()
            .ok_or(SessionError::NoDocument)?;

        let selection = match side {
            Some(side) => {
                let view = self
                    .session
                    .side_by_side()
                    .ok_or(SessionError::NoDocument)?;
                spec.select(Target::Column(&view, side))
            }
            None => spec.select(Target::Combined(&document)),
        };
        let selection = selection
            .filter(|selection| selection.has_changes)
            .ok_or_else(|| GitChunksError::EmptySelection {
                rows: format_spec(spec),
                file: document.path.clone(),
            })?;

        Ok(self.session.perform(action, selection).await?)
    }
}

fn format_spec(spec: RowSpec) -> String {
    match spec {
        RowSpec::Row(row) => row.to_string(),
        RowSpec::Range { start, end } => format!("{start}..{end}"),
    }
}
