//! The owner of one open file: loads its diff and runs actions on blocking
//! workers, and installs results only if nothing newer was requested since.

use crate::action::{ActionContext, ActionError, ChunkAction, Outcome};
use crate::apply::{ApplyOptions, RepositoryState};
use crate::diff::{DiffDocument, DiffOption, SideBySideView, ViewCache, WordHighlighter};
use crate::git::{self, DiffSource, GitCommandError, GitRunner};
use crate::selection::Selection;
use error_set::error_set;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

error_set! {
    /// Errors from background work
    SessionError := {
        #[display("Worker task failed: {message}")]
        WorkerFailed { message: String },
        #[display("No diff is loaded")]
        NoDocument,
        GitCommandError(GitCommandError),
        ActionError(ActionError),
    }
}

/// Orders requests; a result is only installed under the newest ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// The newest value of a sequence of requests
#[derive(Debug)]
pub struct Latest<T> {
    generation: u64,
    value: Option<Arc<T>>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            value: None,
        }
    }
}

impl<T> Latest<T> {
    pub fn issue(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    /// Install `value` if `ticket` is still the newest one
    pub fn install(&mut self, ticket: Ticket, value: T) -> Option<Arc<T>> {
        if ticket.0 != self.generation {
            debug!(ticket = ticket.0, latest = self.generation, "discarding superseded result");
            return None;
        }
        let value = Arc::new(value);
        self.value = Some(Arc::clone(&value));
        Some(value)
    }

    pub fn get(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }
}

/// Run blocking work on a worker thread
pub async fn run_blocking<F, R>(work: F) -> Result<R, SessionError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SessionError::WorkerFailed {
            message: e.to_string(),
        })
}

/// A diff load in flight
pub struct PendingDiff {
    ticket: Ticket,
    handle: JoinHandle<Result<DiffDocument, GitCommandError>>,
}

impl PendingDiff {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

pub struct DiffSession {
    runner: Arc<dyn GitRunner>,
    state: Arc<dyn RepositoryState>,
    options: ApplyOptions,
    context: u32,
    document: Latest<DiffDocument>,
    views: ViewCache,
}

impl DiffSession {
    pub fn new(
        runner: Arc<dyn GitRunner>,
        state: Arc<dyn RepositoryState>,
        options: ApplyOptions,
        context: u32,
    ) -> Self {
        Self {
            runner,
            state,
            options,
            context,
            document: Latest::default(),
            views: ViewCache::new(),
        }
    }

    /// Start loading the diff of `path`. Any load requested earlier is
    /// superseded.
    pub fn request(&mut self, path: &str, option: DiffOption) -> PendingDiff {
        let source = match &option.working_copy {
            Some(change) if option.unstaged && change.is_untracked() => DiffSource::Untracked,
            _ if option.unstaged => DiffSource::Unstaged,
            _ => DiffSource::Staged,
        };
        let ticket = self.document.issue();
        let runner = Arc::clone(&self.runner);
        let path = path.to_string();
        let context = self.context;

        debug!(%path, ?source, ticket = ticket.0, "loading diff");
        let handle = tokio::task::spawn_blocking(move || -> Result<DiffDocument, GitCommandError> {
            let text = git::diff_text(runner.as_ref(), &path, source, context)?;
            Ok(DiffDocument::from_raw_with(&text, &WordHighlighter)
                .with_path(path)
                .with_option(option))
        });

        PendingDiff { ticket, handle }
    }

    /// Wait for a load and install its document unless a newer load was
    /// requested in the meantime. Returns the installed document.
    pub async fn complete(
        &mut self,
        pending: PendingDiff,
    ) -> Result<Option<Arc<DiffDocument>>, SessionError> {
        let document = pending
            .handle
            .await
            .map_err(|e| SessionError::WorkerFailed {
                message: e.to_string(),
            })??;
        Ok(self.document.install(pending.ticket, document))
    }

    /// Load the diff of `path` and install it
    pub async fn load(
        &mut self,
        path: &str,
        option: DiffOption,
    ) -> Result<Option<Arc<DiffDocument>>, SessionError> {
        let pending = self.request(path, option);
        self.complete(pending).await
    }

    pub fn document(&self) -> Option<&Arc<DiffDocument>> {
        self.document.get()
    }

    /// Side-by-side view of the current document, rebuilt only when the
    /// document changed
    pub fn side_by_side(&mut self) -> Option<Arc<SideBySideView>> {
        let document = Arc::clone(self.document.get()?);
        if let Some(view) = self.views.current()
            && Arc::ptr_eq(view.document(), &document)
        {
            return Some(Arc::clone(view));
        }
        Some(self.views.view_for(document))
    }

    pub fn views_mut(&mut self) -> &mut ViewCache {
        &mut self.views
    }

    /// Run `action` on `selection` of the current document on a worker
    pub async fn perform(
        &self,
        action: ChunkAction,
        selection: Selection,
    ) -> Result<Outcome, SessionError> {
        let document = Arc::clone(self.document.get().ok_or(SessionError::NoDocument)?);
        let runner = Arc::clone(&self.runner);
        let state = Arc::clone(&self.state);
        let options = self.options.clone();

        let outcome = run_blocking(move || {
            let ctx = ActionContext {
                runner: runner.as_ref(),
                state: state.as_ref(),
                options: &options,
            };
            action.perform(&ctx, &document, &selection)
        })
        .await??;
        Ok(outcome)
    }
}
