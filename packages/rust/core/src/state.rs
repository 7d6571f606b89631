//! View state holder: the one mutable owner of the aggregated experts.
//!
//! [`ExpertsState`] is passed explicitly to whatever presents it. Its only
//! mutators are [`refresh`](ExpertsState::refresh),
//! [`set_criteria`](ExpertsState::set_criteria),
//! [`clear_criteria`](ExpertsState::clear_criteria) and
//! [`select`](ExpertsState::select).

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument};

use expertdesk_fetcher::HttpFetcher;
use expertdesk_shared::{ExpertId, ExpertView, RawSnapshot, Result};

use crate::aggregate::aggregate_snapshot;
use crate::filter::{CriteriaPatch, FilterCriteria, filter};
use crate::listing::{Facets, Page, facets, paginate};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Anything that can produce a complete raw snapshot.
pub trait SnapshotSource {
    /// Fetch all five collections, or fail as a whole.
    fn fetch_all(&self) -> impl Future<Output = Result<RawSnapshot>> + Send;
}

impl SnapshotSource for HttpFetcher {
    fn fetch_all(&self) -> impl Future<Output = Result<RawSnapshot>> + Send {
        HttpFetcher::fetch_all(self)
    }
}

/// User-facing notification channel (toasts, status lines, stderr).
pub trait Notifier: Send + Sync {
    /// Report a failure the user should see.
    fn error(&self, message: &str);
    /// Report a completed operation.
    fn success(&self, _message: &str) {}
    /// Called whenever the loading flag changes.
    fn loading(&self, _loading: bool) {}
}

/// Notifier that only writes to the tracing log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        error!("{message}");
    }

    fn success(&self, message: &str) {
        info!("{message}");
    }

    fn loading(&self, loading: bool) {
        debug!(loading, "loading state changed");
    }
}

/// Holds the loading flag up for as long as it lives.
///
/// Dropping the guard clears the flag, so a cancelled refresh never leaves
/// the state stuck in loading.
struct LoadingGuard<'a, N: Notifier> {
    flag: &'a mut bool,
    notifier: &'a N,
}

impl<'a, N: Notifier> LoadingGuard<'a, N> {
    fn raise(flag: &'a mut bool, notifier: &'a N) -> Self {
        *flag = true;
        notifier.loading(true);
        Self { flag, notifier }
    }
}

impl<N: Notifier> Drop for LoadingGuard<'_, N> {
    fn drop(&mut self) {
        *self.flag = false;
        self.notifier.loading(false);
    }
}

// ---------------------------------------------------------------------------
// ExpertsState
// ---------------------------------------------------------------------------

/// Current experts, filters, loading flag, and selection.
pub struct ExpertsState<S, N> {
    source: S,
    notifier: N,
    experts: Vec<ExpertView>,
    criteria: FilterCriteria,
    loading: bool,
    selected: Option<ExpertId>,
    refreshed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl<S: SnapshotSource, N: Notifier> ExpertsState<S, N> {
    /// Create an empty state; call [`refresh`](Self::refresh) to load data.
    pub fn new(source: S, notifier: N) -> Self {
        Self {
            source,
            notifier,
            experts: Vec::new(),
            criteria: FilterCriteria::default(),
            loading: false,
            selected: None,
            refreshed_at: None,
            last_error: None,
        }
    }

    /// Start from the given criteria instead of the identity filter.
    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Re-fetch and re-aggregate everything, replacing the current experts.
    ///
    /// On failure the previous experts are kept, the error goes to the
    /// notifier, and it is also returned. Taking `&mut self` rules out two
    /// refreshes overlapping on the same state. Loading transitions are
    /// reported through [`Notifier::loading`].
    #[instrument(skip_all)]
    pub async fn refresh(&mut self) -> Result<usize> {
        let outcome = {
            let _loading = LoadingGuard::raise(&mut self.loading, &self.notifier);
            self.source.fetch_all().await
        };

        match outcome {
            Ok(snapshot) => {
                self.experts = aggregate_snapshot(&snapshot);
                self.refreshed_at = Some(Utc::now());
                self.last_error = None;

                if let Some(id) = self.selected {
                    if !self.experts.iter().any(|e| e.id == id) {
                        info!(expert_id = %id, "selected expert no longer present");
                        self.selected = None;
                    }
                }

                let count = self.experts.len();
                info!(count, "experts refreshed");
                self.notifier.success(&format!("Loaded {count} experts"));
                Ok(count)
            }
            Err(e) => {
                let message = format!("Failed to load experts data: {e}");
                self.notifier.error(&message);
                self.last_error = Some(message);
                Err(e)
            }
        }
    }

    /// Merge a partial filter update.
    pub fn set_criteria(&mut self, patch: CriteriaPatch) {
        self.criteria.merge(patch);
    }

    /// Reset every filter to its disabled state.
    pub fn clear_criteria(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    /// Select an expert by id, or clear the selection with `None`.
    ///
    /// Returns `false` (and clears the selection) when the id is unknown.
    pub fn select(&mut self, id: Option<ExpertId>) -> bool {
        match id {
            Some(id) if self.experts.iter().any(|e| e.id == id) => {
                self.selected = Some(id);
                true
            }
            Some(_) => {
                self.selected = None;
                false
            }
            None => {
                self.selected = None;
                true
            }
        }
    }

    /// The selected expert, if any.
    pub fn selected(&self) -> Option<&ExpertView> {
        let id = self.selected?;
        self.experts.iter().find(|e| e.id == id)
    }

    /// All aggregated experts, unfiltered.
    pub fn experts(&self) -> &[ExpertView] {
        &self.experts
    }

    /// Experts passing the current criteria, in aggregation order.
    pub fn filtered(&self) -> Vec<&ExpertView> {
        filter(&self.experts, &self.criteria)
    }

    /// One page of the filtered experts.
    pub fn page(&self, page: usize, per_page: usize) -> Page<&ExpertView> {
        paginate(&self.filtered(), page, per_page)
    }

    /// Facet choices across all experts (not just the filtered ones).
    pub fn facets(&self) -> Facets {
        facets(&self.experts)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
