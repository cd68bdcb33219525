//! The search state coordinator.
//!
//! [`SearchCoordinator`] owns the [`SearchState`], acquires a location once,
//! and turns every committed state change into exactly one authoritative
//! backend request. Observers follow along through [`SearchView`] snapshots
//! published on a `tokio::sync::watch` channel.
//!
//! # Lifecycle
//!
//! ```text
//! Inactive ── activate() ──▶ AwaitingCoords ── coords ──▶ Searching
//!                                                         │    ▲
//!                                              settles    ▼    │ set_state()
//!                                       ShowingResults / ShowingError
//! ```
//!
//! Any state change while not awaiting coordinates cancels the current
//! request and starts a new one. [`SearchCoordinator::shutdown`], or dropping
//! the coordinator, cancels everything still running.
//!
//! # Supersession
//!
//! Every request gets a sequence number and its own child cancellation token.
//! Issuing a request bumps the sequence and cancels the previous token under
//! one lock, and a settling request only touches the view if its sequence is
//! still the current one. A late answer from an old request is dropped even
//! if the transport ignored the cancellation.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use ong_radar_api::{ApiError, HelpType, OrganizationSearch, OrganizationSummary, QueryDescriptor};
use tokio::{runtime::Handle, sync::watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    config::CoordinatorConfig,
    error::Result,
    filters::{Pagination, toggle_help_type},
    geolocation::{Coordinates, GeolocationProvider},
    query::build_query,
    state::{SearchPatch, SearchState},
};

/// The only failure a view ever shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    SearchFailed,
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SEARCH_FAILED")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Created but not activated yet.
    Inactive,
    AwaitingCoords,
    Searching,
    ShowingResults,
    ShowingError,
    TornDown,
}

/// What a result area should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Locating,
    Failed,
    Loading,
    Empty,
    Results,
}

/// Snapshot of everything an observer needs to render a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
    pub state: SearchState,
    pub coords: Option<Coordinates>,
    pub items: Vec<OrganizationSummary>,
    pub loading: bool,
    pub error: Option<SearchFailure>,
    /// A full page came back, so another one may exist. Inferred; the
    /// backend does not report a total.
    pub has_next: bool,
    pub stage: Stage,
    /// Sequence number of the latest issued request, 0 before the first.
    pub request_seq: u64,
}

impl SearchView {
    fn new(state: SearchState) -> Self {
        Self {
            state,
            coords: None,
            items: Vec::new(),
            loading: true,
            error: None,
            has_next: false,
            stage: Stage::Inactive,
            request_seq: 0,
        }
    }

    pub const fn coords_ready(&self) -> bool {
        self.coords.is_some()
    }

    pub fn phase(&self) -> ViewPhase {
        if !self.coords_ready() {
            ViewPhase::Locating
        } else if self.error.is_some() {
            ViewPhase::Failed
        } else if self.loading {
            ViewPhase::Loading
        } else if self.items.is_empty() {
            ViewPhase::Empty
        } else {
            ViewPhase::Results
        }
    }

    pub const fn pagination(&self) -> Pagination {
        Pagination {
            page: self.state.page,
            has_next: self.has_next,
        }
    }

    /// No request is pending for this view.
    pub const fn is_settled(&self) -> bool {
        matches!(
            self.stage,
            Stage::ShowingResults | Stage::ShowingError | Stage::TornDown
        )
    }
}

#[derive(Debug, Default)]
struct Control {
    seq: u64,
    in_flight: Option<CancellationToken>,
    activated: bool,
}

/// Shared between the coordinator handle and its spawned tasks.
struct Pipeline<C> {
    client: C,
    config: CoordinatorConfig,
    root: CancellationToken,
    runtime: Handle,
    control: Mutex<Control>,
    view: watch::Sender<SearchView>,
}

impl<C: OrganizationSearch> Pipeline<C> {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel whatever is in flight and, if coordinates are known, start a
    /// new request for the current state. Must be called with `control` held.
    fn issue(self: &Arc<Self>, control: &mut Control, delay: Duration) {
        if let Some(previous) = control.in_flight.take() {
            debug!(seq = control.seq, "Superseding in-flight search");
            previous.cancel();
        }
        if self.root.is_cancelled() {
            return;
        }
        let coords = self.view.borrow().coords;
        let Some(coords) = coords else {
            trace!("Coordinates not resolved yet, deferring search");
            return;
        };

        control.seq += 1;
        let seq = control.seq;
        let token = self.root.child_token();
        control.in_flight = Some(token.clone());

        let mut query = None;
        self.view.send_modify(|view| {
            view.loading = true;
            view.error = None;
            view.stage = Stage::Searching;
            view.request_seq = seq;
            query = Some(build_query(&view.state, coords));
        });
        let Some(query) = query else {
            return;
        };
        debug!(seq, query = %query.to_query_string(), ?delay, "Issuing search");

        let pipeline = Arc::clone(self);
        self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return,
                    () = tokio::time::sleep(delay) => {}
                }
            }
            if token.is_cancelled() {
                return;
            }
            let outcome = pipeline.client.search(&query, token.clone()).await;
            pipeline.settle(seq, &token, &query, outcome);
        });
    }

    fn settle(
        &self,
        seq: u64,
        token: &CancellationToken,
        query: &QueryDescriptor,
        outcome: std::result::Result<Vec<OrganizationSummary>, ApiError>,
    ) {
        let mut control = self.lock();
        if control.seq != seq || token.is_cancelled() {
            debug!(seq, current = control.seq, "Discarding superseded search result");
            return;
        }
        control.in_flight = None;

        match outcome {
            Ok(items) => {
                let has_next = items.len() == query.limit as usize;
                debug!(seq, count = items.len(), has_next, "Search settled");
                self.view.send_modify(|view| {
                    view.items = items;
                    view.has_next = has_next;
                    view.loading = false;
                    view.error = None;
                    view.stage = Stage::ShowingResults;
                });
            }
            Err(err) if err.is_cancelled() => {
                debug!(seq, "Search cancelled without being superseded");
                self.view.send_modify(|view| {
                    view.loading = false;
                    view.stage = Stage::ShowingResults;
                });
            }
            Err(err) => {
                warn!(seq, error = %err, "Organization search failed");
                // Stale results under an error banner would be misleading.
                self.view.send_modify(|view| {
                    view.items.clear();
                    view.has_next = false;
                    view.loading = false;
                    view.error = Some(SearchFailure::SearchFailed);
                    view.stage = Stage::ShowingError;
                });
            }
        }
    }

    fn coords_resolved(self: &Arc<Self>, coords: Coordinates) {
        let mut control = self.lock();
        if self.root.is_cancelled() {
            return;
        }
        info!(lat = coords.lat, lng = coords.lng, "Location resolved");
        self.view.send_modify(|view| view.coords = Some(coords));
        self.issue(&mut control, Duration::ZERO);
    }
}

/// Orchestrates geolocation, state changes and backend searches for one
/// search screen.
///
/// Must be created inside a tokio runtime; all background work is spawned on
/// that runtime.
///
/// ```no_run
/// use ong_radar::{
///     CoordinatorConfig, FixedLocation, HttpSearchClient, SearchCoordinator, SearchPatch,
///     api::ApiConfig,
/// };
///
/// # async fn run() -> ong_radar::error::Result<()> {
/// let client = HttpSearchClient::new(ApiConfig::from_env()?)?;
/// let here = FixedLocation(ong_radar::Coordinates::new(-23.5, -46.6));
/// let coordinator = SearchCoordinator::new(here, client, CoordinatorConfig::default())?;
///
/// coordinator.activate();
/// let view = coordinator.settled().await;
/// println!("{} organizations nearby", view.items.len());
///
/// coordinator.set_state(SearchPatch::new().name("patas"));
/// # Ok(())
/// # }
/// ```
pub struct SearchCoordinator<G, C> {
    geolocation: Arc<G>,
    pipeline: Arc<Pipeline<C>>,
}

impl<G, C> SearchCoordinator<G, C>
where
    G: GeolocationProvider,
    C: OrganizationSearch,
{
    pub fn new(geolocation: G, client: C, config: CoordinatorConfig) -> Result<Self> {
        let state = config.initial_state();
        Self::with_state(geolocation, client, config, state)
    }

    /// Start from `state` instead of the configured defaults.
    pub fn with_state(
        geolocation: G,
        client: C,
        config: CoordinatorConfig,
        state: SearchState,
    ) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let (view, _) = watch::channel(SearchView::new(state));

        Ok(Self {
            geolocation: Arc::new(geolocation),
            pipeline: Arc::new(Pipeline {
                client,
                config,
                root: CancellationToken::new(),
                runtime,
                control: Mutex::new(Control::default()),
                view,
            }),
        })
    }

    /// Begin acquiring a location. Only the first call has any effect; the
    /// first search goes out once the location resolves.
    #[instrument(name = "Activate SearchCoordinator", skip_all, level = "info")]
    pub fn activate(&self) {
        let mut control = self.pipeline.lock();
        if control.activated || self.pipeline.root.is_cancelled() {
            return;
        }
        control.activated = true;
        self.pipeline
            .view
            .send_modify(|view| view.stage = Stage::AwaitingCoords);
        drop(control);

        let token = self.pipeline.root.child_token();
        let geolocation = Arc::clone(&self.geolocation);
        let pipeline = Arc::clone(&self.pipeline);
        self.pipeline.runtime.spawn(async move {
            let coords = tokio::select! {
                biased;
                () = token.cancelled() => return,
                coords = geolocation.acquire() => coords,
            };
            pipeline.coords_resolved(coords);
        });
    }

    /// Apply `patch` and, if anything changed, supersede the current request
    /// with one for the new state. Returns whether the state changed.
    ///
    /// The state is updated before this returns; the request itself runs in
    /// the background. Name edits wait for the configured debounce first.
    pub fn set_state(&self, patch: SearchPatch) -> bool {
        self.update(|_| patch)
    }

    /// Like [`Self::set_state`], with the patch derived from the current
    /// state under the same lock that applies it.
    fn update(&self, patch: impl FnOnce(&SearchState) -> SearchPatch) -> bool {
        let pipeline = &self.pipeline;
        let mut control = pipeline.lock();

        let bounds = &pipeline.config.radius_bounds;
        let mut change = None;
        pipeline.view.send_if_modified(|view| {
            let patch = patch(&view.state);
            let applied = view.state.apply(patch, bounds);
            change = Some(applied);
            applied.any()
        });
        let Some(change) = change.filter(|c| c.any()) else {
            return false;
        };
        trace!(?change, "Search state changed");

        if control.activated {
            let delay = if change.name {
                pipeline.config.name_debounce
            } else {
                Duration::ZERO
            };
            pipeline.issue(&mut control, delay);
        }
        true
    }

    pub fn set_name(&self, name: impl Into<String>) -> bool {
        self.set_state(SearchPatch::new().name(name))
    }

    /// Set the committed radius.
    pub fn set_radius_km(&self, radius_km: f64) -> bool {
        self.set_state(SearchPatch::new().radius_km(radius_km))
    }

    pub fn set_help_types(&self, help_types: impl IntoIterator<Item = HelpType>) -> bool {
        self.set_state(SearchPatch::new().help_types(help_types))
    }

    pub fn toggle_help_type(&self, help: HelpType) -> bool {
        self.update(|state| toggle_help_type(&state.help_types, help))
    }

    pub fn go_to_page(&self, page: u32) -> bool {
        self.set_state(SearchPatch::new().page(page))
    }

    /// Advance one page, only if the last page was full.
    pub fn next_page(&self) -> bool {
        self.view()
            .pagination()
            .next()
            .is_some_and(|patch| self.set_state(patch))
    }

    pub fn prev_page(&self) -> bool {
        self.view()
            .pagination()
            .prev()
            .is_some_and(|patch| self.set_state(patch))
    }

    pub fn state(&self) -> SearchState {
        self.pipeline.view.borrow().state.clone()
    }

    pub fn view(&self) -> SearchView {
        self.pipeline.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.pipeline.view.subscribe()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.pipeline.config
    }

    /// Wait until no request is pending and return that view.
    ///
    /// Never returns for a coordinator that was not activated.
    pub async fn settled(&self) -> SearchView {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(SearchView::is_settled).await.map(|v| v.clone());
        settled.unwrap_or_else(|_| self.view())
    }

    /// Cancel the in-flight request and the pending location lookup. Late
    /// settlements are ignored and no further requests are issued.
    pub fn shutdown(&self) {
        let mut control = self.pipeline.lock();
        if self.pipeline.root.is_cancelled() {
            return;
        }
        info!(seq = control.seq, "Shutting down SearchCoordinator");
        self.pipeline.root.cancel();
        control.in_flight = None;
        self.pipeline.view.send_modify(|view| {
            view.loading = false;
            view.stage = Stage::TornDown;
        });
    }
}

impl<G, C> Drop for SearchCoordinator<G, C> {
    fn drop(&mut self) {
        self.pipeline.root.cancel();
    }
}
