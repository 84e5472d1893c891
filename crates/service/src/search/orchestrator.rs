use std::sync::{Arc, Mutex, MutexGuard};

use models::{DogId, SortDirection};
use tracing::{debug, info, instrument, warn};

use crate::api::{CatalogApi, MatchApi};
use crate::errors::{ApiError, IntentError};
use crate::matching::MatchClient;
use crate::observability::STALE_RESPONSES_TOTAL;

use super::state::{Applied, HydrateTicket, Operation, SearchOutcome, SearchState, SearchTicket};
use super::view::{SearchView, UserIntent};

/// Drives the search view: applies intents to [`SearchState`] and runs the remote calls
/// each transition asks for.
///
/// Clones share state, so a shell can hand a clone to each spawned intent. The state lock
/// is never held across an `.await`; ordering comes from the tickets alone.
pub struct SearchOrchestrator<A> {
    api: Arc<A>,
    matcher: Arc<MatchClient<A>>,
    state: Arc<Mutex<SearchState>>,
}

impl<A> Clone for SearchOrchestrator<A> {
    fn clone(&self) -> Self {
        Self { api: Arc::clone(&self.api), matcher: Arc::clone(&self.matcher), state: Arc::clone(&self.state) }
    }
}

impl<A: CatalogApi + MatchApi> SearchOrchestrator<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            matcher: Arc::new(MatchClient::new(Arc::clone(&api))),
            api,
            state: Arc::new(Mutex::new(SearchState::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SearchState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> SearchView {
        self.lock().view()
    }

    /// First display: breeds, locations and an unfiltered search, concurrently.
    /// Each failure is recorded on its own and does not hold up the others.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        tokio::join!(self.load_breeds(), self.load_locations(), self.refresh());
        info!("search_view_initialized");
    }

    /// Apply one intent and run whatever remote calls it triggers.
    pub async fn dispatch(&self, intent: UserIntent) -> Result<(), IntentError> {
        debug!(?intent, "intent");
        match intent {
            UserIntent::FilterBreedChanged(breed) => self.filter_breed(breed).await,
            UserIntent::FilterLocationChanged(zip) => self.filter_location(zip).await,
            UserIntent::SortChanged(direction) => self.sort(direction).await,
            UserIntent::PageChanged(page) => return self.change_page(page).await,
            UserIntent::DogFavorited(id) => return self.favorite(&id).map(|_| ()),
            UserIntent::DogUnfavorited(id) => {
                self.unfavorite(&id);
            }
            UserIntent::MatchRequested => return self.generate_match().await,
            UserIntent::Retry => self.retry().await,
        }
        Ok(())
    }

    pub async fn filter_breed(&self, breed: Option<String>) {
        let ticket = self.with_state(|s| s.filter_breed(breed));
        self.run_search(ticket).await;
    }

    pub async fn filter_location(&self, zip_code: Option<String>) {
        let ticket = self.with_state(|s| s.filter_location(zip_code));
        self.run_search(ticket).await;
    }

    pub async fn sort(&self, direction: SortDirection) {
        let ticket = self.with_state(|s| s.sort(direction));
        self.run_search(ticket).await;
    }

    pub async fn change_page(&self, page: u32) -> Result<(), IntentError> {
        let ticket = self.with_state(|s| s.page(page))?;
        self.run_search(ticket).await;
        Ok(())
    }

    /// Re-run the search for the current criteria.
    pub async fn refresh(&self) {
        let ticket = self.with_state(SearchState::begin_search);
        self.run_search(Some(ticket)).await;
    }

    /// Add a dog from the displayed page (or the match) to favorites.
    /// Returns false when it was already a favorite.
    pub fn favorite(&self, id: &DogId) -> Result<bool, IntentError> {
        self.with_state(|s| {
            let dog = s.visible_dog(id).cloned().ok_or_else(|| IntentError::UnknownDog(id.clone()))?;
            Ok(s.add_favorite(dog))
        })
    }

    /// Returns false when the id was not a favorite.
    pub fn unfavorite(&self, id: &DogId) -> bool {
        self.with_state(|s| s.remove_favorite(id))
    }

    /// Submit favorites for a match, then fetch the matched record.
    #[instrument(skip(self))]
    pub async fn generate_match(&self) -> Result<(), IntentError> {
        let ticket = self.with_state(SearchState::begin_match).ok_or(IntentError::MatchUnavailable)?;
        let result = self.matcher.generate(&ticket.favorites).await;
        log_failure(Operation::Match, &result);
        if self.with_state(|s| s.finish_match(&ticket, result)) == Applied::Stale {
            discard(Operation::Match, ticket.seq);
        }
        Ok(())
    }

    /// Re-issue every operation whose last attempt failed.
    pub async fn retry(&self) {
        let failed = self.with_state(|s| s.failed_operations());
        if failed.is_empty() {
            return;
        }
        info!(?failed, "retrying_failed_operations");

        let breeds = async {
            if failed.contains(&Operation::Breeds) {
                self.load_breeds().await;
            }
        };
        let locations = async {
            if failed.contains(&Operation::Locations) {
                self.load_locations().await;
            }
        };
        let results = async {
            if failed.contains(&Operation::Search) {
                self.refresh().await;
            } else if failed.contains(&Operation::Hydrate) {
                let ticket = self.with_state(SearchState::begin_hydrate);
                if let Some(ticket) = ticket {
                    self.run_hydrate(ticket).await;
                }
            }
        };
        let matching = async {
            if failed.contains(&Operation::Match) {
                // Favorites may have emptied since the failure; nothing to retry then.
                let _ = self.generate_match().await;
            }
        };
        tokio::join!(breeds, locations, results, matching);
    }

    async fn load_breeds(&self) {
        self.with_state(SearchState::begin_breeds);
        let result = self.api.breeds().await;
        log_failure(Operation::Breeds, &result);
        self.with_state(|s| s.finish_breeds(result));
    }

    async fn load_locations(&self) {
        self.with_state(SearchState::begin_locations);
        let result = self.api.locations().await;
        log_failure(Operation::Locations, &result);
        self.with_state(|s| s.finish_locations(result));
    }

    /// Search, then hydrate the resulting ids if this search is still the latest.
    async fn run_search(&self, ticket: Option<SearchTicket>) {
        let Some(ticket) = ticket else { return };
        debug!(seq = ticket.seq, query = ?ticket.criteria.to_query(), "search_issued");
        let result = self.api.search(&ticket.criteria).await;
        log_failure(Operation::Search, &result);

        match self.with_state(|s| s.finish_search(&ticket, result)) {
            SearchOutcome::Hydrate(hydrate) => self.run_hydrate(hydrate).await,
            SearchOutcome::Stale => discard(Operation::Search, ticket.seq),
            SearchOutcome::Empty => debug!(seq = ticket.seq, "search_no_results"),
            SearchOutcome::Failed => {}
        }
    }

    async fn run_hydrate(&self, ticket: HydrateTicket) {
        debug!(seq = ticket.seq, ids = ticket.ids.len(), "hydrate_issued");
        let result = self.api.fetch_dogs(&ticket.ids).await;
        log_failure(Operation::Hydrate, &result);
        if self.with_state(|s| s.finish_hydrate(&ticket, result)) == Applied::Stale {
            discard(Operation::Hydrate, ticket.seq);
        }
    }
}

fn log_failure<T>(operation: Operation, result: &Result<T, ApiError>) {
    if let Err(e) = result {
        warn!(?operation, kind = ?e.kind(), error = %e, "operation_failed");
    }
}

fn discard(operation: Operation, seq: u64) {
    STALE_RESPONSES_TOTAL.inc();
    debug!(?operation, seq, "stale_response_discarded");
}
