//! View state and its named transitions.
//!
//! Every remote call is split into a `begin_*` that hands out a ticket and a `finish_*`
//! that takes the ticket back with the response. A ticket whose sequence number is no
//! longer the latest issued for its operation is stale and its response is dropped, so
//! responses apply last-issued-wins regardless of arrival order.

use models::{order_by_ids, Dog, DogId, Location, ModelError, ResultPage, SearchCriteria, SortDirection};

use crate::errors::{ApiError, FailureKind};
use crate::favorites::FavoriteSet;
use crate::pagination::Pagination;

use super::view::{ResultsState, SearchView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Breeds,
    Locations,
    Search,
    Hydrate,
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Idle,
    Loading,
    Ready,
    Failed(FailureKind),
}

/// Last failure of one operation, kept until that operation next succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub operation: Operation,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub criteria: SearchCriteria,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrateTicket {
    pub seq: u64,
    pub ids: Vec<DogId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTicket {
    pub seq: u64,
    pub favorites: Vec<DogId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A newer search was issued; nothing changed.
    Stale,
    /// Current, but failed; prior results kept.
    Failed,
    /// Current and empty; the displayed page is now empty.
    Empty,
    /// Current with ids; hydrate them next.
    Hydrate(HydrateTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

/// Result ids and page metadata from the latest applied search.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResultSet {
    criteria: SearchCriteria,
    page: ResultPage,
}

/// What is on screen. Dogs, page number and total always come from one criteria snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedPage {
    pub criteria: SearchCriteria,
    pub result_ids: Vec<DogId>,
    pub total: u64,
    pub next: Option<String>,
    pub prev: Option<String>,
    pub dogs: Vec<Dog>,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    criteria: SearchCriteria,
    results: Option<ResultSet>,
    displayed: Option<DisplayedPage>,
    favorites: FavoriteSet,
    breed_options: Vec<String>,
    location_options: Vec<Location>,
    matched: Option<Dog>,

    search_seq: u64,
    /// Sequence of the last search whose response was applied.
    settled_search_seq: u64,
    hydrate_seq: u64,
    match_seq: u64,

    breeds_status: OperationStatus,
    locations_status: OperationStatus,
    results_status: OperationStatus,
    match_status: OperationStatus,
    failures: Vec<Failure>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            criteria: SearchCriteria::default(),
            results: None,
            displayed: None,
            favorites: FavoriteSet::new(),
            breed_options: Vec::new(),
            location_options: Vec::new(),
            matched: None,
            search_seq: 0,
            settled_search_seq: 0,
            hydrate_seq: 0,
            match_seq: 0,
            breeds_status: OperationStatus::Idle,
            locations_status: OperationStatus::Idle,
            results_status: OperationStatus::Idle,
            match_status: OperationStatus::Idle,
            failures: Vec::new(),
        }
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    /// Ids of the latest applied search, in display order.
    pub fn result_ids(&self) -> &[DogId] {
        self.results.as_ref().map(|r| r.page.result_ids.as_slice()).unwrap_or(&[])
    }

    pub fn displayed(&self) -> Option<&DisplayedPage> {
        self.displayed.as_ref()
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn matched(&self) -> Option<&Dog> {
        self.matched.as_ref()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn failed_operations(&self) -> Vec<Operation> {
        self.failures.iter().map(|f| f.operation).collect()
    }

    // ---- criteria transitions ----

    /// Swap in `next`; a real change issues a search ticket.
    fn change_criteria(&mut self, next: SearchCriteria) -> Option<SearchTicket> {
        if next == self.criteria {
            return None;
        }
        self.criteria = next;
        Some(self.begin_search())
    }

    pub fn filter_breed(&mut self, breed: Option<String>) -> Option<SearchTicket> {
        let next = self.criteria.with_breed(breed);
        self.change_criteria(next)
    }

    pub fn filter_location(&mut self, zip_code: Option<String>) -> Option<SearchTicket> {
        let next = self.criteria.with_zip_code(zip_code);
        self.change_criteria(next)
    }

    pub fn sort(&mut self, direction: SortDirection) -> Option<SearchTicket> {
        let next = self.criteria.with_sort(direction);
        self.change_criteria(next)
    }

    pub fn page(&mut self, page: u32) -> Result<Option<SearchTicket>, ModelError> {
        let next = self.criteria.with_page(page)?;
        Ok(self.change_criteria(next))
    }

    // ---- search ----

    /// Issue a search for the current criteria, superseding any outstanding one.
    pub fn begin_search(&mut self) -> SearchTicket {
        self.search_seq += 1;
        self.results_status = OperationStatus::Loading;
        SearchTicket { seq: self.search_seq, criteria: self.criteria.clone() }
    }

    pub fn is_current_search(&self, ticket: &SearchTicket) -> bool {
        ticket.seq == self.search_seq
    }

    pub fn finish_search(&mut self, ticket: &SearchTicket, result: Result<ResultPage, ApiError>) -> SearchOutcome {
        if !self.is_current_search(ticket) {
            return SearchOutcome::Stale;
        }
        self.settled_search_seq = ticket.seq;
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.fail(Operation::Search, &e);
                return SearchOutcome::Failed;
            }
        };
        self.clear_failure(Operation::Search);

        // Any hydrate still outstanding, or failed, belongs to the previous id list.
        self.hydrate_seq += 1;
        self.clear_failure(Operation::Hydrate);
        let ids = page.result_ids.clone();
        self.results = Some(ResultSet { criteria: ticket.criteria.clone(), page });

        if ids.is_empty() {
            self.display(Vec::new());
            self.results_status = OperationStatus::Ready;
            return SearchOutcome::Empty;
        }
        SearchOutcome::Hydrate(HydrateTicket { seq: self.hydrate_seq, ids })
    }

    // ---- hydrate ----

    /// Re-issue hydration for the current id list, e.g. after a failed hydrate.
    pub fn begin_hydrate(&mut self) -> Option<HydrateTicket> {
        let ids = self.result_ids().to_vec();
        if ids.is_empty() {
            return None;
        }
        self.hydrate_seq += 1;
        self.results_status = OperationStatus::Loading;
        Some(HydrateTicket { seq: self.hydrate_seq, ids })
    }

    pub fn is_current_hydrate(&self, ticket: &HydrateTicket) -> bool {
        ticket.seq == self.hydrate_seq && ticket.ids.as_slice() == self.result_ids()
    }

    pub fn finish_hydrate(&mut self, ticket: &HydrateTicket, result: Result<Vec<Dog>, ApiError>) -> Applied {
        if !self.is_current_hydrate(ticket) {
            return Applied::Stale;
        }
        // A newer search may still be in flight; only it may settle the status.
        let settles = self.settled_search_seq == self.search_seq;
        match result {
            Ok(records) => {
                let batch = order_by_ids(&ticket.ids, records);
                if !batch.missing.is_empty() {
                    tracing::warn!(missing = batch.missing.len(), "hydrate_missing_records");
                }
                if batch.unexpected > 0 {
                    tracing::warn!(unexpected = batch.unexpected, "hydrate_unexpected_records");
                }
                self.clear_failure(Operation::Hydrate);
                self.display(batch.dogs);
                if settles {
                    self.results_status = OperationStatus::Ready;
                }
            }
            Err(e) if settles => self.fail(Operation::Hydrate, &e),
            // The search in flight replaces this id list, so its status stays Loading.
            Err(e) => self.record_failure(Operation::Hydrate, &e),
        }
        Applied::Current
    }

    fn display(&mut self, dogs: Vec<Dog>) {
        if let Some(results) = &self.results {
            self.displayed = Some(DisplayedPage {
                criteria: results.criteria.clone(),
                result_ids: results.page.result_ids.clone(),
                total: results.page.total,
                next: results.page.next.clone(),
                prev: results.page.prev.clone(),
                dogs,
            });
        }
    }

    // ---- options ----

    pub fn begin_breeds(&mut self) {
        self.breeds_status = OperationStatus::Loading;
    }

    pub fn finish_breeds(&mut self, result: Result<Vec<String>, ApiError>) {
        match result {
            Ok(breeds) => {
                let mut options: Vec<String> = Vec::with_capacity(breeds.len());
                for breed in breeds {
                    if !options.contains(&breed) {
                        options.push(breed);
                    }
                }
                self.breed_options = options;
                self.breeds_status = OperationStatus::Ready;
                self.clear_failure(Operation::Breeds);
            }
            Err(e) => self.fail(Operation::Breeds, &e),
        }
    }

    pub fn begin_locations(&mut self) {
        self.locations_status = OperationStatus::Loading;
    }

    pub fn finish_locations(&mut self, result: Result<Vec<Location>, ApiError>) {
        match result {
            Ok(locations) => {
                self.location_options = locations;
                self.locations_status = OperationStatus::Ready;
                self.clear_failure(Operation::Locations);
            }
            Err(e) => self.fail(Operation::Locations, &e),
        }
    }

    // ---- favorites ----

    /// Find a dog the user can see: the displayed page or the current match.
    pub fn visible_dog(&self, id: &DogId) -> Option<&Dog> {
        self.displayed
            .as_ref()
            .and_then(|p| p.dogs.iter().find(|d| &d.id == id))
            .or_else(|| self.matched.as_ref().filter(|d| &d.id == id))
    }

    pub fn add_favorite(&mut self, dog: Dog) -> bool {
        self.favorites.add(dog)
    }

    /// Removing the last favorite clears the match and voids any match in flight.
    pub fn remove_favorite(&mut self, id: &DogId) -> bool {
        let removed = self.favorites.remove(id);
        if removed && self.favorites.is_empty() {
            self.matched = None;
            self.match_seq += 1;
            self.match_status = OperationStatus::Idle;
            self.clear_failure(Operation::Match);
        }
        removed
    }

    // ---- match ----

    pub fn match_enabled(&self) -> bool {
        !self.favorites.is_empty()
    }

    /// `None` while the favorites set is empty.
    pub fn begin_match(&mut self) -> Option<MatchTicket> {
        if !self.match_enabled() {
            return None;
        }
        self.match_seq += 1;
        self.match_status = OperationStatus::Loading;
        Some(MatchTicket { seq: self.match_seq, favorites: self.favorites.ids() })
    }

    pub fn finish_match(&mut self, ticket: &MatchTicket, result: Result<Dog, ApiError>) -> Applied {
        if ticket.seq != self.match_seq || self.favorites.is_empty() {
            return Applied::Stale;
        }
        match result {
            Ok(dog) => {
                self.matched = Some(dog);
                self.match_status = OperationStatus::Ready;
                self.clear_failure(Operation::Match);
            }
            Err(e) => self.fail(Operation::Match, &e),
        }
        Applied::Current
    }

    // ---- failures ----

    fn status_slot(&mut self, operation: Operation) -> &mut OperationStatus {
        match operation {
            Operation::Breeds => &mut self.breeds_status,
            Operation::Locations => &mut self.locations_status,
            Operation::Search | Operation::Hydrate => &mut self.results_status,
            Operation::Match => &mut self.match_status,
        }
    }

    fn fail(&mut self, operation: Operation, error: &ApiError) {
        *self.status_slot(operation) = OperationStatus::Failed(error.kind());
        self.record_failure(operation, error);
    }

    fn record_failure(&mut self, operation: Operation, error: &ApiError) {
        self.failures.retain(|f| f.operation != operation);
        self.failures.push(Failure { operation, kind: error.kind(), message: error.to_string() });
    }

    fn clear_failure(&mut self, operation: Operation) {
        self.failures.retain(|f| f.operation != operation);
    }

    // ---- presentation ----

    pub fn view(&self) -> SearchView {
        let (dogs, current_page, total, next_cursor, prev_cursor) = match &self.displayed {
            Some(p) => (p.dogs.clone(), p.criteria.page, p.total, p.next.clone(), p.prev.clone()),
            None => (Vec::new(), self.criteria.page, 0, None, None),
        };
        let results = match self.results_status {
            OperationStatus::Idle => ResultsState::Idle,
            OperationStatus::Loading => ResultsState::Loading,
            OperationStatus::Failed(kind) => ResultsState::Failed(kind),
            OperationStatus::Ready if dogs.is_empty() => ResultsState::NoResults,
            OperationStatus::Ready => ResultsState::Showing,
        };
        SearchView {
            criteria: self.criteria.clone(),
            breed_options: self.breed_options.clone(),
            location_options: self.location_options.clone(),
            dogs,
            current_page,
            total,
            total_pages: Pagination::new(current_page).total_pages(total),
            next_cursor,
            prev_cursor,
            favorites: self.favorites.dogs().to_vec(),
            matched: self.matched.clone(),
            match_enabled: self.match_enabled(),
            results,
            breeds_status: self.breeds_status,
            locations_status: self.locations_status,
            match_status: self.match_status,
            failures: self.failures.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::litter;

    fn page_of(dogs: &[Dog], total: u64) -> ResultPage {
        ResultPage { result_ids: dogs.iter().map(|d| d.id.clone()).collect(), total, next: None, prev: None }
    }

    fn settled_with(state: &mut SearchState, dogs: &[Dog]) {
        let ticket = state.begin_search();
        let SearchOutcome::Hydrate(h) = state.finish_search(&ticket, Ok(page_of(dogs, dogs.len() as u64))) else {
            panic!("expected hydrate");
        };
        assert_eq!(state.finish_hydrate(&h, Ok(dogs.to_vec())), Applied::Current);
    }

    #[test]
    fn breed_change_resets_page_and_issues_search() {
        let mut state = SearchState::new();
        state.page(3).unwrap();
        let ticket = state.filter_breed(Some("Poodle".into())).unwrap();
        assert_eq!(ticket.criteria.page, 1);
        assert_eq!(ticket.criteria.breed.as_deref(), Some("Poodle"));
    }

    #[test]
    fn unchanged_criteria_issue_nothing() {
        let mut state = SearchState::new();
        assert!(state.filter_breed(None).is_none());
        assert!(state.page(1).unwrap().is_none());
        assert!(state.sort(SortDirection::Asc).is_some());
        assert!(state.sort(SortDirection::Asc).is_none());
    }

    #[test]
    fn only_latest_search_applies() {
        let mut state = SearchState::new();
        let pugs = litter("pug", "Pug", "1", 3);
        let poodles = litter("poo", "Poodle", "1", 2);
        let first = state.filter_breed(Some("Pug".into())).unwrap();
        let second = state.filter_breed(Some("Poodle".into())).unwrap();

        let later = state.finish_search(&second, Ok(page_of(&poodles, 2)));
        assert!(matches!(later, SearchOutcome::Hydrate(_)));
        assert_eq!(state.finish_search(&first, Ok(page_of(&pugs, 3))), SearchOutcome::Stale);
        assert_eq!(state.result_ids(), page_of(&poodles, 2).result_ids.as_slice());
    }

    #[test]
    fn stale_failure_does_not_mark_results_failed() {
        let mut state = SearchState::new();
        let first = state.begin_search();
        let _second = state.begin_search();
        assert_eq!(state.finish_search(&first, Err(ApiError::Transport("x".into()))), SearchOutcome::Stale);
        assert!(state.failures().is_empty());
        assert_eq!(state.view().results, ResultsState::Loading);
    }

    #[test]
    fn hydrate_reorders_by_result_ids() {
        let mut state = SearchState::new();
        let dogs = litter("d", "Pug", "1", 4);
        let ticket = state.begin_search();
        let SearchOutcome::Hydrate(h) = state.finish_search(&ticket, Ok(page_of(&dogs, 4))) else {
            panic!("expected hydrate");
        };
        let mut shuffled = dogs.clone();
        shuffled.swap(0, 3);
        shuffled.swap(1, 2);
        state.finish_hydrate(&h, Ok(shuffled));
        assert_eq!(state.view().dogs, dogs);
        assert_eq!(state.view().results, ResultsState::Showing);
    }

    #[test]
    fn hydrate_for_superseded_ids_is_dropped() {
        let mut state = SearchState::new();
        let old = litter("old", "Pug", "1", 2);
        let new = litter("new", "Pug", "1", 2);
        let t1 = state.begin_search();
        let SearchOutcome::Hydrate(h1) = state.finish_search(&t1, Ok(page_of(&old, 2))) else { panic!() };
        let t2 = state.begin_search();
        let SearchOutcome::Hydrate(h2) = state.finish_search(&t2, Ok(page_of(&new, 2))) else { panic!() };

        assert_eq!(state.finish_hydrate(&h1, Ok(old.clone())), Applied::Stale);
        assert_eq!(state.finish_hydrate(&h2, Ok(new.clone())), Applied::Current);
        assert_eq!(state.view().dogs, new);
    }

    #[test]
    fn empty_result_clears_display_and_reports_no_results() {
        let mut state = SearchState::new();
        settled_with(&mut state, &litter("d", "Pug", "1", 2));
        let ticket = state.filter_breed(Some("Akita".into())).unwrap();
        assert_eq!(state.finish_search(&ticket, Ok(ResultPage::default())), SearchOutcome::Empty);
        let view = state.view();
        assert!(view.dogs.is_empty());
        assert_eq!(view.results, ResultsState::NoResults);
        assert_eq!(view.total, 0);
    }

    #[test]
    fn empty_search_after_failed_hydrate_leaves_nothing_to_retry() {
        let mut state = SearchState::new();
        let dogs = litter("poo", "Poodle", "1", 3);
        let ticket = state.begin_search();
        let SearchOutcome::Hydrate(h) = state.finish_search(&ticket, Ok(page_of(&dogs, 3))) else { panic!() };
        state.finish_hydrate(&h, Err(ApiError::Transport("down".into())));
        assert!(state.view().can_retry());

        let ticket = state.filter_breed(Some("Akita".into())).unwrap();
        assert_eq!(state.finish_search(&ticket, Ok(ResultPage::default())), SearchOutcome::Empty);

        let view = state.view();
        assert_eq!(view.results, ResultsState::NoResults);
        assert!(!view.can_retry());
        assert!(state.failed_operations().is_empty());
    }

    #[test]
    fn hydrate_failure_during_newer_search_keeps_loading() {
        let mut state = SearchState::new();
        let dogs = litter("d", "Pug", "1", 2);
        let ticket = state.begin_search();
        let SearchOutcome::Hydrate(h) = state.finish_search(&ticket, Ok(page_of(&dogs, 2))) else { panic!() };
        let newer = state.filter_breed(Some("Akita".into())).unwrap();

        assert_eq!(state.finish_hydrate(&h, Err(ApiError::Transport("down".into()))), Applied::Current);
        assert_eq!(state.view().results, ResultsState::Loading);

        state.finish_search(&newer, Ok(ResultPage::default()));
        let view = state.view();
        assert_eq!(view.results, ResultsState::NoResults);
        assert!(view.failures.is_empty());
    }

    #[test]
    fn failed_search_keeps_prior_page_and_is_distinguishable() {
        let mut state = SearchState::new();
        let dogs = litter("d", "Pug", "1", 2);
        settled_with(&mut state, &dogs);
        let ticket = state.page(2).unwrap().unwrap();
        assert_eq!(state.finish_search(&ticket, Err(ApiError::rejected(500, "dogs/search"))), SearchOutcome::Failed);

        let view = state.view();
        assert_eq!(view.dogs, dogs);
        assert_eq!(view.current_page, 1);
        assert_eq!(view.results, ResultsState::Failed(FailureKind::Rejected));
        assert_eq!(state.failed_operations(), vec![Operation::Search]);
    }

    #[test]
    fn displayed_page_number_follows_hydrated_snapshot() {
        let mut state = SearchState::new();
        settled_with(&mut state, &litter("d", "Pug", "1", 2));
        let ticket = state.page(2).unwrap().unwrap();
        let SearchOutcome::Hydrate(_) = state.finish_search(&ticket, Ok(page_of(&litter("e", "Pug", "1", 1), 11))) else {
            panic!()
        };
        // Ids for page 2 are known but not hydrated yet; page 1 stays on screen.
        assert_eq!(state.view().current_page, 1);
        assert_eq!(state.criteria().page, 2);
    }

    #[test]
    fn removing_last_favorite_clears_match() {
        let mut state = SearchState::new();
        let dogs = litter("d", "Pug", "1", 2);
        settled_with(&mut state, &dogs);
        state.add_favorite(dogs[0].clone());
        let ticket = state.begin_match().unwrap();
        state.finish_match(&ticket, Ok(dogs[1].clone()));
        assert!(state.matched().is_some());

        state.remove_favorite(&dogs[0].id);
        assert!(state.matched().is_none());
        assert!(!state.match_enabled());
        assert!(state.begin_match().is_none());
    }

    #[test]
    fn match_response_after_favorites_emptied_is_dropped() {
        let mut state = SearchState::new();
        let dogs = litter("d", "Pug", "1", 1);
        state.add_favorite(dogs[0].clone());
        let ticket = state.begin_match().unwrap();
        state.remove_favorite(&dogs[0].id);
        assert_eq!(state.finish_match(&ticket, Ok(dogs[0].clone())), Applied::Stale);
        assert!(state.matched().is_none());
    }

    #[test]
    fn breed_options_are_deduplicated_in_order() {
        let mut state = SearchState::new();
        state.finish_breeds(Ok(vec!["Pug".into(), "Akita".into(), "Pug".into()]));
        assert_eq!(state.view().breed_options, vec!["Pug".to_string(), "Akita".to_string()]);
    }

    #[test]
    fn option_failures_are_independent() {
        let mut state = SearchState::new();
        state.finish_breeds(Err(ApiError::Transport("down".into())));
        state.finish_locations(Ok(Vec::new()));
        let view = state.view();
        assert_eq!(view.breeds_status, OperationStatus::Failed(FailureKind::Transport));
        assert_eq!(view.locations_status, OperationStatus::Ready);
        assert_eq!(state.failed_operations(), vec![Operation::Breeds]);
    }
}
