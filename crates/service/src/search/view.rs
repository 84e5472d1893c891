//! Boundary between the orchestrator and whatever renders it.

use models::{Dog, DogId, Location, SearchCriteria, SortDirection};

use crate::errors::FailureKind;

use super::state::{Failure, OperationStatus};

/// What the result area should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsState {
    Idle,
    Loading,
    /// The search succeeded and matched nothing.
    NoResults,
    Showing,
    /// The last search or hydrate failed; the previous page, if any, is still shown.
    Failed(FailureKind),
}

/// Snapshot handed to the presentation shell.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
    /// Current control values; may be ahead of the displayed page while a search is in flight.
    pub criteria: SearchCriteria,
    pub breed_options: Vec<String>,
    pub location_options: Vec<Location>,
    pub dogs: Vec<Dog>,
    pub current_page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    pub favorites: Vec<Dog>,
    pub matched: Option<Dog>,
    pub match_enabled: bool,
    pub results: ResultsState,
    pub breeds_status: OperationStatus,
    pub locations_status: OperationStatus,
    pub match_status: OperationStatus,
    pub failures: Vec<Failure>,
}

impl SearchView {
    pub fn is_favorite(&self, id: &DogId) -> bool {
        self.favorites.iter().any(|d| &d.id == id)
    }

    /// Something failed and a `Retry` intent would re-issue it.
    pub fn can_retry(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Everything the presentation shell can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    FilterBreedChanged(Option<String>),
    FilterLocationChanged(Option<String>),
    SortChanged(SortDirection),
    PageChanged(u32),
    DogFavorited(DogId),
    DogUnfavorited(DogId),
    MatchRequested,
    Retry,
}
