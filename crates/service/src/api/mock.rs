//! In-memory API for tests and offline demos.
//!
//! Serves a fixed catalog, records every call, and can fail or hold individual calls so
//! tests can force responses to arrive out of order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use models::{Credentials, Dog, DogId, Location, ResultPage, SearchCriteria, SortDirection, PAGE_SIZE};
use tokio::sync::{oneshot, Notify};

use super::{CatalogApi, MatchApi, SessionApi};
use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Breeds,
    Locations,
    Search,
    Dogs,
    Match,
}

/// One recorded call with its request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login(Credentials),
    Breeds,
    Locations,
    Search(SearchCriteria),
    Dogs(Vec<DogId>),
    Match(Vec<DogId>),
}

impl Call {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Call::Login(_) => Endpoint::Login,
            Call::Breeds => Endpoint::Breeds,
            Call::Locations => Endpoint::Locations,
            Call::Search(_) => Endpoint::Search,
            Call::Dogs(_) => Endpoint::Dogs,
            Call::Match(_) => Endpoint::Match,
        }
    }
}

/// Holds the next call to an endpoint until released. Dropping the gate releases it too.
pub struct Gate {
    tx: Option<oneshot::Sender<()>>,
}

impl Gate {
    pub fn release(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Default)]
struct MockState {
    dogs: Vec<Dog>,
    locations: Vec<Location>,
    calls: Vec<Call>,
    failures: VecDeque<(Endpoint, ApiError)>,
    gates: HashMap<Endpoint, VecDeque<oneshot::Receiver<()>>>,
    match_pick: Option<DogId>,
    logged_in: bool,
    require_login: bool,
    ordered_batches: bool,
}

#[derive(Default)]
pub struct MockDogApi {
    state: Mutex<MockState>,
    changed: Notify,
}

impl MockDogApi {
    pub fn new(dogs: Vec<Dog>) -> Self {
        let api = Self::default();
        api.lock().dogs = dogs;
        api
    }

    pub fn with_locations(self, locations: Vec<Location>) -> Self {
        self.lock().locations = locations;
        self
    }

    /// Reject catalog calls with 401 until `login` succeeds.
    pub fn requiring_login(self) -> Self {
        self.lock().require_login = true;
        self
    }

    /// Return record batches in request order instead of reversed.
    pub fn with_ordered_batches(self) -> Self {
        self.lock().ordered_batches = true;
        self
    }

    /// Id returned by the next `submit_match` calls; defaults to the first submitted id.
    pub fn set_match(&self, id: impl Into<DogId>) {
        self.lock().match_pick = Some(id.into());
    }

    /// Fail the next call to `endpoint` with `error`.
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.lock().failures.push_back((endpoint, error));
    }

    /// Hold the next call to `endpoint` (after it is recorded) until the gate is released.
    pub fn gate(&self, endpoint: Endpoint) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.lock().gates.entry(endpoint).or_default().push_back(rx);
        Gate { tx: Some(tx) }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.lock().calls.iter().filter(|c| c.endpoint() == endpoint).cloned().collect()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.iter().filter(|c| c.endpoint() == endpoint).count()
    }

    /// Resolve once at least `n` calls to `endpoint` have been recorded.
    pub async fn wait_for_calls(&self, endpoint: Endpoint, n: usize) {
        loop {
            let notified = self.changed.notified();
            if self.count(endpoint) >= n {
                return;
            }
            notified.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call, then apply scripted gate and failure.
    async fn enter(&self, call: Call) -> Result<(), ApiError> {
        let endpoint = call.endpoint();
        let (gate, failure, unauthorized) = {
            let mut state = self.lock();
            state.calls.push(call);
            let gate = state.gates.get_mut(&endpoint).and_then(VecDeque::pop_front);
            let failure = state
                .failures
                .iter()
                .position(|(e, _)| *e == endpoint)
                .and_then(|i| state.failures.remove(i))
                .map(|(_, err)| err);
            let unauthorized = state.require_login && !state.logged_in && endpoint != Endpoint::Login;
            (gate, failure, unauthorized)
        };
        self.changed.notify_waiters();

        if let Some(rx) = gate {
            let _ = rx.await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        if unauthorized {
            return Err(ApiError::rejected(401, path_of(endpoint)));
        }
        Ok(())
    }
}

fn path_of(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Login => "auth/login",
        Endpoint::Breeds => "dogs/breeds",
        Endpoint::Locations => "locations/search",
        Endpoint::Search => "dogs/search",
        Endpoint::Dogs => "dogs",
        Endpoint::Match => "dogs/match",
    }
}

#[async_trait]
impl SessionApi for MockDogApi {
    async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.enter(Call::Login(credentials.clone())).await?;
        credentials.validate().map_err(|_| ApiError::rejected(400, path_of(Endpoint::Login)))?;
        self.lock().logged_in = true;
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for MockDogApi {
    async fn breeds(&self) -> Result<Vec<String>, ApiError> {
        self.enter(Call::Breeds).await?;
        let mut breeds: Vec<String> = self.lock().dogs.iter().map(|d| d.breed.clone()).collect();
        breeds.sort();
        breeds.dedup();
        Ok(breeds)
    }

    async fn locations(&self) -> Result<Vec<Location>, ApiError> {
        self.enter(Call::Locations).await?;
        Ok(self.lock().locations.clone())
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<ResultPage, ApiError> {
        self.enter(Call::Search(criteria.clone())).await?;
        let state = self.lock();
        let mut hits: Vec<&Dog> = state
            .dogs
            .iter()
            .filter(|d| criteria.breed.as_deref().map_or(true, |b| d.breed == b))
            .filter(|d| criteria.zip_code.as_deref().map_or(true, |z| d.zip_code == z))
            .collect();
        match criteria.sort {
            Some(SortDirection::Asc) => hits.sort_by(|a, b| a.breed.cmp(&b.breed)),
            Some(SortDirection::Desc) => hits.sort_by(|a, b| b.breed.cmp(&a.breed)),
            None => {}
        }
        let total = hits.len() as u64;
        let from = usize::try_from(criteria.offset()).unwrap_or(usize::MAX);
        let result_ids: Vec<DogId> = hits
            .iter()
            .skip(from)
            .take(PAGE_SIZE as usize)
            .map(|d| d.id.clone())
            .collect();
        let next = (from.saturating_add(result_ids.len()) < hits.len())
            .then(|| format!("/dogs/search?size={PAGE_SIZE}&from={}", from.saturating_add(PAGE_SIZE as usize)));
        let prev = (from > 0)
            .then(|| format!("/dogs/search?size={PAGE_SIZE}&from={}", from.saturating_sub(PAGE_SIZE as usize)));
        Ok(ResultPage { result_ids, total, next, prev })
    }

    async fn fetch_dogs(&self, ids: &[DogId]) -> Result<Vec<Dog>, ApiError> {
        self.enter(Call::Dogs(ids.to_vec())).await?;
        let state = self.lock();
        let mut found: Vec<Dog> = ids
            .iter()
            .filter_map(|id| state.dogs.iter().find(|d| &d.id == id).cloned())
            .collect();
        if !state.ordered_batches {
            found.reverse();
        }
        Ok(found)
    }
}

#[async_trait]
impl MatchApi for MockDogApi {
    async fn submit_match(&self, favorites: &[DogId]) -> Result<DogId, ApiError> {
        self.enter(Call::Match(favorites.to_vec())).await?;
        let pick = self.lock().match_pick.clone();
        pick.or_else(|| favorites.first().cloned())
            .ok_or_else(|| ApiError::rejected(400, path_of(Endpoint::Match)))
    }
}

/// `count` dogs of `breed` with ids `<prefix>0..`, all in zip `zip`.
pub fn litter(prefix: &str, breed: &str, zip: &str, count: usize) -> Vec<Dog> {
    (0..count)
        .map(|i| Dog {
            id: DogId::new(format!("{prefix}{i}")),
            name: format!("{breed} #{i}"),
            breed: breed.to_string(),
            age: (i % 12) as u32,
            zip_code: zip.to_string(),
            img: format!("https://img.example/{prefix}{i}.jpg"),
        })
        .collect()
}
