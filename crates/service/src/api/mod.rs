//! Remote API seams.
//!
//! One trait per remote concern, mirroring the three clients the search view talks to.
//! [`http::HttpDogApi`] implements all of them over reqwest; [`mock::MockDogApi`] is an
//! in-memory implementation for tests and offline demos.

use async_trait::async_trait;
use models::{Credentials, Dog, DogId, Location, ResultPage, SearchCriteria};

use crate::errors::ApiError;

pub mod http;
pub mod mock;

/// `POST auth/login`. The session cookie is kept by the implementation, never returned.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<(), ApiError>;
}

/// Breeds, locations, id search and record hydration.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn breeds(&self) -> Result<Vec<String>, ApiError>;
    async fn locations(&self) -> Result<Vec<Location>, ApiError>;
    async fn search(&self, criteria: &SearchCriteria) -> Result<ResultPage, ApiError>;
    /// Records for `ids` in one request. Response order is unspecified.
    async fn fetch_dogs(&self, ids: &[DogId]) -> Result<Vec<Dog>, ApiError>;
}

/// `POST dogs/match`.
#[async_trait]
pub trait MatchApi: Send + Sync {
    async fn submit_match(&self, favorites: &[DogId]) -> Result<DogId, ApiError>;
}

/// Everything the search view needs.
pub trait DogApi: SessionApi + CatalogApi + MatchApi {}

impl<T: SessionApi + CatalogApi + MatchApi> DogApi for T {}
