use std::sync::Arc;

use models::{Dog, DogId};
use tracing::{debug, instrument};

use crate::api::{CatalogApi, MatchApi};
use crate::errors::ApiError;

/// Two-step match: submit favorite ids, then hydrate the single matched id.
pub struct MatchClient<A> {
    api: Arc<A>,
}

impl<A: CatalogApi + MatchApi> MatchClient<A> {
    pub fn new(api: Arc<A>) -> Self { Self { api } }

    #[instrument(skip(self, favorites), fields(favorites = favorites.len()))]
    pub async fn generate(&self, favorites: &[DogId]) -> Result<Dog, ApiError> {
        if favorites.is_empty() {
            return Err(ApiError::Invalid("match needs at least one favorite".into()));
        }
        let matched = self.api.submit_match(favorites).await?;
        debug!(%matched, "match_selected");

        // Step two depends on step one's id; never issued concurrently.
        let records = self.api.fetch_dogs(std::slice::from_ref(&matched)).await?;
        records
            .into_iter()
            .find(|d| d.id == matched)
            .ok_or_else(|| ApiError::Decode(format!("dogs: no record for matched id {matched}")))
    }
}
