use std::time::Instant;

use async_trait::async_trait;
use configs::{ApiConfig, AppConfig};
use models::{Credentials, Dog, DogId, Location, LocationQuery, LocationSearchResponse, MatchResponse, ResultPage, SearchCriteria};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::{CatalogApi, MatchApi, SessionApi};
use crate::errors::ApiError;
use crate::observability::{REQUESTS_TOTAL, REQUEST_DURATION, REQUEST_FAILURES_TOTAL};
use crate::retry::{retry_with_policy, RetryPolicy};

const LOGIN: &str = "auth/login";
const BREEDS: &str = "dogs/breeds";
const LOCATIONS: &str = "locations/search";
const SEARCH: &str = "dogs/search";
const DOGS: &str = "dogs";
const MATCH: &str = "dogs/match";

/// reqwest-backed implementation of every API seam.
///
/// The client keeps a cookie store, so the session cookie set by `auth/login` rides along
/// on every later request without application code touching it.
#[derive(Clone)]
pub struct HttpDogApi {
    client: Client,
    base: Url,
    retry: RetryPolicy,
}

impl HttpDogApi {
    pub fn new(cfg: &ApiConfig, retry: RetryPolicy) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(format!("build http client: {e}")))?;
        let base = Url::parse(&cfg.base_url)
            .map_err(|e| ApiError::Invalid(format!("api base url '{}': {e}", cfg.base_url)))?;
        debug!(base_url = %base, max_attempts = retry.max_attempts(), "dog_api_client_ready");
        Ok(Self { client, base, retry })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, ApiError> {
        Self::new(&cfg.api, RetryPolicy::from_config(&cfg.retry))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Invalid(format!("join '{path}' onto base url: {e}")))
    }

    /// Send with retries; any non-2xx status becomes [`ApiError::Rejected`].
    async fn execute<F>(&self, path: &'static str, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&Client, Url) -> RequestBuilder,
    {
        let url = self.url(path)?;
        let started = Instant::now();
        REQUESTS_TOTAL.inc();

        let result = retry_with_policy(&self.retry, || {
            let request = build(&self.client, url.clone());
            async move {
                let resp = request
                    .send()
                    .await
                    .map_err(|e| ApiError::Transport(format!("{path}: {e}")))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(ApiError::rejected(status.as_u16(), path));
                }
                Ok(resp)
            }
        })
        .await;

        let elapsed = started.elapsed();
        REQUEST_DURATION.observe(elapsed.as_secs_f64());
        match &result {
            Ok(resp) => debug!(%path, status = resp.status().as_u16(), elapsed_ms = elapsed.as_millis() as u64, "api_call"),
            Err(e) => {
                REQUEST_FAILURES_TOTAL.inc();
                warn!(%path, error = %e, elapsed_ms = elapsed.as_millis() as u64, "api_call_failed");
            }
        }
        result
    }

    async fn decode<T: DeserializeOwned>(path: &'static str, resp: Response) -> Result<T, ApiError> {
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("{path}: read body: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl SessionApi for HttpDogApi {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        // Body is plain text; only the status and the cookie matter.
        self.execute(LOGIN, |c, url| c.post(url).json(credentials)).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for HttpDogApi {
    async fn breeds(&self) -> Result<Vec<String>, ApiError> {
        let resp = self.execute(BREEDS, |c, url| c.get(url)).await?;
        Self::decode(BREEDS, resp).await
    }

    async fn locations(&self) -> Result<Vec<Location>, ApiError> {
        let query = LocationQuery::default();
        let resp = self.execute(LOCATIONS, |c, url| c.post(url).json(&query)).await?;
        let body: LocationSearchResponse = Self::decode(LOCATIONS, resp).await?;
        Ok(body.results)
    }

    #[instrument(skip(self), fields(page = criteria.page))]
    async fn search(&self, criteria: &SearchCriteria) -> Result<ResultPage, ApiError> {
        let query = criteria.to_query();
        let resp = self.execute(SEARCH, |c, url| c.get(url).query(&query)).await?;
        Self::decode(SEARCH, resp).await
    }

    async fn fetch_dogs(&self, ids: &[DogId]) -> Result<Vec<Dog>, ApiError> {
        let resp = self.execute(DOGS, |c, url| c.post(url).json(ids)).await?;
        Self::decode(DOGS, resp).await
    }
}

#[async_trait]
impl MatchApi for HttpDogApi {
    async fn submit_match(&self, favorites: &[DogId]) -> Result<DogId, ApiError> {
        let resp = self.execute(MATCH, |c, url| c.post(url).json(favorites)).await?;
        let body: MatchResponse = Self::decode(MATCH, resp).await?;
        Ok(body.matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths_join_under_base() {
        let cfg = ApiConfig { base_url: "https://api.example.com/v1/".into(), ..ApiConfig::default() };
        let api = HttpDogApi::new(&cfg, RetryPolicy::disabled()).unwrap();
        assert_eq!(api.url(MATCH).unwrap().as_str(), "https://api.example.com/v1/dogs/match");
        assert_eq!(api.url(LOGIN).unwrap().as_str(), "https://api.example.com/v1/auth/login");
    }

    #[test]
    fn unparsable_base_url_is_invalid() {
        let cfg = ApiConfig { base_url: "not a url".into(), ..ApiConfig::default() };
        let err = HttpDogApi::new(&cfg, RetryPolicy::disabled()).err();
        assert!(matches!(err, Some(ApiError::Invalid(_))));
    }
}
