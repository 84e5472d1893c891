//! Login screen and routing shell.

use std::sync::Arc;

use models::Credentials;
use tracing::{info, instrument, warn};

use crate::api::SessionApi;
use crate::errors::ApiError;

/// The two screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Search,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Search => "/search",
        }
    }
}

/// Submits credentials; the session cookie stays inside the API implementation.
pub struct SessionClient<A: SessionApi> {
    api: Arc<A>,
}

impl<A: SessionApi> SessionClient<A> {
    pub fn new(api: Arc<A>) -> Self { Self { api } }

    /// Validate, then post. Invalid credentials never reach the network.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        credentials.validate()?;
        self.api.login(&credentials.normalized()).await?;
        info!("session_established");
        Ok(())
    }
}

/// Login screen state.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    loading: bool,
    last_error: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self { Self::default() }

    pub fn is_loading(&self) -> bool { self.loading }

    pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

    /// Submit and return the route to show next. Failure keeps the form with loading cleared.
    pub async fn submit<A: SessionApi>(&mut self, client: &SessionClient<A>, credentials: &Credentials) -> Route {
        self.loading = true;
        self.last_error = None;
        match client.login(credentials).await {
            Ok(()) => Route::Search,
            Err(e) => {
                warn!(error = %e, "login_failed");
                self.loading = false;
                self.last_error = Some(e.to_string());
                Route::Login
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Endpoint, MockDogApi};

    #[test]
    fn routes_have_distinct_paths() {
        assert_eq!(Route::Login.path(), "/");
        assert_eq!(Route::Search.path(), "/search");
    }

    #[tokio::test]
    async fn successful_login_routes_to_search() {
        let api = Arc::new(MockDogApi::default());
        let client = SessionClient::new(api.clone());
        let mut form = LoginForm::new();

        let route = form.submit(&client, &Credentials::new(" Ada ", "ada@example.com")).await;

        assert_eq!(route, Route::Search);
        assert!(form.last_error().is_none());
        let calls = api.calls_to(Endpoint::Login);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], crate::api::mock::Call::Login(Credentials::new("Ada", "ada@example.com")));
    }

    #[tokio::test]
    async fn rejected_login_stays_on_form_with_loading_cleared() {
        let api = Arc::new(MockDogApi::default());
        api.fail_next(Endpoint::Login, ApiError::rejected(401, "auth/login"));
        let client = SessionClient::new(api.clone());
        let mut form = LoginForm::new();

        let route = form.submit(&client, &Credentials::new("Ada", "ada@example.com")).await;

        assert_eq!(route, Route::Login);
        assert!(!form.is_loading());
        assert!(form.last_error().unwrap().contains("401"));
    }

    #[tokio::test]
    async fn invalid_credentials_are_not_sent() {
        let api = Arc::new(MockDogApi::default());
        let client = SessionClient::new(api.clone());

        let err = client.login(&Credentials::new("Ada", "not-an-email")).await.unwrap_err();

        assert!(matches!(err, ApiError::Invalid(_)));
        assert_eq!(api.count(Endpoint::Login), 0);
    }
}
