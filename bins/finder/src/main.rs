use std::sync::Arc;

use anyhow::Context;
use common::utils::logging::{init_logging, LogFormat};
use configs::AppConfig;
use models::Credentials;
use service::api::http::HttpDogApi;
use service::search::SearchOrchestrator;
use service::session::{LoginForm, Route, SessionClient};
use tracing::info;

mod shell;

/// `finder <name> <email>`; falls back to FINDER_NAME / FINDER_EMAIL.
fn credentials_from_args() -> anyhow::Result<Credentials> {
    let mut args = std::env::args().skip(1);
    let name = match args.next() {
        Some(name) => name,
        None => common::env::require_var("FINDER_NAME").context("usage: finder <name> <email>")?,
    };
    let email = match args.next() {
        Some(email) => email,
        None => common::env::require_var("FINDER_EMAIL").context("usage: finder <name> <email>")?,
    };
    Ok(Credentials::new(name, email))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::env::load_dotenv();
    let cfg = AppConfig::load_and_validate()?;
    init_logging(LogFormat::from_name(&cfg.logging.format));

    let credentials = credentials_from_args()?;
    let api = Arc::new(HttpDogApi::from_config(&cfg)?);
    info!(base_url = %api.base_url(), "dog api configured");

    let mut form = LoginForm::new();
    let route = form.submit(&SessionClient::new(api.clone()), &credentials).await;
    if route != Route::Search {
        anyhow::bail!("login failed: {}", form.last_error().unwrap_or("unknown error"));
    }
    info!(route = route.path(), "navigating");

    let orch = SearchOrchestrator::new(api);
    orch.initialize().await;
    println!("{}", shell::render(&orch.view()));
    println!("{}", shell::HELP);

    shell::run(orch).await
}
