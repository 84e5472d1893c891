//! Environment helpers
//!
//! Loads `.env` before configuration so `CONFIG_PATH`, `DOG_API_BASE_URL` and
//! `RUST_LOG` can be set per checkout.

use tracing::debug;

/// Load `.env` from the working directory or its parents; absence is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("ignoring malformed .env: {e}"),
    }
}

/// Read a required environment variable with a readable error.
pub fn require_var(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("environment variable {key} is not set"))
}
