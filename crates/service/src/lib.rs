//! Client-side services for the dog adoption search API.
//! - `api` defines the remote seams and their reqwest and in-memory implementations.
//! - `search` owns the view state and orders the dependent remote calls.
//! - `session` and `matching` wrap the login and two-step match flows.

pub mod api;
pub mod errors;
pub mod favorites;
pub mod matching;
pub mod observability;
pub mod pagination;
pub mod retry;
pub mod search;
pub mod session;

pub use errors::{ApiError, FailureKind, IntentError};
