//! Shared process-level helpers for the finder binaries: logging setup and
//! environment loading.

pub mod env;
pub mod utils;
