// Library entry shared by the CLI binary and the integration tests

#![allow(clippy::result_large_err)]

pub mod backends;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
pub mod workers;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use utils::{KioskError, Result};
