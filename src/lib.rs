pub mod cache;
pub mod config;
pub mod constants;
pub mod errors; // Structured error handling
pub mod logger;
pub mod monitor;
pub mod portfolio;
pub mod pricing;
pub mod reports;
pub mod retry;
pub mod utils;
pub mod wallet; // Balance acquisition and merging
