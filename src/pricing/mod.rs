//! Price lookup
//!
//! `PriceOracle` is the upstream seam (Jupiter in production, in-process tables
//! in tests); `PriceService` adds batching, retry and quote validation on top.

pub mod jupiter;
pub mod service;
pub mod types;

pub use jupiter::{JupiterPriceClient, PriceOracle};
pub use service::{validate_quote, PriceService};
pub use types::{ConfidenceLevel, PriceQuote, PriceSource, RawQuote};
