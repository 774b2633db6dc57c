//! CoinGecko client module
//!
//! Provides `CoinGeckoClient` for fetching market snapshots from the
//! CoinGecko REST API, and the `MarketSource` seam the fetch step is
//! written against.

mod auth;
mod coingecko;

pub use auth::Auth;
pub use coingecko::{CoinGeckoClient, MarketSource, MarketsQuery};
