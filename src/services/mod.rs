mod http;
pub mod aggregator;
pub mod fetcher;
pub mod movers;
pub mod provider;
pub mod returns;
pub mod vci;
pub mod yahoo;

pub use aggregator::{rank_by_market_cap, sector_allocation, to_reporting_unit};
pub use fetcher::{fetch_portfolio, lookback_window};
pub use http::{HttpFetcher, RateLimiter};
pub use movers::top_movers;
pub use provider::{MarketDataProvider, ProviderError};
pub use returns::{daily_returns, ReturnRow, ReturnTable};
pub use vci::VciClient;
pub use yahoo::YahooClient;
