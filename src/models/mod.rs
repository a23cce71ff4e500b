mod config;
mod portfolio;
mod price_series;

pub use config::{Holding, ProviderKind, ReportConfig};
pub use portfolio::{
    FetchField, FetchWarning, FetchedPortfolio, Mover, Movers, PortfolioEntry, RankedEntry,
    SectorAllocation, SectorRow,
};
pub use price_series::{PricePoint, PriceSeries, ReturnPoint, ReturnSeries};
