//! Fetch pipeline services
//!
//! Remote clients and the total `DataFetcher`, cache policy, merger, the
//! fetch queue with its worker, and the orchestrator that feeds it.

pub mod badge_info_client;
pub mod badge_source;
pub mod cache_policy;
pub mod data_fetcher;
pub mod fetch_queue;
pub mod merger;
pub mod orchestrator;
pub mod steamsets_client;

pub use badge_info_client::BadgeInfoClient;
pub use badge_source::{BadgeSource, FetchError, HttpBadgeSource};
pub use cache_policy::CachePolicy;
pub use data_fetcher::{DataFetcher, Fetched};
pub use fetch_queue::{FetchDelays, FetchQueue};
pub use merger::combine;
pub use orchestrator::{DiscoveryReport, Orchestrator, Reconciliation};
pub use steamsets_client::SteamsetsClient;

const USER_AGENT: &str = concat!("SBE/", env!("CARGO_PKG_VERSION"));
