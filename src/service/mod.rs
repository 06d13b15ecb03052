mod fetch;
mod geo_service;
mod refresh;
mod timezone;

pub use fetch::Fetcher;
pub use geo_service::GeoService;
pub use refresh::RefreshScheduler;
pub use timezone::TimezoneResolver;
