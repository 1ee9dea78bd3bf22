pub mod aggregator;
pub mod fetcher;
