pub mod aggregator;
pub mod scan_source;
