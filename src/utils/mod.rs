pub mod binning;
pub mod display;
pub mod math;
pub mod sorting;
pub mod streaming_stats;
