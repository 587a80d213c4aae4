pub mod chromatogram;
pub mod finalized_peak;
pub mod one_dim_peak;
pub mod parameters;
pub mod scan;
pub mod sources;
