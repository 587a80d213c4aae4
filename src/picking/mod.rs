pub mod batch;
pub mod finalizer;
pub mod match_score;
pub mod one_dim_detector;
pub mod task;
pub mod threshold_engine;
pub mod tracker;
