// Re-export main structures
pub use crate::errors::{DataReadingError, PeakPickerError, Result};
pub use crate::models::finalized_peak::{FinalizedPeak, PeakList};
pub use crate::models::parameters::PeakPickerParameters;
pub use crate::models::scan::Scan;
pub use crate::models::sources::in_memory::InMemoryScanSource;
pub use crate::models::sources::mzml::MzMLScanSource;
pub use crate::picking::task::{
    CancellationToken, Outcome, PeakPickingResult, PeakPickingTask, TaskOutcome, TaskStatus,
};

// Re-export traits
pub use crate::traits::aggregator::Aggregator;
pub use crate::traits::scan_source::ScanSource;

// Declare modules
pub mod errors;
pub mod models;
pub mod picking;
pub mod traits;
pub mod utils;
