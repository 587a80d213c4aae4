use crate::errors::{DataReadingError, Result};
use crate::models::scan::Scan;
use crate::picking::task::{CancellationToken, Outcome};
use crate::traits::scan_source::ScanSource;

/// Scans that are already in memory, in acquisition order.
#[derive(Debug, Clone)]
pub struct InMemoryScanSource {
    name: String,
    scans: Vec<Scan>,
}

impl InMemoryScanSource {
    pub fn new(name: impl Into<String>, scans: Vec<Scan>) -> Self {
        Self {
            name: name.into(),
            scans,
        }
    }

    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }
}

impl ScanSource for InMemoryScanSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan_count(&self) -> usize {
        self.scans.len()
    }

    fn get_scan(&self, position: usize) -> Result<Scan> {
        self.scans.get(position).cloned().ok_or_else(|| {
            DataReadingError::ScanIndexOutOfBounds {
                requested: position,
                available: self.scans.len(),
            }
            .into()
        })
    }

    fn mz_range(&self) -> Result<Option<(f64, f64)>> {
        Ok(self
            .scans
            .iter()
            .filter_map(|s| s.mz_range())
            .reduce(|(lo, hi), (x_lo, x_hi)| (lo.min(x_lo), hi.max(x_hi))))
    }

    // No scan is decoded, so there is nothing to cancel.
    fn mz_range_until(&self, _cancel: &CancellationToken) -> Result<Outcome<Option<(f64, f64)>>> {
        Ok(Outcome::Completed(self.mz_range()?))
    }
}
