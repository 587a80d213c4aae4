use crate::errors::Result;
use crate::models::scan::Scan;
use crate::picking::task::{CancellationToken, Outcome};

/// Anything that can hand out the scans of one raw data file, in
/// acquisition order.
///
/// Scans are fetched by position (`0..scan_count()`), and every scan is
/// requested twice by the picker: once while building the threshold table
/// and once while tracking. Implementations are free to cache or to decode
/// lazily.
pub trait ScanSource {
    /// Human readable name of the data file, used in logs and results.
    fn name(&self) -> &str;

    fn scan_count(&self) -> usize;

    fn get_scan(&self, position: usize) -> Result<Scan>;

    /// Smallest and largest m/z over all the scans of the file.
    ///
    /// Returns `None` when no scan has any data point.
    fn mz_range(&self) -> Result<Option<(f64, f64)>> {
        Ok(scan_mz_range(self, None)?.completed().flatten())
    }

    /// Same as [`ScanSource::mz_range`], but stops reading scans as soon as
    /// `cancel` is set.
    fn mz_range_until(&self, cancel: &CancellationToken) -> Result<Outcome<Option<(f64, f64)>>> {
        scan_mz_range(self, Some(cancel))
    }
}

fn scan_mz_range<S: ScanSource + ?Sized>(
    source: &S,
    cancel: Option<&CancellationToken>,
) -> Result<Outcome<Option<(f64, f64)>>> {
    let mut out: Option<(f64, f64)> = None;
    for position in 0..source.scan_count() {
        if cancel.is_some_and(|c| c.is_canceled()) {
            return Ok(Outcome::Canceled);
        }
        let scan = source.get_scan(position)?;
        if let Some((lo, hi)) = scan.mz_range() {
            out = Some(match out {
                Some((curr_lo, curr_hi)) => (curr_lo.min(lo), curr_hi.max(hi)),
                None => (lo, hi),
            });
        }
    }
    Ok(Outcome::Completed(out))
}

impl<T: ScanSource + ?Sized> ScanSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn scan_count(&self) -> usize {
        (**self).scan_count()
    }

    fn get_scan(&self, position: usize) -> Result<Scan> {
        (**self).get_scan(position)
    }

    fn mz_range(&self) -> Result<Option<(f64, f64)>> {
        (**self).mz_range()
    }

    fn mz_range_until(&self, cancel: &CancellationToken) -> Result<Outcome<Option<(f64, f64)>>> {
        (**self).mz_range_until(cancel)
    }
}
