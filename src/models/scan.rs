use crate::errors::{DataReadingError, Result};
use crate::sort_vecs_by_first;
use serde::Serialize;

/// A single mass spectrum, as consumed by the peak picker.
///
/// The m/z array is sorted ascending and the intensity array is
/// index-aligned with it. Retention times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scan {
    pub index: usize,
    pub retention_time: f32,
    mz: Vec<f64>,
    intensity: Vec<f64>,
}

impl Scan {
    /// Builds a scan, checking that the arrays are consistent.
    ///
    /// Mismatched lengths, unsorted m/z values or non finite / negative
    /// values are reported as a malformed scan.
    pub fn new(
        index: usize,
        retention_time: f32,
        mz: Vec<f64>,
        intensity: Vec<f64>,
    ) -> Result<Self> {
        if mz.len() != intensity.len() {
            return Err(DataReadingError::malformed(
                index,
                format!(
                    "{} m/z values but {} intensity values",
                    mz.len(),
                    intensity.len()
                ),
            )
            .into());
        }
        if !retention_time.is_finite() {
            return Err(DataReadingError::malformed(index, "retention time is not finite").into());
        }
        if let Some(bad) = mz.iter().position(|x| !x.is_finite()) {
            return Err(DataReadingError::malformed(
                index,
                format!("m/z value at position {} is not finite", bad),
            )
            .into());
        }
        if let Some(bad) = intensity.iter().position(|x| !x.is_finite() || *x < 0.0) {
            return Err(DataReadingError::malformed(
                index,
                format!(
                    "intensity at position {} is not a finite positive number ({})",
                    bad, intensity[bad]
                ),
            )
            .into());
        }
        if !mz.windows(2).all(|x| x[0] <= x[1]) {
            return Err(DataReadingError::malformed(index, "m/z values are not sorted").into());
        }

        Ok(Self {
            index,
            retention_time,
            mz,
            intensity,
        })
    }

    /// Same as [`Scan::new`] but sorts the (m/z, intensity) pairs first.
    pub fn from_unsorted(
        index: usize,
        retention_time: f32,
        mz: Vec<f64>,
        intensity: Vec<f64>,
    ) -> Result<Self> {
        if mz.len() != intensity.len() {
            // Let `new` build the error message.
            return Self::new(index, retention_time, mz, intensity);
        }
        let (mz, intensity) = sort_vecs_by_first!(&mz, &intensity);
        Self::new(index, retention_time, mz, intensity)
    }

    pub fn mz(&self) -> &[f64] {
        &self.mz
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mz.iter().copied().zip(self.intensity.iter().copied())
    }

    /// First and last m/z of the scan, `None` for an empty scan.
    pub fn mz_range(&self) -> Option<(f64, f64)> {
        match (self.mz.first(), self.mz.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        }
    }
}
