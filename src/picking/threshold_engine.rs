use serde::Serialize;
use std::fmt::Display;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::errors::{PeakPickerError, Result};
use crate::models::parameters::PeakPickerParameters;
use crate::picking::task::{Outcome, TaskProgress};
use crate::traits::scan_source::ScanSource;
use crate::utils::binning::bin_max_intensities;
use crate::utils::display::glimpse_vec;
use crate::utils::math::calc_quantile_in_place;

/// Per m/z bin intensity threshold of one data file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdTable {
    pub min_mz: f64,
    pub max_mz: f64,
    pub bin_size: f64,
    thresholds: Vec<f64>,
    /// Smallest threshold over all the bins.
    pub initial_threshold: f64,
}

impl ThresholdTable {
    pub fn new(min_mz: f64, max_mz: f64, bin_size: f64, thresholds: Vec<f64>) -> Self {
        let initial_threshold = thresholds.iter().copied().fold(f64::INFINITY, f64::min);
        let initial_threshold = if initial_threshold.is_finite() {
            initial_threshold
        } else {
            0.0
        };
        Self {
            min_mz,
            max_mz,
            bin_size,
            thresholds,
            initial_threshold,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.thresholds.len()
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Bin of an m/z value, clamped to the table.
    pub fn bin_index(&self, mz: f64) -> usize {
        let last = self.thresholds.len().saturating_sub(1);
        let pos = ((mz - self.min_mz) / self.bin_size).floor();
        // NaN and negative positions go to the first bin
        if !(pos > 0.0) {
            return 0;
        }
        (pos as usize).min(last)
    }

    pub fn threshold(&self, mz: f64) -> f64 {
        self.thresholds
            .get(self.bin_index(mz))
            .copied()
            .unwrap_or(self.initial_threshold)
    }
}

impl Display for ThresholdTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ThresholdTable {{ mz: [{:.4}, {:.4}], bin_size: {}, initial_threshold: {:.2}, thresholds: {} }}",
            self.min_mz,
            self.max_mz,
            self.bin_size,
            self.initial_threshold,
            glimpse_vec(&self.thresholds, None),
        )
    }
}

/// Builds the chromatographic threshold of every m/z bin as a quantile of
/// the binned intensities over all the scans of a file.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdEngine {
    bin_size: f64,
    threshold_level: f64,
}

impl ThresholdEngine {
    pub fn new(parameters: &PeakPickerParameters) -> Self {
        Self {
            bin_size: parameters.bin_size,
            threshold_level: parameters.chromatographic_threshold_level,
        }
    }

    pub fn num_bins(&self, min_mz: f64, max_mz: f64) -> usize {
        let num_bins = ((max_mz - min_mz) / self.bin_size).ceil();
        if num_bins.is_finite() && num_bins >= 1.0 {
            num_bins as usize
        } else {
            1
        }
    }

    /// Returns `None` when the source has no data points at all.
    pub fn compute<S: ScanSource + ?Sized>(&self, source: &S) -> Result<Option<ThresholdTable>> {
        match self.compute_inner(source, None)? {
            Outcome::Completed(x) => Ok(x),
            // Nothing can cancel without a progress handle.
            Outcome::Canceled => Ok(None),
        }
    }

    pub fn compute_with_progress<S: ScanSource + ?Sized>(
        &self,
        source: &S,
        progress: &TaskProgress,
    ) -> Result<Outcome<Option<ThresholdTable>>> {
        self.compute_inner(source, Some(progress))
    }

    #[instrument(skip_all, level = "debug")]
    fn compute_inner<S: ScanSource + ?Sized>(
        &self,
        source: &S,
        progress: Option<&TaskProgress>,
    ) -> Result<Outcome<Option<ThresholdTable>>> {
        let st = Instant::now();
        let mz_range = match progress {
            Some(p) => match source.mz_range_until(p.cancellation_token())? {
                Outcome::Completed(x) => x,
                Outcome::Canceled => return Ok(Outcome::Canceled),
            },
            None => source.mz_range()?,
        };
        let Some((min_mz, max_mz)) = mz_range else {
            warn!("No data points in {}, no thresholds to compute", source.name());
            return Ok(Outcome::Completed(None));
        };

        let total_scans = source.scan_count();
        let num_bins = self.num_bins(min_mz, max_mz);
        debug!(
            "Binning {} scans into {} bins over [{}, {}]",
            total_scans, num_bins, min_mz, max_mz
        );

        // Bin major, every bin holds one value per scan.
        let matrix_len = num_bins.checked_mul(total_scans).ok_or_else(|| {
            PeakPickerError::invalid_parameters(format!(
                "bin size {} gives {} bins, too many for {} scans",
                self.bin_size, num_bins, total_scans
            ))
        })?;
        let mut matrix: Vec<f64> = Vec::new();
        matrix.try_reserve_exact(matrix_len).map_err(|e| {
            PeakPickerError::invalid_parameters(format!(
                "bin size {} gives {} bins, cannot allocate the threshold matrix: {}",
                self.bin_size, num_bins, e
            ))
        })?;
        matrix.resize(matrix_len, 0.0);
        for position in 0..total_scans {
            if progress.is_some_and(|p| p.is_canceled()) {
                return Ok(Outcome::Canceled);
            }

            let scan = source.get_scan(position)?;
            let binned =
                bin_max_intensities(scan.mz(), scan.intensity(), min_mz, max_mz, num_bins, true);
            for (bin, value) in binned.into_iter().enumerate() {
                matrix[bin * total_scans + position] = value;
            }

            if let Some(p) = progress {
                p.scans_processed(1);
            }
        }

        let thresholds: Vec<f64> = if total_scans == 0 {
            vec![0.0; num_bins]
        } else {
            matrix
                .chunks_mut(total_scans)
                .map(|bin_values| calc_quantile_in_place(bin_values, self.threshold_level))
                .collect()
        };
        drop(matrix);

        let table = ThresholdTable::new(min_mz, max_mz, self.bin_size, thresholds);
        info!(
            "Computed {} chromatographic thresholds in {:#?}, initial threshold {:.2}",
            table.num_bins(),
            st.elapsed(),
            table.initial_threshold
        );
        Ok(Outcome::Completed(Some(table)))
    }
}
