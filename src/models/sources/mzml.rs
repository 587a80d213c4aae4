use mzdata::prelude::*;
use mzdata::spectrum::MultiLayerSpectrum;
use mzdata::MZReader;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::errors::{DataReadingError, Result};
use crate::models::scan::Scan;
use crate::traits::scan_source::ScanSource;

/// Spectra of one MS level read from an mzML file.
///
/// Spectra are kept as read and their binary arrays are only decoded
/// when a scan is requested. Retention times are converted to seconds.
pub struct MzMLScanSource {
    name: String,
    ms_level: u8,
    spectra: Vec<MultiLayerSpectrum>,
}

impl MzMLScanSource {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, ms_level: u8) -> Result<Self> {
        let st = Instant::now();
        let path = path.as_ref();
        let reader = MZReader::open_path(path).map_err(|e| DataReadingError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut num_read = 0;
        let spectra: Vec<MultiLayerSpectrum> = reader
            .inspect(|_| num_read += 1)
            .filter(|s| s.ms_level() == ms_level)
            .collect();

        let name = path
            .file_name()
            .map(|x| x.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if spectra.is_empty() {
            warn!(
                "No MS{} spectra in {} ({} spectra read)",
                ms_level, name, num_read
            );
        }
        info!(
            "Read {} MS{} spectra (of {}) from {} in {:#?}",
            spectra.len(),
            ms_level,
            num_read,
            name,
            st.elapsed()
        );

        Ok(Self {
            name,
            ms_level,
            spectra,
        })
    }

    pub fn ms_level(&self) -> u8 {
        self.ms_level
    }
}

fn spectrum_to_scan(spectrum: &MultiLayerSpectrum) -> Result<Scan> {
    let index = spectrum.index();
    let arrays = spectrum
        .raw_arrays()
        .ok_or_else(|| DataReadingError::malformed(index, "spectrum has no binary arrays"))?;

    let mzs = arrays
        .mzs()
        .map_err(|source| DataReadingError::ArrayRetrieval { index, source })?;
    let intensities = arrays
        .intensities()
        .map_err(|source| DataReadingError::ArrayRetrieval { index, source })?;

    arrays_to_scan(index, spectrum.start_time(), &mzs, &intensities)
}

/// Centroids are not guaranteed to be stored in m/z order, so the arrays
/// are sorted on the way in.
fn arrays_to_scan(
    index: usize,
    start_time_minutes: f64,
    mzs: &[f64],
    intensities: &[f32],
) -> Result<Scan> {
    let retention_time = (start_time_minutes * 60.0) as f32;
    Scan::from_unsorted(
        index,
        retention_time,
        mzs.to_vec(),
        intensities.iter().map(|x| *x as f64).collect(),
    )
}

impl ScanSource for MzMLScanSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan_count(&self) -> usize {
        self.spectra.len()
    }

    fn get_scan(&self, position: usize) -> Result<Scan> {
        let spectrum =
            self.spectra
                .get(position)
                .ok_or(DataReadingError::ScanIndexOutOfBounds {
                    requested: position,
                    available: self.spectra.len(),
                })?;
        spectrum_to_scan(spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PeakPickerError;

    #[test]
    fn test_missing_file_is_an_open_error() {
        let out = MzMLScanSource::open("/this/file/does/not/exist.mzML", 1);
        match out {
            Err(PeakPickerError::DataReading(DataReadingError::Open { path, .. })) => {
                assert!(path.ends_with("exist.mzML"))
            }
            Err(other) => panic!("Expected an open error, got {:?}", other),
            Ok(_) => panic!("Expected an open error"),
        }
    }

    #[test]
    fn test_unsorted_arrays_become_a_sorted_scan() {
        let scan = arrays_to_scan(7, 1.5, &[300.5, 100.25, 200.0], &[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(scan.index, 7);
        assert_eq!(scan.retention_time, 90.0);
        assert_eq!(scan.mz(), &[100.25, 200.0, 300.5]);
        assert_eq!(scan.intensity(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_mismatched_arrays_are_malformed() {
        assert!(arrays_to_scan(0, 0.0, &[100.0, 200.0], &[1.0]).is_err());
    }
}
