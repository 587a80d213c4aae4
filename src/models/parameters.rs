use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{PeakPickerError, Result};

/// Settings of the centroid peak picker.
///
/// Retention time related values use the same unit as the scans
/// (seconds for the bundled scan sources).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakPickerParameters {
    /// Width of the m/z bins used for the chromatographic threshold (Da).
    pub bin_size: f64,
    /// Quantile (0-1) of the per bin intensities used as threshold.
    pub chromatographic_threshold_level: f64,
    /// Absolute intensity below which points are ignored.
    pub noise_level: f64,
    pub minimum_peak_height: f64,
    pub minimum_peak_duration: f64,
    /// Maximum m/z difference between consecutive points of a peak (Da).
    pub mz_tolerance: f64,
    /// Relative intensity change (0-1) tolerated before the shape of a
    /// peak is considered to change direction.
    pub int_tolerance: f64,
}

impl Default for PeakPickerParameters {
    fn default() -> Self {
        PeakPickerParameters {
            bin_size: 0.1,
            chromatographic_threshold_level: 0.0,
            noise_level: 10.0,
            minimum_peak_height: 100.0,
            minimum_peak_duration: 3.0,
            mz_tolerance: 0.05,
            int_tolerance: 0.2,
        }
    }
}

impl PeakPickerParameters {
    /// Checks the values make sense before anything is read.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("bin_size", self.bin_size),
            (
                "chromatographic_threshold_level",
                self.chromatographic_threshold_level,
            ),
            ("noise_level", self.noise_level),
            ("minimum_peak_height", self.minimum_peak_height),
            ("minimum_peak_duration", self.minimum_peak_duration),
            ("mz_tolerance", self.mz_tolerance),
            ("int_tolerance", self.int_tolerance),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(PeakPickerError::invalid_parameters(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(PeakPickerError::invalid_parameters(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        if self.bin_size <= 0.0 {
            return Err(PeakPickerError::invalid_parameters(format!(
                "Incorrect bin size: {}",
                self.bin_size
            )));
        }
        if self.chromatographic_threshold_level > 1.0 {
            return Err(PeakPickerError::invalid_parameters(format!(
                "Incorrect chromatographic threshold level: {} (expected 0-1)",
                self.chromatographic_threshold_level
            )));
        }
        Ok(())
    }

    /// Reads (possibly partial) parameters from JSON and validates them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let out: Self = serde_json::from_str(json)
            .map_err(|e| PeakPickerError::Serialization(e.to_string()))?;
        out.validate()?;
        Ok(out)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PeakPickerParameters::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let bad_bins = PeakPickerParameters {
            bin_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_bins.validate(),
            Err(PeakPickerError::InvalidParameters(_))
        ));

        let bad_quantile = PeakPickerParameters {
            chromatographic_threshold_level: 1.5,
            ..Default::default()
        };
        assert!(bad_quantile.validate().is_err());

        let bad_noise = PeakPickerParameters {
            noise_level: -1.0,
            ..Default::default()
        };
        assert!(bad_noise.validate().is_err());

        let nan_tol = PeakPickerParameters {
            mz_tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(nan_tol.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let params: PeakPickerParameters =
            serde_json::from_str(r#"{"noise_level": 4.0, "mz_tolerance": 0.01}"#).unwrap();
        assert_eq!(params.noise_level, 4.0);
        assert_eq!(params.mz_tolerance, 0.01);
        assert_eq!(params.bin_size, PeakPickerParameters::default().bin_size);

        let serialized = serde_json::to_string(&params).unwrap();
        let back: PeakPickerParameters = serde_json::from_str(&serialized).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn test_from_json_str() {
        let params = PeakPickerParameters::from_json_str(r#"{"bin_size": 0.5}"#).unwrap();
        assert_eq!(params.bin_size, 0.5);

        assert!(matches!(
            PeakPickerParameters::from_json_str("{not json"),
            Err(PeakPickerError::Serialization(_))
        ));
        assert!(matches!(
            PeakPickerParameters::from_json_str(r#"{"bin_size": -0.5}"#),
            Err(PeakPickerError::InvalidParameters(_))
        ));
    }
}
