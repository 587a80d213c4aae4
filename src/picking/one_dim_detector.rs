use crate::models::one_dim_peak::OneDimPeak;
use crate::models::scan::Scan;
use crate::picking::threshold_engine::ThresholdTable;

/// Keeps the points of a scan that are above both the noise level and the
/// chromatographic threshold of their m/z bin.
#[derive(Debug, Clone, Copy)]
pub struct OneDimPeakDetector<'a> {
    table: &'a ThresholdTable,
    noise_level: f64,
}

impl<'a> OneDimPeakDetector<'a> {
    pub fn new(table: &'a ThresholdTable, noise_level: f64) -> Self {
        Self { table, noise_level }
    }

    pub fn is_peak(&self, mz: f64, intensity: f64) -> bool {
        intensity >= self.noise_level && intensity >= self.table.threshold(mz)
    }

    /// Peaks come out in scan order, none of them connected.
    pub fn detect(&self, scan: &Scan) -> Vec<OneDimPeak> {
        scan.iter()
            .enumerate()
            .filter(|(_, (mz, intensity))| self.is_peak(*mz, *intensity))
            .map(|(i, (mz, intensity))| OneDimPeak::new(scan.index, i, mz, intensity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_uses_noise_and_bin_threshold() {
        let table = ThresholdTable::new(100.0, 102.0, 1.0, vec![50.0, 5.0]);
        let detector = OneDimPeakDetector::new(&table, 10.0);
        let scan = Scan::new(
            7,
            1.0,
            vec![100.2, 100.5, 101.1, 101.5, 102.0],
            vec![60.0, 20.0, 8.0, 10.0, 11.0],
        )
        .unwrap();

        let peaks = detector.detect(&scan);
        let kept: Vec<usize> = peaks.iter().map(|p| p.datapoint_index).collect();
        // 100.5 is under its bin threshold, 101.1 under the noise level.
        // Boundaries are inclusive.
        assert_eq!(kept, vec![0, 3, 4]);
        assert!(peaks.iter().all(|p| p.scan_index == 7 && !p.is_connected()));
        assert_eq!(peaks[0].mz, 100.2);
        assert_eq!(peaks[0].intensity, 60.0);
    }

    #[test]
    fn test_empty_scan() {
        let table = ThresholdTable::new(100.0, 101.0, 1.0, vec![0.0]);
        let detector = OneDimPeakDetector::new(&table, 0.0);
        let scan = Scan::new(0, 0.0, vec![], vec![]).unwrap();
        assert!(detector.detect(&scan).is_empty());
    }
}
