use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::one_dim_peak::OneDimPeak;
use crate::utils::streaming_stats::RunningStatsCalculator;

/// One (m/z, retention time, intensity) point of a chromatogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawDatapoint {
    pub mz: f64,
    pub rt: f32,
    pub intensity: f64,
}

/// Direction of the elution profile at the end of a chromatogram.
///
/// - `Unstarted`: no data points yet.
/// - `Rising`: the intensity has not dropped by more than the intensity
///   tolerance since the profile started (a single point is `Rising`).
/// - `Falling`: the intensity dropped by more than the tolerance at
///   some point, only a continued decline can be appended.
/// - `Broken`: while falling, the intensity went back up by more than
///   the tolerance. Nothing can be appended anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ShapeDirection {
    #[default]
    Unstarted,
    Rising,
    Falling,
    Broken,
}

impl ShapeDirection {
    /// Next direction after appending `curr` right after `prev`.
    fn step(self, prev: f64, curr: f64, int_tolerance: f64) -> Self {
        match self {
            ShapeDirection::Unstarted => ShapeDirection::Rising,
            ShapeDirection::Rising if curr <= prev * (1.0 - int_tolerance) => {
                ShapeDirection::Falling
            }
            ShapeDirection::Falling if curr >= prev * (1.0 + int_tolerance) => {
                ShapeDirection::Broken
            }
            other => other,
        }
    }
}

/// A chromatogram under construction.
///
/// Holds the data points linked so far, keyed by scan index, plus the
/// running values the tracker needs on every scan.
#[derive(Debug, Clone)]
pub struct Chromatogram {
    pub id: u64,
    datapoints: BTreeMap<usize, RawDatapoint>,
    min_rt: f32,
    max_rt: f32,
    raw_height: f64,
    last_mz: f64,
    last_intensity: f64,
    direction: ShapeDirection,
    mz_stats: RunningStatsCalculator,
    growing: bool,
}

impl Chromatogram {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            datapoints: BTreeMap::new(),
            min_rt: f32::INFINITY,
            max_rt: f32::NEG_INFINITY,
            raw_height: 0.0,
            last_mz: f64::NAN,
            last_intensity: f64::NAN,
            direction: ShapeDirection::Unstarted,
            mz_stats: RunningStatsCalculator::new(),
            growing: false,
        }
    }

    /// Starts a chromatogram from an unconnected 1D peak.
    ///
    /// The new chromatogram is not growing, so it can take a point from
    /// the next scan.
    pub fn seeded(id: u64, peak: &OneDimPeak, rt: f32, int_tolerance: f64) -> Self {
        let mut out = Self::new(id);
        out.add_datapoint(
            peak.scan_index,
            RawDatapoint {
                mz: peak.mz,
                rt,
                intensity: peak.intensity,
            },
            int_tolerance,
        );
        out.reset_growing_state();
        out
    }

    /// Appends a data point and marks the chromatogram as growing.
    ///
    /// Scan indices must be strictly increasing.
    pub fn add_datapoint(&mut self, scan_index: usize, point: RawDatapoint, int_tolerance: f64) {
        if let Some((&last_scan, _)) = self.datapoints.last_key_value() {
            assert!(
                scan_index > last_scan,
                "Datapoints must be added in increasing scan order ({} after {})",
                scan_index,
                last_scan
            );
        }

        self.direction = self
            .direction
            .step(self.last_intensity, point.intensity, int_tolerance);

        self.min_rt = self.min_rt.min(point.rt);
        self.max_rt = self.max_rt.max(point.rt);
        self.raw_height = self.raw_height.max(point.intensity);
        self.last_mz = point.mz;
        self.last_intensity = point.intensity;
        self.mz_stats.add(point.mz, point.intensity);
        self.datapoints.insert(scan_index, point);
        self.growing = true;
    }

    pub fn datapoints(&self) -> &BTreeMap<usize, RawDatapoint> {
        &self.datapoints
    }

    pub fn into_datapoints(self) -> BTreeMap<usize, RawDatapoint> {
        self.datapoints
    }

    pub fn len(&self) -> usize {
        self.datapoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datapoints.is_empty()
    }

    pub fn min_rt(&self) -> f32 {
        self.min_rt
    }

    pub fn max_rt(&self) -> f32 {
        self.max_rt
    }

    /// Elution time covered so far, 0 for less than two points.
    pub fn duration(&self) -> f32 {
        if self.datapoints.len() < 2 {
            0.0
        } else {
            self.max_rt - self.min_rt
        }
    }

    pub fn raw_height(&self) -> f64 {
        self.raw_height
    }

    /// m/z of the most recent data point, NaN when empty.
    pub fn last_mz(&self) -> f64 {
        self.last_mz
    }

    /// Intensity of the most recent data point, NaN when empty.
    pub fn last_intensity(&self) -> f64 {
        self.last_intensity
    }

    pub fn direction(&self) -> ShapeDirection {
        self.direction
    }

    pub fn mz_stats(&self) -> &RunningStatsCalculator {
        &self.mz_stats
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    pub fn reset_growing_state(&mut self) {
        self.growing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(rt: f32, intensity: f64) -> RawDatapoint {
        RawDatapoint {
            mz: 100.0,
            rt,
            intensity,
        }
    }

    #[test]
    fn test_running_values() {
        let mut chrom = Chromatogram::new(7);
        assert_eq!(chrom.direction(), ShapeDirection::Unstarted);
        assert_eq!(chrom.duration(), 0.0);

        chrom.add_datapoint(0, point(0.0, 20.0), 0.2);
        assert_eq!(chrom.direction(), ShapeDirection::Rising);
        assert_eq!(chrom.duration(), 0.0);

        chrom.add_datapoint(1, point(2.0, 40.0), 0.2);
        chrom.add_datapoint(2, point(4.0, 25.0), 0.2);

        assert_eq!(chrom.len(), 3);
        assert_eq!(chrom.raw_height(), 40.0);
        assert_eq!(chrom.min_rt(), 0.0);
        assert_eq!(chrom.max_rt(), 4.0);
        assert_eq!(chrom.duration(), 4.0);
        assert_eq!(chrom.last_intensity(), 25.0);
        // 25 <= 40 * 0.8
        assert_eq!(chrom.direction(), ShapeDirection::Falling);
        assert!(chrom.is_growing());
        chrom.reset_growing_state();
        assert!(!chrom.is_growing());
    }

    #[test]
    fn test_small_dip_keeps_rising() {
        let mut chrom = Chromatogram::new(0);
        chrom.add_datapoint(0, point(0.0, 100.0), 0.2);
        chrom.add_datapoint(1, point(1.0, 90.0), 0.2);
        assert_eq!(chrom.direction(), ShapeDirection::Rising);
        chrom.add_datapoint(2, point(2.0, 72.0), 0.2);
        assert_eq!(chrom.direction(), ShapeDirection::Falling);
        // 85 < 72 * 1.2 = 86.4, still a plateau
        chrom.add_datapoint(3, point(3.0, 85.0), 0.2);
        assert_eq!(chrom.direction(), ShapeDirection::Falling);
        chrom.add_datapoint(4, point(4.0, 200.0), 0.2);
        assert_eq!(chrom.direction(), ShapeDirection::Broken);
    }

    #[test]
    #[should_panic]
    fn test_out_of_order_datapoints_panic() {
        let mut chrom = Chromatogram::new(0);
        chrom.add_datapoint(5, point(5.0, 1.0), 0.2);
        chrom.add_datapoint(5, point(5.0, 1.0), 0.2);
    }
}
