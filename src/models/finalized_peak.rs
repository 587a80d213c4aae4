use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::chromatogram::{Chromatogram, RawDatapoint};
use crate::traits::aggregator::Aggregator;

/// A chromatogram that passed the duration and height filters.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedPeak {
    pub id: u64,
    pub raw_datapoints: BTreeMap<usize, RawDatapoint>,
    pub min_rt: f32,
    pub max_rt: f32,
    pub raw_height: f64,
    pub summary: PeakSummary,
}

/// Values derived from the data points of a finalized peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakSummary {
    pub apex_mz: f64,
    pub apex_rt: f32,
    pub apex_scan_index: usize,
    /// Intensity weighted mean of the m/z values.
    pub mz_mean: f64,
    pub mz_sd: f64,
    /// Trapezoidal integral of intensity over retention time.
    pub area: f64,
}

impl From<Chromatogram> for FinalizedPeak {
    fn from(chrom: Chromatogram) -> Self {
        let id = chrom.id;
        let min_rt = chrom.min_rt();
        let max_rt = chrom.max_rt();
        let raw_height = chrom.raw_height();
        let mz_stats = *chrom.mz_stats();
        let raw_datapoints = chrom.into_datapoints();

        // First point with the max intensity.
        let (apex_scan_index, apex) = raw_datapoints
            .iter()
            .fold(None, |best: Option<(usize, &RawDatapoint)>, (k, v)| match best {
                Some((_, b)) if b.intensity >= v.intensity => best,
                _ => Some((*k, v)),
            })
            .map(|(k, v)| (k, *v))
            .unwrap_or((
                0,
                RawDatapoint {
                    mz: f64::NAN,
                    rt: f32::NAN,
                    intensity: 0.0,
                },
            ));

        let area: f64 = raw_datapoints
            .values()
            .zip(raw_datapoints.values().skip(1))
            .map(|(a, b)| (b.rt - a.rt) as f64 * (a.intensity + b.intensity) / 2.0)
            .sum();

        let mz_mean = mz_stats.mean().unwrap_or(apex.mz);
        let mz_sd = mz_stats.standard_deviation().unwrap_or(0.0);

        FinalizedPeak {
            id,
            raw_datapoints,
            min_rt,
            max_rt,
            raw_height,
            summary: PeakSummary {
                apex_mz: apex.mz,
                apex_rt: apex.rt,
                apex_scan_index,
                mz_mean,
                mz_sd,
                area,
            },
        }
    }
}

impl FinalizedPeak {
    pub fn duration(&self) -> f32 {
        self.max_rt - self.min_rt
    }

    pub fn num_datapoints(&self) -> usize {
        self.raw_datapoints.len()
    }
}

/// Ordered collection of finalized peaks, in the order they were
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeakList {
    peaks: Vec<FinalizedPeak>,
}

impl PeakList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peak(&mut self, peak: FinalizedPeak) {
        self.peaks.push(peak);
    }

    pub fn peaks(&self) -> &[FinalizedPeak] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FinalizedPeak> {
        self.peaks.iter()
    }
}

impl Aggregator for PeakList {
    type Item = FinalizedPeak;
    type Output = PeakList;

    fn add(&mut self, item: impl Into<FinalizedPeak>) {
        self.add_peak(item.into());
    }

    fn finalize(self) -> PeakList {
        self
    }
}
