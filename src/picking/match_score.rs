use std::cmp::Ordering;

use crate::models::chromatogram::{Chromatogram, ShapeDirection};
use crate::models::one_dim_peak::OneDimPeak;

/// A candidate link between an active chromatogram and a 1D peak of the
/// current scan. Lower scores are better, `f64::INFINITY` never matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub score: f64,
    /// Arena slot of the chromatogram in the tracker.
    pub chromatogram_slot: usize,
    /// Position of the peak in the current scan's peak list.
    pub peak_position: usize,
    /// Order in which the pair was scored, chromatogram first then peak.
    pub discovery_order: usize,
}

impl MatchScore {
    pub fn is_match(&self) -> bool {
        self.score.is_finite()
    }

    /// Ascending by score, ties broken by discovery order.
    pub fn ranking(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then(self.discovery_order.cmp(&other.discovery_order))
    }
}

/// Penalty for appending a data point of intensity `next` to `chrom`.
///
/// 0 when the point continues the current elution profile, infinite when
/// it would break it.
pub fn shape_score(chrom: &Chromatogram, next: f64, int_tolerance: f64) -> f64 {
    match chrom.len() {
        0 => 0.0,
        1 => {
            let prev = chrom.last_intensity();
            if next >= prev {
                0.0
            } else if next <= prev * (1.0 - int_tolerance) {
                f64::INFINITY
            } else {
                0.0
            }
        }
        _ => match chrom.direction() {
            ShapeDirection::Rising => 0.0,
            ShapeDirection::Falling => {
                if next >= chrom.last_intensity() * (1.0 + int_tolerance) {
                    f64::INFINITY
                } else {
                    0.0
                }
            }
            ShapeDirection::Broken | ShapeDirection::Unstarted => f64::INFINITY,
        },
    }
}

/// m/z distance to the last point of the chromatogram, infinite outside
/// of the tolerance.
pub fn mz_score(chrom: &Chromatogram, mz: f64, mz_tolerance: f64) -> f64 {
    if chrom.is_empty() {
        return 0.0;
    }
    let diff = (mz - chrom.last_mz()).abs();
    if diff > mz_tolerance {
        f64::INFINITY
    } else {
        diff
    }
}

pub fn calc_score(
    chrom: &Chromatogram,
    peak: &OneDimPeak,
    mz_tolerance: f64,
    int_tolerance: f64,
) -> f64 {
    let mz = mz_score(chrom, peak.mz, mz_tolerance);
    if mz.is_infinite() {
        return f64::INFINITY;
    }
    let shape = shape_score(chrom, peak.intensity, int_tolerance);
    if shape.is_infinite() {
        return f64::INFINITY;
    }
    (mz * mz + shape * shape).sqrt()
}
