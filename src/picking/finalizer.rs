use tracing::trace;

use crate::models::chromatogram::Chromatogram;
use crate::models::finalized_peak::FinalizedPeak;
use crate::models::parameters::PeakPickerParameters;
use crate::traits::aggregator::Aggregator;

/// Decides which ended chromatograms become peaks.
#[derive(Debug, Clone, Copy)]
pub struct PeakFinalizer {
    min_duration: f64,
    min_height: f64,
}

impl PeakFinalizer {
    pub fn new(min_duration: f64, min_height: f64) -> Self {
        Self {
            min_duration,
            min_height,
        }
    }

    pub fn from_parameters(parameters: &PeakPickerParameters) -> Self {
        Self::new(
            parameters.minimum_peak_duration,
            parameters.minimum_peak_height,
        )
    }

    pub fn accepts(&self, chrom: &Chromatogram) -> bool {
        chrom.duration() as f64 >= self.min_duration && chrom.raw_height() >= self.min_height
    }

    /// Pushes the chromatogram to the sink if it passes the filters,
    /// returns whether it did.
    pub fn finalize<A>(&self, chrom: Chromatogram, sink: &mut A) -> bool
    where
        A: Aggregator<Item = FinalizedPeak>,
    {
        if !self.accepts(&chrom) {
            trace!(
                "Rejected chromatogram {} (duration {}, height {})",
                chrom.id,
                chrom.duration(),
                chrom.raw_height()
            );
            return false;
        }
        sink.add(FinalizedPeak::from(chrom));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chromatogram::RawDatapoint;
    use crate::models::finalized_peak::PeakList;

    fn chrom(points: &[(f32, f64)]) -> Chromatogram {
        let mut out = Chromatogram::new(0);
        for (i, (rt, intensity)) in points.iter().enumerate() {
            out.add_datapoint(
                i,
                RawDatapoint {
                    mz: 300.0,
                    rt: *rt,
                    intensity: *intensity,
                },
                0.2,
            );
        }
        out
    }

    #[test]
    fn test_acceptance_boundaries_are_inclusive() {
        let finalizer = PeakFinalizer::new(3.0, 40.0);
        assert!(finalizer.accepts(&chrom(&[(0.0, 20.0), (3.0, 40.0)])));
        assert!(!finalizer.accepts(&chrom(&[(0.0, 20.0), (2.9, 40.0)])));
        assert!(!finalizer.accepts(&chrom(&[(0.0, 20.0), (5.0, 39.0)])));
    }

    #[test]
    fn test_finalize_pushes_accepted() {
        let finalizer = PeakFinalizer::new(1.0, 10.0);
        let mut sink = PeakList::new();
        assert!(finalizer.finalize(chrom(&[(0.0, 20.0), (2.0, 30.0)]), &mut sink));
        assert!(!finalizer.finalize(chrom(&[(0.0, 20.0)]), &mut sink));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.peaks()[0].raw_height, 30.0);
    }
}
