use tracing::{debug, trace};

use crate::errors::{DataReadingError, Result};
use crate::models::chromatogram::{Chromatogram, RawDatapoint};
use crate::models::finalized_peak::FinalizedPeak;
use crate::models::one_dim_peak::OneDimPeak;
use crate::models::parameters::PeakPickerParameters;
use crate::models::scan::Scan;
use crate::picking::finalizer::PeakFinalizer;
use crate::picking::match_score::{calc_score, MatchScore};
use crate::traits::aggregator::Aggregator;

/// What happened to the pool of chromatograms while processing a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTransition {
    /// 1D peaks appended to an existing chromatogram.
    pub matched: usize,
    /// Chromatograms that received nothing and were handed to the finalizer.
    pub ended: usize,
    /// Ended chromatograms that became peaks.
    pub accepted: usize,
    /// New chromatograms started from unconnected 1D peaks.
    pub started: usize,
}

/// Links the 1D peaks of consecutive scans into chromatograms.
///
/// Chromatograms live in an arena of slots, `active` keeps the slots of
/// the live ones in the order they were created. Pairs are committed
/// greedily from the best score up, so a chromatogram takes at most one
/// point per scan and a point joins at most one chromatogram.
#[derive(Debug)]
pub struct ChromatogramTracker {
    slots: Vec<Option<Chromatogram>>,
    free_slots: Vec<usize>,
    active: Vec<usize>,
    next_id: u64,
    last_scan_index: Option<usize>,
    mz_tolerance: f64,
    int_tolerance: f64,
    finalizer: PeakFinalizer,
}

impl ChromatogramTracker {
    pub fn new(parameters: &PeakPickerParameters) -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            active: Vec::new(),
            next_id: 0,
            last_scan_index: None,
            mz_tolerance: parameters.mz_tolerance,
            int_tolerance: parameters.int_tolerance,
            finalizer: PeakFinalizer::from_parameters(parameters),
        }
    }

    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    /// Chromatograms under construction, oldest first.
    pub fn active(&self) -> impl Iterator<Item = &Chromatogram> + '_ {
        self.active
            .iter()
            .filter_map(move |&slot| self.slots[slot].as_ref())
    }

    /// Scores and links the 1D peaks of `scan`, then hands the
    /// chromatograms that did not grow to the finalizer.
    ///
    /// Scans must come in strictly increasing index order.
    pub fn process_scan<A>(
        &mut self,
        scan: &Scan,
        mut peaks: Vec<OneDimPeak>,
        sink: &mut A,
    ) -> Result<ScanTransition>
    where
        A: Aggregator<Item = FinalizedPeak>,
    {
        if let Some(previous) = self.last_scan_index {
            if scan.index <= previous {
                return Err(DataReadingError::ScanOutOfOrder {
                    index: scan.index,
                    previous,
                }
                .into());
            }
        }
        self.last_scan_index = Some(scan.index);

        let mut transition = ScanTransition::default();

        let mut scores = self.score_pairs(&peaks);
        scores.sort_by(MatchScore::ranking);

        for candidate in scores.iter() {
            let peak = &mut peaks[candidate.peak_position];
            if peak.is_connected() {
                continue;
            }
            let Some(chrom) = self.slots[candidate.chromatogram_slot].as_mut() else {
                continue;
            };
            if chrom.is_growing() {
                continue;
            }

            chrom.add_datapoint(
                scan.index,
                RawDatapoint {
                    mz: peak.mz,
                    rt: scan.retention_time,
                    intensity: peak.intensity,
                },
                self.int_tolerance,
            );
            peak.set_connected();
            transition.matched += 1;
        }

        let (ended, accepted) = self.sweep(sink);
        transition.ended = ended;
        transition.accepted = accepted;

        for peak in peaks.iter().filter(|p| !p.is_connected()) {
            let chrom =
                Chromatogram::seeded(self.next_id, peak, scan.retention_time, self.int_tolerance);
            self.next_id += 1;
            self.insert(chrom);
            transition.started += 1;
        }

        trace!(
            "Scan {} ({} peaks): {:?}, {} active",
            scan.index,
            peaks.len(),
            transition,
            self.active.len()
        );
        Ok(transition)
    }

    /// Finalizes every remaining chromatogram, in pool order.
    pub fn finish<A>(&mut self, sink: &mut A) -> ScanTransition
    where
        A: Aggregator<Item = FinalizedPeak>,
    {
        let mut transition = ScanTransition::default();
        for slot in std::mem::take(&mut self.active) {
            if let Some(chrom) = self.slots[slot].take() {
                transition.ended += 1;
                if self.finalizer.finalize(chrom, sink) {
                    transition.accepted += 1;
                }
            }
        }
        self.slots.clear();
        self.free_slots.clear();
        debug!("Tracker flushed: {:?}", transition);
        transition
    }

    fn score_pairs(&self, peaks: &[OneDimPeak]) -> Vec<MatchScore> {
        let mut out = Vec::new();
        let mut discovery_order = 0;
        for &slot in self.active.iter() {
            let Some(chrom) = self.slots[slot].as_ref() else {
                continue;
            };
            for (peak_position, peak) in peaks.iter().enumerate() {
                let score = calc_score(chrom, peak, self.mz_tolerance, self.int_tolerance);
                if score.is_finite() {
                    out.push(MatchScore {
                        score,
                        chromatogram_slot: slot,
                        peak_position,
                        discovery_order,
                    });
                }
                discovery_order += 1;
            }
        }
        out
    }

    /// Removes the chromatograms that did not grow in this scan, keeping
    /// the order of the others, and resets the growing flag of the rest.
    fn sweep<A>(&mut self, sink: &mut A) -> (usize, usize)
    where
        A: Aggregator<Item = FinalizedPeak>,
    {
        let mut ended = 0;
        let mut accepted = 0;
        let slots = &mut self.slots;
        let free_slots = &mut self.free_slots;
        let finalizer = &self.finalizer;

        self.active.retain(|&slot| {
            if let Some(chrom) = slots[slot].as_mut() {
                if chrom.is_growing() {
                    chrom.reset_growing_state();
                    return true;
                }
            }
            if let Some(chrom) = slots[slot].take() {
                ended += 1;
                if finalizer.finalize(chrom, sink) {
                    accepted += 1;
                }
            }
            free_slots.push(slot);
            false
        });

        (ended, accepted)
    }

    fn insert(&mut self, chrom: Chromatogram) {
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Some(chrom);
                slot
            }
            None => {
                self.slots.push(Some(chrom));
                self.slots.len() - 1
            }
        };
        self.active.push(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PeakPickerError;
    use crate::models::finalized_peak::PeakList;

    fn params() -> PeakPickerParameters {
        PeakPickerParameters {
            minimum_peak_height: 0.0,
            minimum_peak_duration: 0.0,
            mz_tolerance: 0.05,
            int_tolerance: 0.2,
            ..Default::default()
        }
    }

    fn scan_with(index: usize, points: &[(f64, f64)]) -> (Scan, Vec<OneDimPeak>) {
        let (mz, intensity): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        let scan = Scan::new(index, index as f32, mz, intensity).unwrap();
        let peaks = scan
            .iter()
            .enumerate()
            .map(|(i, (mz, inten))| OneDimPeak::new(index, i, mz, inten))
            .collect();
        (scan, peaks)
    }

    #[test]
    fn test_new_peaks_start_chromatograms() {
        let mut tracker = ChromatogramTracker::new(&params());
        let mut sink = PeakList::new();
        let (scan, peaks) = scan_with(0, &[(100.0, 10.0), (200.0, 20.0)]);
        let out = tracker.process_scan(&scan, peaks, &mut sink).unwrap();
        assert_eq!(
            out,
            ScanTransition {
                matched: 0,
                ended: 0,
                accepted: 0,
                started: 2
            }
        );
        assert_eq!(tracker.num_active(), 2);
        assert!(tracker.active().all(|c| !c.is_growing()));
    }

    #[test]
    fn test_matching_and_ending() {
        let mut tracker = ChromatogramTracker::new(&params());
        let mut sink = PeakList::new();
        let (scan, peaks) = scan_with(0, &[(100.0, 10.0), (200.0, 20.0)]);
        tracker.process_scan(&scan, peaks, &mut sink).unwrap();

        // 200 disappears, 100 keeps going, 300 is new
        let (scan, peaks) = scan_with(1, &[(100.01, 15.0), (300.0, 5.0)]);
        let out = tracker.process_scan(&scan, peaks, &mut sink).unwrap();
        assert_eq!(out.matched, 1);
        assert_eq!(out.ended, 1);
        assert_eq!(out.accepted, 1);
        assert_eq!(out.started, 1);

        let active: Vec<_> = tracker.active().map(|c| (c.id, c.len())).collect();
        assert_eq!(active, vec![(0, 2), (2, 1)]);

        let flushed = tracker.finish(&mut sink);
        assert_eq!(flushed.ended, 2);
        assert_eq!(tracker.num_active(), 0);
        let ids: Vec<u64> = sink.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
    }

    #[test]
    fn test_best_score_wins() {
        let mut tracker = ChromatogramTracker::new(&params());
        let mut sink = PeakList::new();
        let (scan, peaks) = scan_with(0, &[(100.0, 10.0)]);
        tracker.process_scan(&scan, peaks, &mut sink).unwrap();

        let (scan, peaks) = scan_with(1, &[(99.97, 12.0), (100.01, 12.0)]);
        let out = tracker.process_scan(&scan, peaks, &mut sink).unwrap();
        assert_eq!(out.matched, 1);
        assert_eq!(out.started, 1);
        let first = tracker.active().next().unwrap();
        assert_eq!(first.last_mz(), 100.01);
    }

    #[test]
    fn test_out_of_order_scan_is_an_error() {
        let mut tracker = ChromatogramTracker::new(&params());
        let mut sink = PeakList::new();
        let (scan, peaks) = scan_with(5, &[(100.0, 10.0)]);
        tracker.process_scan(&scan, peaks, &mut sink).unwrap();

        let (scan, peaks) = scan_with(5, &[(100.0, 10.0)]);
        match tracker.process_scan(&scan, peaks, &mut sink) {
            Err(PeakPickerError::DataReading(DataReadingError::ScanOutOfOrder {
                index,
                previous,
            })) => {
                assert_eq!(index, 5);
                assert_eq!(previous, 5);
            }
            other => panic!("Expected an out of order error, got {:?}", other),
        }
    }

    #[test]
    fn test_slots_are_reused() {
        let mut tracker = ChromatogramTracker::new(&params());
        let mut sink = PeakList::new();
        for i in 0..10 {
            // Alternate m/z so nothing ever matches
            let mz = if i % 2 == 0 { 100.0 } else { 500.0 };
            let (scan, peaks) = scan_with(i, &[(mz, 10.0)]);
            tracker.process_scan(&scan, peaks, &mut sink).unwrap();
        }
        assert_eq!(tracker.num_active(), 1);
        assert!(tracker.slots.len() <= 2);
        assert_eq!(sink.len(), 9);
    }
}
