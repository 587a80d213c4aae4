use indicatif::ProgressBar;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::Result;
use crate::models::finalized_peak::{FinalizedPeak, PeakList};
use crate::models::parameters::PeakPickerParameters;
use crate::picking::one_dim_detector::OneDimPeakDetector;
use crate::picking::threshold_engine::ThresholdEngine;
use crate::picking::tracker::ChromatogramTracker;
use crate::traits::aggregator::Aggregator;
use crate::traits::scan_source::ScanSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Waiting,
    Processing,
    Finished,
    Error,
    Canceled,
}

/// Result of a step that can be canceled by the user.
///
/// Cancellation is not an error, it simply produces nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Canceled,
}

impl<T> Outcome<T> {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Outcome::Canceled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(x) => Some(x),
            Outcome::Canceled => None,
        }
    }
}

pub type TaskOutcome = Outcome<PeakPickingResult>;

/// Cooperative cancellation flag, cheap to clone and share between
/// threads.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Observable state of a running task.
///
/// Progress counts every scan twice, once for the threshold pass and once
/// for the tracking pass.
#[derive(Debug)]
pub struct TaskProgress {
    status: Mutex<TaskStatus>,
    error_message: Mutex<Option<String>>,
    processed_scans: AtomicUsize,
    total_scans: AtomicUsize,
    cancel: CancellationToken,
    bar: Option<ProgressBar>,
}

impl TaskProgress {
    pub fn new(cancel: CancellationToken, bar: Option<ProgressBar>) -> Self {
        Self {
            status: Mutex::new(TaskStatus::Waiting),
            error_message: Mutex::new(None),
            processed_scans: AtomicUsize::new(0),
            total_scans: AtomicUsize::new(0),
            cancel,
            bar,
        }
    }

    pub fn status(&self) -> TaskStatus {
        match self.status.lock() {
            Ok(x) => *x,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self.error_message.lock() {
            Ok(x) => x.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Fraction of the work done, between 0 and 1.
    pub fn finished_fraction(&self) -> f32 {
        let total = self.total_scans.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.processed_scans.load(Ordering::Relaxed) as f32 / (2.0 * total as f32)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn set_status(&self, status: TaskStatus) {
        match self.status.lock() {
            Ok(mut x) => *x = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }

    fn set_error(&self, msg: String) {
        match self.error_message.lock() {
            Ok(mut x) => *x = Some(msg),
            Err(poisoned) => *poisoned.into_inner() = Some(msg),
        }
        self.set_status(TaskStatus::Error);
    }

    pub(crate) fn set_total_scans(&self, total: usize) {
        self.total_scans.store(total, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.set_length(2 * total as u64);
        }
    }

    pub(crate) fn scans_processed(&self, num: usize) {
        self.processed_scans.fetch_add(num, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(num as u64);
        }
    }

    fn finish_bar(&self, msg: &'static str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(msg);
        }
    }
}

/// Everything a finished task produces for one data file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakPickingResult {
    pub data_file: String,
    pub scan_count: usize,
    pub parameters: PeakPickerParameters,
    pub peaks: PeakList,
}

/// Centroid peak detection on a single data file.
///
/// The file is processed sequentially: first the chromatographic
/// thresholds are computed from every scan, then the scans are tracked
/// one after the other.
pub struct PeakPickingTask<S: ScanSource> {
    source: S,
    parameters: PeakPickerParameters,
    progress: Arc<TaskProgress>,
}

impl<S: ScanSource> PeakPickingTask<S> {
    pub fn new(source: S, parameters: PeakPickerParameters) -> Self {
        Self {
            source,
            parameters,
            progress: Arc::new(TaskProgress::new(CancellationToken::new(), None)),
        }
    }

    /// Shares a cancellation token (and optionally a progress bar) with
    /// other tasks.
    pub fn with_monitoring(mut self, cancel: CancellationToken, bar: Option<ProgressBar>) -> Self {
        self.progress = Arc::new(TaskProgress::new(cancel, bar));
        self
    }

    pub fn description(&self) -> String {
        format!("Centroid peak detection on {}", self.source.name())
    }

    /// Handle to watch the status / progress or cancel from another thread.
    pub fn progress(&self) -> Arc<TaskProgress> {
        Arc::clone(&self.progress)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    #[instrument(skip(self), fields(data_file = self.source.name()))]
    pub fn run(&self) -> Result<TaskOutcome> {
        let st = Instant::now();
        info!("{}", self.description());
        match self.run_pipeline() {
            Ok(Outcome::Completed(peaks)) => {
                self.progress.set_status(TaskStatus::Finished);
                self.progress.finish_bar("done");
                info!(
                    "Found {} peaks in {} in {:#?}",
                    peaks.len(),
                    self.source.name(),
                    st.elapsed()
                );
                Ok(Outcome::Completed(PeakPickingResult {
                    data_file: self.source.name().to_string(),
                    scan_count: self.source.scan_count(),
                    parameters: self.parameters,
                    peaks,
                }))
            }
            Ok(Outcome::Canceled) => {
                self.progress.set_status(TaskStatus::Canceled);
                self.progress.finish_bar("canceled");
                info!("Peak picking on {} canceled", self.source.name());
                Ok(Outcome::Canceled)
            }
            Err(e) => {
                error!("Peak picking on {} failed: {}", self.source.name(), e);
                self.progress.set_error(e.to_string());
                self.progress.finish_bar("error");
                Err(e)
            }
        }
    }

    /// Runs the task and forwards the accepted peaks to `sink`.
    ///
    /// Peaks only reach the sink once the whole file is done, a canceled
    /// or failed run adds nothing.
    pub fn run_into<A: Aggregator<Item = FinalizedPeak>>(
        &self,
        sink: &mut A,
    ) -> Result<Outcome<usize>> {
        Ok(match self.run()? {
            Outcome::Completed(result) => {
                let num_peaks = result.peaks.len();
                for peak in result.peaks.peaks() {
                    sink.add(peak.clone());
                }
                Outcome::Completed(num_peaks)
            }
            Outcome::Canceled => Outcome::Canceled,
        })
    }

    fn run_pipeline(&self) -> Result<Outcome<PeakList>> {
        self.parameters.validate()?;
        self.progress.set_status(TaskStatus::Processing);

        let total_scans = self.source.scan_count();
        self.progress.set_total_scans(total_scans);
        if total_scans == 0 {
            warn!("{} has no scans", self.source.name());
            return Ok(Outcome::Completed(PeakList::new()));
        }

        let engine = ThresholdEngine::new(&self.parameters);
        let table = match engine.compute_with_progress(&self.source, &self.progress)? {
            Outcome::Completed(Some(table)) => table,
            Outcome::Completed(None) => {
                warn!(
                    "{} has no data points, nothing to track",
                    self.source.name()
                );
                self.progress.scans_processed(2 * total_scans);
                return Ok(Outcome::Completed(PeakList::new()));
            }
            Outcome::Canceled => return Ok(Outcome::Canceled),
        };
        debug!("Chromatographic thresholds: {}", table);

        let detector = OneDimPeakDetector::new(&table, self.parameters.noise_level);
        let mut tracker = ChromatogramTracker::new(&self.parameters);
        let mut peaks = PeakList::new();

        let st = Instant::now();
        for position in 0..total_scans {
            if self.progress.is_canceled() {
                // In-flight chromatograms and accepted peaks are dropped here.
                return Ok(Outcome::Canceled);
            }

            let scan = self.source.get_scan(position)?;
            let one_dim_peaks = detector.detect(&scan);
            tracker.process_scan(&scan, one_dim_peaks, &mut peaks)?;

            self.progress.scans_processed(1);
        }
        let flushed = tracker.finish(&mut peaks);
        debug!(
            "Flushed {} remaining chromatograms, {} accepted",
            flushed.ended, flushed.accepted
        );
        info!("Tracking took {:#?}", st.elapsed());

        Ok(Outcome::Completed(peaks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::Scan;
    use crate::models::sources::in_memory::InMemoryScanSource;

    fn example_source() -> InMemoryScanSource {
        let scans = [(0.0, 20.0), (2.0, 40.0), (4.0, 25.0)]
            .into_iter()
            .enumerate()
            .map(|(i, (rt, inten))| Scan::new(i, rt, vec![100.0], vec![inten]).unwrap())
            .collect();
        InMemoryScanSource::new("example", scans)
    }

    fn example_parameters() -> PeakPickerParameters {
        PeakPickerParameters {
            bin_size: 0.1,
            chromatographic_threshold_level: 0.0,
            noise_level: 4.0,
            minimum_peak_height: 15.0,
            minimum_peak_duration: 3.0,
            mz_tolerance: 0.05,
            int_tolerance: 0.2,
        }
    }

    #[test]
    fn test_task_status_lifecycle() {
        let task = PeakPickingTask::new(example_source(), example_parameters());
        let progress = task.progress();
        assert_eq!(progress.status(), TaskStatus::Waiting);
        assert_eq!(progress.finished_fraction(), 0.0);
        assert_eq!(task.description(), "Centroid peak detection on example");

        let out = task.run().unwrap();
        assert_eq!(progress.status(), TaskStatus::Finished);
        assert_eq!(progress.finished_fraction(), 1.0);
        assert!(progress.error_message().is_none());

        let result = out.completed().unwrap();
        assert_eq!(result.data_file, "example");
        assert_eq!(result.peaks.len(), 1);
    }

    #[test]
    fn test_canceled_task_produces_nothing() {
        let cancel = CancellationToken::new();
        let task = PeakPickingTask::new(example_source(), example_parameters())
            .with_monitoring(cancel.clone(), None);
        cancel.cancel();

        let mut sink = PeakList::new();
        let out = task.run_into(&mut sink).unwrap();
        assert!(out.is_canceled());
        assert!(sink.is_empty());
        assert_eq!(task.progress().status(), TaskStatus::Canceled);
        assert!(task.progress().error_message().is_none());
    }

    /// Sets the token once `cancel_at` scans have been read, passes
    /// included.
    struct CancelingSource {
        inner: InMemoryScanSource,
        cancel: CancellationToken,
        cancel_at: usize,
        reads: AtomicUsize,
    }

    impl ScanSource for CancelingSource {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn scan_count(&self) -> usize {
            self.inner.scan_count()
        }

        fn get_scan(&self, position: usize) -> Result<Scan> {
            let reads = self.reads.fetch_add(1, Ordering::Relaxed) + 1;
            if reads == self.cancel_at {
                self.cancel.cancel();
            }
            self.inner.get_scan(position)
        }
    }

    #[test]
    fn test_cancel_while_tracking_produces_nothing() {
        let cancel = CancellationToken::new();
        // The range and threshold passes read 3 scans each, the second
        // tracking read sets the token.
        let source = CancelingSource {
            inner: example_source(),
            cancel: cancel.clone(),
            cancel_at: 8,
            reads: AtomicUsize::new(0),
        };
        let task = PeakPickingTask::new(&source, example_parameters())
            .with_monitoring(cancel.clone(), None);

        let mut sink = PeakList::new();
        let out = task.run_into(&mut sink).unwrap();
        assert_eq!(out, Outcome::Canceled);
        assert!(sink.is_empty());
        assert_eq!(task.progress().status(), TaskStatus::Canceled);
        assert!(task.progress().error_message().is_none());
        assert_eq!(source.reads.load(Ordering::Relaxed), 8);
        assert_eq!(task.progress().finished_fraction(), 5.0 / 6.0);
    }

    #[test]
    fn test_invalid_parameters_fail_the_task() {
        let params = PeakPickerParameters {
            bin_size: -1.0,
            ..example_parameters()
        };
        let task = PeakPickingTask::new(example_source(), params);
        assert!(task.run().is_err());
        assert_eq!(task.progress().status(), TaskStatus::Error);
        assert!(task.progress().error_message().is_some());
    }

    #[test]
    fn test_run_into_forwards_peaks() {
        let task = PeakPickingTask::new(example_source(), example_parameters());
        let mut sink = PeakList::new();
        let out = task.run_into(&mut sink).unwrap();
        assert_eq!(out, Outcome::Completed(1));
        assert_eq!(sink.len(), 1);
    }
}
