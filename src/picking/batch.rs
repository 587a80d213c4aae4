use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fmt::Display;
use std::time::Instant;
use tracing::info;

use crate::errors::Result;
use crate::models::parameters::PeakPickerParameters;
use crate::picking::task::{CancellationToken, PeakPickingTask, TaskOutcome};
use crate::traits::scan_source::ScanSource;

/// Outcome of the peak picking of one input of a batch.
#[derive(Debug)]
pub struct FileResult {
    pub data_file: String,
    /// 0 when the input could not be loaded.
    pub scan_count: usize,
    pub outcome: Result<TaskOutcome>,
}

fn file_progress_bar(multi: &MultiProgress, name: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{prefix:.bold} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    let bar = multi.add(ProgressBar::new(0));
    bar.set_style(style);
    bar.set_prefix(name.to_string());
    bar
}

/// Picks the peaks of several inputs concurrently, one independent task
/// per input.
///
/// `load` turns an input (usually a path) into a scan source, a failure
/// only affects that input. Results keep the order of `inputs`.
pub fn run_batch<T, S, F>(
    inputs: Vec<T>,
    load: F,
    parameters: &PeakPickerParameters,
    cancel: &CancellationToken,
    progress: Option<&MultiProgress>,
) -> Vec<FileResult>
where
    T: Display + Send,
    S: ScanSource,
    F: Fn(T) -> Result<S> + Sync,
{
    let st = Instant::now();
    let num_inputs = inputs.len();
    let out: Vec<FileResult> = inputs
        .into_par_iter()
        .map(|input| {
            let name = input.to_string();
            let source = match load(input) {
                Ok(source) => source,
                Err(e) => {
                    return FileResult {
                        data_file: name,
                        scan_count: 0,
                        outcome: Err(e),
                    }
                }
            };

            let bar = progress.map(|multi| file_progress_bar(multi, source.name()));
            let task = PeakPickingTask::new(source, *parameters).with_monitoring(cancel.clone(), bar);
            FileResult {
                data_file: task.source().name().to_string(),
                scan_count: task.source().scan_count(),
                outcome: task.run(),
            }
        })
        .collect();

    info!("Processed {} inputs in {:#?}", num_inputs, st.elapsed());
    out
}

/// Same as [`run_batch`] for sources that are already loaded.
pub fn run_sources<S: ScanSource + Send>(
    sources: Vec<S>,
    parameters: &PeakPickerParameters,
    cancel: &CancellationToken,
    progress: Option<&MultiProgress>,
) -> Vec<FileResult> {
    let inputs: Vec<NamedSource<S>> = sources.into_iter().map(NamedSource).collect();
    run_batch(inputs, |x| Ok(x.0), parameters, cancel, progress)
}

struct NamedSource<S>(S);

impl<S: ScanSource> Display for NamedSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.name())
    }
}
