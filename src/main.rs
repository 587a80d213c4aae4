use clap::{Parser, Subcommand};
use indicatif::MultiProgress;
use peakpicker::models::sources::mzml::MzMLScanSource;
use peakpicker::picking::batch::{run_batch, FileResult};
use peakpicker::{
    CancellationToken, Outcome, PeakPickerError, PeakPickerParameters, PeakPickingResult,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use thiserror::Error;
use tracing::subscriber::set_global_default;
use tracing::{error, info};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack serialization error: {0}")]
    MsgPack(#[from] rmp_serde::encode::Error),

    #[error(transparent)]
    PeakPicker(#[from] PeakPickerError),

    #[error("{failed} of {total} files could not be processed")]
    FilesFailed { failed: usize, total: usize },
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    PrettyJson,
    Msgpack,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::PrettyJson => "json",
            OutputFormat::Msgpack => "msgpack",
        }
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CliError> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_vec(value)?,
            OutputFormat::PrettyJson => serde_json::to_vec_pretty(value)?,
            OutputFormat::Msgpack => rmp_serde::to_vec_named(value)?,
        })
    }
}

#[derive(Parser, Debug)]
struct PickArgs {
    /// The mzML files to pick peaks from.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// The path to the json file with the peak picker parameters.
    /// Missing values take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The directory where the peak lists are written.
    #[arg(short, long)]
    output_path: PathBuf,

    #[arg(short, long, default_value_t, value_enum)]
    format: OutputFormat,

    /// MS level of the spectra to use.
    #[arg(long, default_value_t = 1)]
    ms_level: u8,

    /// Log as bunyan json instead of plain text (disables progress bars).
    #[arg(long)]
    json_logs: bool,
}

#[derive(Parser, Debug)]
struct WriteTemplateArgs {
    /// The path to the output files.
    #[arg(short, long)]
    output_path: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pick the peaks of one or more files.
    Pick(PickArgs),
    /// Write a parameter file with the default values.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Tabled)]
struct SummaryRow {
    file: String,
    scans: usize,
    peaks: String,
    status: String,
}

fn init_logging(json_logs: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = if json_logs {
        let formatting_layer = BunyanFormattingLayer::new("peakpicker".into(), std::io::stdout);
        let subscriber = Registry::default()
            .with(env_filter)
            .with(JsonStorageLayer)
            .with(formatting_layer);
        set_global_default(subscriber)
    } else {
        let subscriber = Registry::default()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE));
        set_global_default(subscriber)
    };
    if let Err(e) = result {
        eprintln!("Setting default subscriber failed: {}", e);
    }
}

fn main() -> Result<(), CliError> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Pick(args)) => {
            init_logging(args.json_logs);
            main_pick(args)?
        }
        Some(Commands::WriteTemplate(args)) => {
            init_logging(false);
            main_write_template(args)?
        }
        None => {
            println!("No command provided");
        }
    }
    Ok(())
}

fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let params = PeakPickerParameters::default();
    let params_json = serde_json::to_string_pretty(&params)?;

    std::fs::create_dir_all(&args.output_path)?;
    let params_path = args.output_path.join("peakpicker_params.json");
    std::fs::write(&params_path, params_json)?;
    println!("Wrote {}", params_path.display());
    println!(
        "use as `peakpicker pick --config {:#?} --output-path '.' your_file.mzML`",
        params_path,
    );
    Ok(())
}

fn write_result(
    result: &PeakPickingResult,
    output_path: &Path,
    format: OutputFormat,
) -> Result<PathBuf, CliError> {
    let stem = Path::new(&result.data_file)
        .file_stem()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_else(|| result.data_file.clone());
    let out_path = output_path.join(format!("{}.peaks.{}", stem, format.extension()));
    std::fs::write(&out_path, format.serialize(result)?)?;
    Ok(out_path)
}

fn main_pick(args: PickArgs) -> Result<(), CliError> {
    let params = match &args.config {
        Some(path) => PeakPickerParameters::from_json_file(path)?,
        None => {
            info!("No config provided, using default parameters");
            PeakPickerParameters::default()
        }
    };
    params.validate()?;
    info!("Using parameters: {:?}", params);

    std::fs::create_dir_all(&args.output_path)?;

    let multi_progress = if args.json_logs {
        None
    } else {
        Some(MultiProgress::new())
    };
    let cancel = CancellationToken::new();
    let ms_level = args.ms_level;
    let inputs: Vec<String> = args
        .files
        .iter()
        .map(|x| x.display().to_string())
        .collect();
    let total = inputs.len();

    let results = run_batch(
        inputs,
        |path| MzMLScanSource::open(path, ms_level),
        &params,
        &cancel,
        multi_progress.as_ref(),
    );

    let mut rows = Vec::with_capacity(results.len());
    let mut failed = 0;
    for FileResult {
        data_file,
        scan_count,
        outcome,
    } in results
    {
        let (peaks, status) = match outcome {
            Ok(Outcome::Completed(result)) => {
                match write_result(&result, &args.output_path, args.format) {
                    Ok(path) => {
                        info!("Wrote {}", path.display());
                        (result.peaks.len().to_string(), "Finished".to_string())
                    }
                    Err(e) => {
                        error!("Could not write the peaks of {}: {}", data_file, e);
                        failed += 1;
                        (result.peaks.len().to_string(), format!("Error: {}", e))
                    }
                }
            }
            Ok(Outcome::Canceled) => ("-".to_string(), "Canceled".to_string()),
            Err(e) => {
                failed += 1;
                ("-".to_string(), format!("Error: {}", e))
            }
        };
        rows.push(SummaryRow {
            file: data_file,
            scans: scan_count,
            peaks,
            status,
        });
    }

    println!("{}", Table::new(rows).with(Style::modern()));

    if failed > 0 {
        return Err(CliError::FilesFailed { failed, total });
    }
    Ok(())
}
