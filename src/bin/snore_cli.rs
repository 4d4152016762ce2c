use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use snore_detector::audio::load_waveform;
use snore_detector::audio::synthetic::{generate, SyntheticPattern};
use snore_detector::config::DEFAULT_CONFIG_PATH;
use snore_detector::error::log_pipeline_error;
use snore_detector::dataset::{check_split_with_tolerance, slice_split, ClipCheckReport, SliceReport};
use snore_detector::{AppConfig, ClipDataset, FeaturePipeline, FeatureTensor, LabelSet, Waveform};

#[derive(Parser, Debug)]
#[command(
    name = "snore_cli",
    about = "Offline preprocessing and log-mel feature harness for the snore detector"
)]
struct Cli {
    /// Pipeline configuration JSON (defaults apply when missing)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Slice raw recordings into fixed-length clips
    Slice {
        /// Label to process (defaults to every configured label)
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        raw_dir: Option<PathBuf>,
        #[arg(long)]
        clips_dir: Option<PathBuf>,
    },
    /// Verify stored clips against the configured rate and duration
    Check {
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        clips_dir: Option<PathBuf>,
    },
    /// Extract the feature tensor of one WAV file or synthetic signal
    Features {
        #[arg(long, conflicts_with = "synthetic")]
        input: Option<PathBuf>,
        #[arg(long, value_enum)]
        synthetic: Option<SyntheticPattern>,
        /// Synthetic signal length
        #[arg(long, default_value_t = 1.0)]
        seconds: f64,
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,
        #[arg(long, default_value_t = 0.5)]
        amplitude: f32,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Write the full tensor as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summarize the clip dataset and optionally extract every clip
    Dataset {
        #[arg(long)]
        clips_dir: Option<PathBuf>,
        /// Run batch feature extraction over all clips
        #[arg(long)]
        extract: bool,
        /// Worker threads (defaults to dataset.workers)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print the effective configuration
    DumpConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load_from_file(&cli.config);
    config
        .validate()
        .with_context(|| format!("validating configuration {}", cli.config.display()))?;

    match cli.command {
        Commands::Slice {
            label,
            raw_dir,
            clips_dir,
        } => run_slice(&config, label, raw_dir, clips_dir),
        Commands::Check { label, clips_dir } => run_check(&config, label, clips_dir),
        Commands::Features {
            input,
            synthetic,
            seconds,
            frequency,
            amplitude,
            seed,
            output,
        } => {
            let source = match (input, synthetic) {
                (Some(path), _) => FeatureSource::File(path),
                (None, Some(pattern)) => FeatureSource::Synthetic {
                    pattern,
                    seconds,
                    frequency,
                    amplitude,
                    seed,
                },
                (None, None) => bail!("either --input or --synthetic is required"),
            };
            run_features(&config, source, output)
        }
        Commands::Dataset {
            clips_dir,
            extract,
            workers,
        } => run_dataset(&config, clips_dir, extract, workers),
        Commands::DumpConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::from(0))
        }
    }
}

/// Labels named on the command line, or every configured label.
fn selected_labels(config: &AppConfig, label: Option<String>) -> Result<Vec<String>> {
    match label {
        Some(label) => {
            if !config.dataset.labels.contains(&label) {
                bail!(
                    "unknown label '{}' (configured: {})",
                    label,
                    config.dataset.labels.join(", ")
                );
            }
            Ok(vec![label])
        }
        None => Ok(config.dataset.labels.clone()),
    }
}

fn run_slice(
    config: &AppConfig,
    label: Option<String>,
    raw_dir: Option<PathBuf>,
    clips_dir: Option<PathBuf>,
) -> Result<ExitCode> {
    let raw_dir = raw_dir.unwrap_or_else(|| config.dataset.raw_dir.clone());
    let clips_dir = clips_dir.unwrap_or_else(|| config.dataset.clips_dir.clone());

    let reports = selected_labels(config, label)?
        .iter()
        .map(|label| {
            slice_split(&raw_dir, &clips_dir, label, &config.features)
                .with_context(|| format!("slicing label {}", label))
        })
        .collect::<Result<Vec<SliceReport>>>()?;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(ExitCode::from(0))
}

fn run_check(config: &AppConfig, label: Option<String>, clips_dir: Option<PathBuf>) -> Result<ExitCode> {
    let clips_dir = clips_dir.unwrap_or_else(|| config.dataset.clips_dir.clone());

    let reports = selected_labels(config, label)?
        .iter()
        .map(|label| {
            check_split_with_tolerance(
                &clips_dir,
                label,
                &config.features,
                config.dataset.duration_tolerance_seconds,
            )
            .with_context(|| format!("checking label {}", label))
        })
        .collect::<Result<Vec<ClipCheckReport>>>()?;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(ExitCode::from(0))
}

enum FeatureSource {
    File(PathBuf),
    Synthetic {
        pattern: SyntheticPattern,
        seconds: f64,
        frequency: f32,
        amplitude: f32,
        seed: u64,
    },
}

fn run_features(config: &AppConfig, source: FeatureSource, output: Option<PathBuf>) -> Result<ExitCode> {
    let features = &config.features;
    let (name, waveform) = match source {
        FeatureSource::File(path) => {
            let waveform = load_waveform(&path, features.sample_rate)
                .with_context(|| format!("loading {}", path.display()))?;
            (path.display().to_string(), waveform)
        }
        FeatureSource::Synthetic {
            pattern,
            seconds,
            frequency,
            amplitude,
            seed,
        } => {
            let len = (seconds * features.sample_rate as f64).round() as usize;
            let samples = generate(pattern, features.sample_rate, len, frequency, amplitude, seed);
            let waveform = Waveform::new(samples, features.sample_rate)
                .context("building synthetic waveform")?;
            let pattern_name = pattern
                .to_possible_value()
                .map(|value| value.get_name().to_string())
                .unwrap_or_default();
            (format!("synthetic:{}", pattern_name), waveform)
        }
    };

    let pipeline = FeaturePipeline::new(features).context("building feature pipeline")?;
    let tensor = pipeline
        .extract(&waveform)
        .with_context(|| format!("extracting features from {}", name))?;

    if let Some(path) = &output {
        write_tensor(path, &tensor)?;
    }

    let report = FeatureReport::new(&name, &waveform, &tensor, output.as_deref());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn write_tensor(path: &Path, tensor: &FeatureTensor) -> Result<()> {
    let json = serde_json::to_string(tensor)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

fn run_dataset(
    config: &AppConfig,
    clips_dir: Option<PathBuf>,
    extract: bool,
    workers: Option<usize>,
) -> Result<ExitCode> {
    let clips_dir = clips_dir.unwrap_or_else(|| config.dataset.clips_dir.clone());
    let labels = LabelSet::new(config.dataset.labels.iter().cloned())?;
    let dataset = ClipDataset::discover(&clips_dir, &labels)
        .with_context(|| format!("indexing {}", clips_dir.display()))?;

    let per_label = labels
        .iter()
        .map(|(label, name)| LabelCount {
            label: name.to_string(),
            id: label.id(),
            clips: dataset.count_for(label),
        })
        .collect();

    let extraction = if extract {
        let pipeline = FeaturePipeline::new(&config.features).context("building feature pipeline")?;
        let workers = workers.unwrap_or(config.dataset.workers);
        Some(extract_all(&dataset, &pipeline, workers))
    } else {
        None
    };

    let summary = DatasetSummary {
        root: clips_dir.display().to_string(),
        total_clips: dataset.len(),
        labels: per_label,
        extraction,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::from(0))
}

fn extract_all(dataset: &ClipDataset, pipeline: &FeaturePipeline, workers: usize) -> ExtractionSummary {
    let sample_rate = pipeline.config().sample_rate;
    let mut failures = Vec::new();
    let mut waveforms = Vec::with_capacity(dataset.len());

    for entry in dataset.entries() {
        match load_waveform(&entry.path, sample_rate) {
            Ok(waveform) => waveforms.push(waveform),
            Err(err) => {
                log_pipeline_error(&err, "dataset clip decode");
                failures.push(err.to_string());
            }
        }
    }

    let mut shape = None;
    let mut extracted = 0;
    for result in pipeline.extract_batch(&waveforms, workers) {
        match result {
            Ok(tensor) => {
                shape.get_or_insert(tensor.shape());
                extracted += 1;
            }
            Err(err) => {
                log_pipeline_error(&err, "dataset feature extraction");
                failures.push(err.to_string());
            }
        }
    }

    ExtractionSummary {
        workers,
        extracted,
        failed: failures.len(),
        shape,
        failures,
    }
}

#[derive(Serialize)]
struct FeatureReport<'a> {
    source: &'a str,
    sample_rate: u32,
    samples: usize,
    shape: [usize; 3],
    min: f32,
    max: f32,
    mean: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

impl<'a> FeatureReport<'a> {
    fn new(source: &'a str, waveform: &Waveform, tensor: &FeatureTensor, output: Option<&Path>) -> Self {
        let (min, max, sum) = tensor.data.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0f64),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v as f64),
        );
        let (min, max, mean) = if tensor.data.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (min, max, (sum / tensor.data.len() as f64) as f32)
        };

        Self {
            source,
            sample_rate: waveform.sample_rate(),
            samples: waveform.len(),
            shape: tensor.shape(),
            min,
            max,
            mean,
            output: output.map(|p| p.display().to_string()),
        }
    }
}

#[derive(Serialize)]
struct LabelCount {
    label: String,
    id: u32,
    clips: usize,
}

#[derive(Serialize)]
struct ExtractionSummary {
    workers: usize,
    extracted: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<[usize; 3]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<String>,
}

#[derive(Serialize)]
struct DatasetSummary {
    root: String,
    total_clips: usize,
    labels: Vec<LabelCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extraction: Option<ExtractionSummary>,
}
