//! mocomp - motion-compensated predictive coding from the command line
//!
//! Reads a video, runs one or both P-frame strategies through the full
//! encode/serialize/decode chain and reports compression ratios.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mocomp_core::FrameSequence;
use mocomp_gop::CancelHandle;
use mocomp_media::{read_video, VideoSink};
use mocomp_motion::SearchAlgorithm;
use mocomp_pipeline::{
    FailurePolicy, Pipeline, PipelineConfig, PipelineOutput, PipelineProgress, PipelineStage,
    Strategy,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "mocomp")]
#[command(about = "Block-matching motion-compensated video coding", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode and decode a video with one strategy
    Encode {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Write the reconstructed frames to this video file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Run both strategies and compare compression ratios
    Compare {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Estimate motion only (no residuals, no reconstruction)
    Analyze {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Print the default configuration as JSON
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Differencing,
    MotionCompensated,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Exhaustive,
    Logarithmic,
}

impl From<AlgorithmArg> for SearchAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Exhaustive => Self::Exhaustive,
            AlgorithmArg::Logarithmic => Self::Logarithmic,
        }
    }
}

/// Configuration file plus per-run overrides.
#[derive(Args)]
struct RunOptions {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GOP period (every N-th frame is an I-frame)
    #[arg(long)]
    period: Option<usize>,

    /// P-frame strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Block matching algorithm
    #[arg(long, value_enum)]
    algorithm: Option<AlgorithmArg>,

    /// Block size in pixels
    #[arg(long)]
    block_size: Option<usize>,

    /// Search radius in pixels
    #[arg(long)]
    radius: Option<u32>,

    /// Keep going when individual frames fail to serialize
    #[arg(long)]
    tolerate_failures: bool,

    /// Output frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

impl RunOptions {
    /// Load the config file (or defaults) and apply overrides.
    ///
    /// Motion overrides go to the analysis parameters when `analysis` is set.
    fn resolve(&self, analysis: bool) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load_from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(period) = self.period {
            config.gop_period = period;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = match strategy {
                StrategyArg::Differencing => Strategy::Differencing,
                StrategyArg::MotionCompensated => Strategy::MotionCompensated,
            };
        }
        let motion = if analysis {
            &mut config.analysis
        } else {
            &mut config.motion
        };
        if let Some(algorithm) = self.algorithm {
            motion.algorithm = algorithm.into();
        }
        if let Some(block_size) = self.block_size {
            motion.block_size = block_size;
        }
        if let Some(radius) = self.radius {
            motion.radius = radius;
        }
        if self.tolerate_failures {
            config.failure_policy = FailurePolicy::Tolerate;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Encode {
            input,
            output,
            options,
        } => encode(&input, output.as_deref(), &options),
        Commands::Compare { input, options } => compare(&input, &options),
        Commands::Analyze { input, options } => analyze(&input, &options),
        Commands::Config { output } => print_config(output.as_deref()),
    }
}

fn load(input: &Path) -> Result<FrameSequence> {
    read_video(input).with_context(|| format!("reading {}", input.display()))
}

/// Logs stage transitions at info and individual frames at debug.
fn progress_logger(label: &'static str) -> impl FnMut(PipelineProgress) {
    let mut current: Option<PipelineStage> = None;
    move |p| {
        if current != Some(p.stage) {
            current = Some(p.stage);
            info!(strategy = label, stage = p.stage.display_name(), "Stage started");
        }
        debug!(
            strategy = label,
            stage = p.stage.display_name(),
            completed = p.completed,
            total = p.total,
            "Progress"
        );
    }
}

fn print_report(output: &PipelineOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", output.report.to_json()?);
    } else {
        println!("{}", output.report);
        for failure in output.failures() {
            println!("  {failure}");
        }
    }
    Ok(())
}

fn encode(input: &Path, output: Option<&Path>, options: &RunOptions) -> Result<()> {
    let config = options.resolve(false)?;
    let frames = load(input)?;
    let pipeline = Pipeline::new(config)?;
    let cancel = CancelHandle::new();

    let result = pipeline.run(
        &frames,
        &cancel,
        progress_logger(pipeline.config().strategy.name()),
    )?;
    print_report(&result, options.json)?;

    if let Some(path) = output {
        let missing = result.failures().count();
        if missing > 0 {
            warn!(missing, "Holding the previous frame at each failed position");
        }
        let Some(timeline) = result.held_frames() else {
            bail!("no frames were reconstructed, nothing to write");
        };
        VideoSink::new(path)
            .with_fps(pipeline.config().fps)
            .write(&timeline, |written| {
                debug!(written, "Frames written");
            })
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), frames = timeline.len(), "Reconstruction written");
    }
    Ok(())
}

fn compare(input: &Path, options: &RunOptions) -> Result<()> {
    let config = options.resolve(false)?;
    let frames = load(input)?;
    let pipeline = Pipeline::new(config)?;
    let cancel = CancelHandle::new();

    let mut loggers = Strategy::ALL.map(|s| progress_logger(s.name()));
    let results = pipeline.compare(&frames, &cancel, |strategy, p| {
        let slot = Strategy::ALL.iter().position(|s| *s == strategy).unwrap_or(0);
        (loggers[slot])(p)
    })?;

    if options.json {
        let reports: Vec<_> = results.iter().map(|(_, o)| &o.report).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (_, output) in &results {
            print_report(output, false)?;
        }
    }
    Ok(())
}

fn analyze(input: &Path, options: &RunOptions) -> Result<()> {
    let config = options.resolve(true)?;
    let frames = load(input)?;
    let pipeline = Pipeline::new(config)?;

    let report = pipeline.analyze(&frames, &CancelHandle::new(), |p| {
        debug!(completed = p.completed, total = p.total, "Analysis progress");
    })?;
    let summary = report.summary();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} P-frames, {} blocks: mean |v| {:.3}, zero vectors {:.1}%, max component {}",
            summary.p_frames,
            summary.blocks,
            summary.mean_magnitude,
            summary.zero_share * 100.0,
            summary.max_component
        );
    }
    Ok(())
}

fn print_config(output: Option<&Path>) -> Result<()> {
    let config = PipelineConfig::default();
    match output {
        Some(path) => {
            config.save_to_file(path)?;
            info!(path = %path.display(), "Default configuration written");
        }
        None => println!("{}", String::from_utf8(config.to_json()?)?),
    }
    Ok(())
}
