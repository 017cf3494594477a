use std::process::ExitCode;

use camino::Utf8PathBuf;
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use imagery_catalog::config::{CatalogConfig, ConfigLoader};
use imagery_catalog::discovery::discover_sources;
use imagery_catalog::error::CatalogError;
use imagery_catalog::output::{HumanOutput, JsonOutput, OutputMode};
use imagery_catalog::pipeline::{LogProgress, Pipeline, ProgressSink, RunOptions, RunReport};
use imagery_catalog::schema::Schema;
use imagery_catalog::writer::{GeoJsonCatalogWriter, MemorySink};

#[derive(Parser)]
#[command(name = "imagery-catalog")]
#[command(about = "Build a compact imagery catalog from editor layer index sources")]
#[command(version)]
struct Cli {
    /// Print reports as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Process a source directory into one GeoJSON catalog")]
    Build(BuildArgs),
    #[command(about = "Show what the pipeline decides for individual descriptors")]
    Check(CheckArgs),
    #[command(about = "Print the output schema")]
    Schema,
}

#[derive(Args, Clone)]
struct PipelineArgs {
    #[arg(long)]
    config: Option<String>,

    /// Year used by the imagery age cutoff (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    tolerance: Option<f64>,

    #[arg(long)]
    max_age: Option<i32>,
}

#[derive(Args)]
struct BuildArgs {
    sources: Utf8PathBuf,

    #[arg(short, long, default_value = "imagery.geojson")]
    output: Utf8PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Report broken sources and continue instead of aborting
    #[arg(long)]
    keep_going: bool,

    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Run the pipeline without writing the catalog
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct CheckArgs {
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::SourcesNotFound(_)
        | CatalogError::ConfigRead(_)
        | CatalogError::ConfigParse(_)
        | CatalogError::InvalidConfig(_) => 2,
        CatalogError::Parse { .. }
        | CatalogError::InvalidGeometry { .. }
        | CatalogError::SourceFailures(_) => 3,
        CatalogError::Filesystem(_) | CatalogError::Serialize(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Commands::Build(args) => run_build(args, output_mode),
        Commands::Check(args) => run_check(args, output_mode),
        Commands::Schema => {
            let schema = Schema::imagery();
            match output_mode {
                OutputMode::Json => JsonOutput::print_schema(&schema),
                OutputMode::Human => HumanOutput::print_schema(&schema),
            }
            .into_diagnostic()
        }
    }
}

fn build_pipeline(args: &PipelineArgs) -> Result<Pipeline, CatalogError> {
    let mut config: CatalogConfig = ConfigLoader::resolve(args.config.as_deref())?;
    if let Some(tolerance) = args.tolerance {
        config.simplify_tolerance = tolerance;
    }
    if let Some(max_age) = args.max_age {
        config.max_age_years = max_age;
    }
    config.validate()?;

    let year = args.year.unwrap_or_else(|| chrono::Local::now().year());
    Ok(Pipeline::new(config, Schema::imagery(), year))
}

fn run_build(args: BuildArgs, output_mode: OutputMode) -> miette::Result<()> {
    let pipeline = build_pipeline(&args.pipeline)?;
    let paths = discover_sources(&args.sources)?;
    let options = RunOptions {
        keep_going: args.keep_going,
        jobs: args.jobs.max(1),
    };
    let progress = progress_for(output_mode);

    let report = if args.dry_run {
        let mut sink = MemorySink::default();
        pipeline.run(&paths, &mut sink, &options, progress)?
    } else {
        let mut writer =
            GeoJsonCatalogWriter::create(&args.output, pipeline.config().coordinate_precision)?;
        let report = pipeline.run(&paths, &mut writer, &options, progress)?;
        writer.finish()?;
        report
    };

    print_report(&report, output_mode)?;
    if !report.failed.is_empty() {
        return Err(CatalogError::SourceFailures(report.failed.len()).into());
    }
    Ok(())
}

fn run_check(args: CheckArgs, output_mode: OutputMode) -> miette::Result<()> {
    let pipeline = build_pipeline(&args.pipeline)?;
    let options = RunOptions {
        keep_going: true,
        jobs: 1,
    };
    let mut sink = MemorySink::default();
    let report = pipeline.run(&args.files, &mut sink, &options, progress_for(output_mode))?;
    print_report(&report, output_mode)?;
    if !report.failed.is_empty() {
        return Err(CatalogError::SourceFailures(report.failed.len()).into());
    }
    Ok(())
}

fn progress_for(output_mode: OutputMode) -> &'static dyn ProgressSink {
    match output_mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Human => &LogProgress,
    }
}

fn print_report(report: &RunReport, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => JsonOutput::print_report(report),
        OutputMode::Human => HumanOutput::print_report(report),
    }
    .into_diagnostic()
}
