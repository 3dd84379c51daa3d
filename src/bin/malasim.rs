//! Command-line entry point (§6 "EXTERNAL INTERFACES"). Parses arguments,
//! loads the YAML configuration, and drives a [`malasim_core::model::Model`]
//! to completion. The core never touches the filesystem itself; this binary
//! owns every I/O boundary.
use clap::Parser;
use malasim_core::model::Model;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Individual-based simulator of malaria transmission and antimalarial-drug
/// resistance evolution.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration document.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Directory reports are written into. Created if missing.
    #[arg(short = 'o', long = "output", default_value = "out")]
    output_dir: PathBuf,

    /// Name of the reporter to use. Persistence format is the reporter's
    /// concern; the core only ever hands it read-only snapshots.
    #[arg(short = 'r', long = "reporter", default_value = "console")]
    reporter: String,

    /// Identifier used to namespace output files when many jobs share an
    /// output directory.
    #[arg(short = 'j', long = "job", default_value_t = 0)]
    job_number: u32,

    /// Number of independent replicates to run with this configuration.
    #[arg(long = "replicate", default_value_t = 1)]
    replicate: u32,

    /// 0 = info, 1 = debug, 2 = trace.
    #[arg(short = 'v', long = "verbosity", default_value_t = 0)]
    verbosity: u8,

    /// Record individual-level movement events.
    #[arg(long = "im")]
    individual_movement: bool,

    /// Emit monthly case-count reports. Mutually exclusive with `--md`.
    #[arg(long = "mc", conflicts_with = "monthly_density")]
    monthly_cases: bool,

    /// Emit monthly parasite-density reports. Mutually exclusive with `--mc`.
    #[arg(long = "md")]
    monthly_density: bool,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).format_timestamp_millis().init();
}

fn load_config(path: &PathBuf) -> Result<malasim_core::config::Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_yaml::from_str(&text).map_err(|e| format!("cannot parse {}: {e}", path.display()))
}

fn write_replicate_report(
    output_dir: &PathBuf,
    job_number: u32,
    replicate: u32,
    reporter: &str,
    mdc: &malasim_core::mdc::ModelDataCollector,
) -> Result<(), String> {
    fs::create_dir_all(output_dir).map_err(|e| format!("cannot create {}: {e}", output_dir.display()))?;
    let path = output_dir.join(format!("job{job_number}_replicate{replicate}_{reporter}.txt"));
    let mut file = fs::File::create(&path).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    let tally = mdc.genotype_tally();
    writeln!(file, "reporter={reporter} job={job_number} replicate={replicate}").map_err(|e| e.to_string())?;
    writeln!(file, "distinct_genotypes_observed={}", tally.len()).map_err(|e| e.to_string())?;
    Ok(())
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    init_logging(args.verbosity);
    let config = load_config(&args.input)?;

    for replicate in 0..args.replicate {
        log::info!("job {} replicate {}/{} starting", args.job_number, replicate + 1, args.replicate);
        let mut model = Model::initialize(config.clone()).map_err(|e| e.to_string())?;
        model.run().map_err(|e| e.to_string())?;
        let mdc = model.release();
        write_replicate_report(&args.output_dir, args.job_number, replicate, &args.reporter, &mdc)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("malasim: {message}");
            ExitCode::FAILURE
        }
    }
}
