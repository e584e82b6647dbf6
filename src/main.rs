// ========================================================================================
//
//                       THE PREPARE ORCHESTRATOR: PREPARE-VCF
//
// ========================================================================================
//
// Takes a set of bgzipped, tabix-indexed VCF files and produces one annotated VCF:
//
// 1.  **Validation:** every input must be a `.vcf.gz` with a `.tbi` sidecar. Nothing
//     else runs until all inputs pass.
//
// 2.  **Merge:** records are merged in-process on (chromosome, position, reference).
//
// 3.  **Rename & Annotate:** the external rename script and snpEff run back to back
//     on intermediate files in the configured working directory.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use vcf2table::prepare::main::{self as prepare_main, PrepareCommand};
use vcf2table::prepare::{PipelineConfig, PrepareError};

// ========================================================================================
//                         COMMAND-LINE INTERFACE DEFINITION
// ========================================================================================

#[derive(Parser, Debug)]
#[clap(
    name = "prepare-vcf",
    version,
    about = "Merge, rename and annotate compressed VCF files."
)]
struct Args {
    /// Compressed VCF files (.vcf.gz, tabix-indexed) to merge.
    #[arg(short, long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    /// Destination of the annotated VCF.
    #[arg(short, long)]
    output: PathBuf,

    /// TOML file describing the rename and annotation tools.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

// ========================================================================================
//                           THE MAIN ORCHESTRATION LOGIC
// ========================================================================================

fn main() {
    let start_time = Instant::now();
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    eprintln!(
        "\nSuccess! Total execution time: {:.2?}",
        start_time.elapsed()
    );
}

fn run(args: Args) -> Result<(), PrepareError> {
    let config = PipelineConfig::load_or_default(args.config.as_deref())?;
    let command = PrepareCommand {
        inputs: args.input,
        output: args.output,
        config,
    };

    let summary = prepare_main::run(&command)?;
    eprintln!(
        "> Wrote {} after merging {} records into {}.",
        command.output.display(),
        summary.records_read,
        summary.records_written
    );
    Ok(())
}
