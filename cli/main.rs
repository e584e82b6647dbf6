#![deny(unused_variables)]
#![deny(unused_imports)]

use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;

use vcf2table::pipeline::{DEFAULT_FEATURE_TABLE, DEFAULT_THREADS};
use vcf2table::update::{UpdateOptions, update_table_with_vcfs};
use vcf2table::{ExtractOptions, TableError, extract_annotations};

#[derive(Parser)]
#[command(
    name = "vcf2table",
    version,
    about = "Flatten snpEff-annotated VCF files into spreadsheet tables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract annotations from a VCF into a spreadsheet
    Extract(ExtractArgs),
    /// Add allele columns from VCF files to an existing spreadsheet
    Update(UpdateArgs),
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the annotated input VCF
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to the output spreadsheet (.xlsx)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Show progress bars
    #[arg(short, long)]
    pub progress: bool,

    /// Number of worker threads (also accepted as -th)
    #[arg(long, default_value_t = DEFAULT_THREADS, value_parser = thread_count)]
    pub threads: usize,

    /// Feature table with symbol, locus_tag and name columns
    #[arg(short, long, default_value = DEFAULT_FEATURE_TABLE)]
    pub feature_table: PathBuf,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// VCF files whose alleles become new columns
    #[arg(short, long, num_args = 1.., required = true)]
    pub vcfs: Vec<PathBuf>,

    /// Existing spreadsheet with a POS column
    #[arg(short, long)]
    pub table: PathBuf,

    /// Path to the output spreadsheet (.xlsx)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Show progress bars
    #[arg(short, long)]
    pub progress: bool,

    /// Number of worker threads (also accepted as -th)
    #[arg(long, default_value_t = DEFAULT_THREADS, value_parser = thread_count)]
    pub threads: usize,
}

/// Options whose next token is their value.
const VALUE_FLAGS: [&str; 11] = [
    "-i",
    "--input",
    "-o",
    "--output",
    "-f",
    "--feature-table",
    "-t",
    "--table",
    "-v",
    "--vcfs",
    "--threads",
];

fn thread_count(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("at least one thread is required".to_string()),
        Ok(threads) => Ok(threads),
        Err(e) => Err(e.to_string()),
    }
}

/// Rewrites the two-letter `-th` flag, which clap cannot express as a short option, to
/// `--threads`. Option values and everything after `--` are passed through untouched.
fn normalize_threads_flag<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut normalized = Vec::new();
    let mut value_expected = false;

    while let Some(arg) = args.next() {
        if value_expected {
            value_expected = false;
            normalized.push(arg);
        } else if arg == "--" {
            normalized.push(arg);
            normalized.extend(args.by_ref());
        } else if arg == "-th" {
            normalized.push(OsString::from("--threads"));
            value_expected = true;
        } else if let Some(value) = arg.to_str().and_then(|a| a.strip_prefix("-th=")) {
            normalized.push(OsString::from(format!("--threads={value}")));
        } else {
            value_expected = arg.to_str().is_some_and(|a| VALUE_FLAGS.contains(&a));
            normalized.push(arg);
        }
    }
    normalized
}

fn main() {
    let cli = Cli::parse_from(normalize_threads_flag(std::env::args_os()));

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let result = match cli.command {
        Commands::Extract(args) => extract(args),
        Commands::Update(args) => update(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn extract(args: ExtractArgs) -> Result<(), TableError> {
    let options = ExtractOptions {
        threads: args.threads,
        show_progress: args.progress,
        feature_table: args.feature_table,
    };
    let rows = extract_annotations(&args.input, &args.output, &options)?;
    eprintln!(
        "> File {} was created successfully ({rows} rows).",
        args.output.display()
    );
    Ok(())
}

fn update(args: UpdateArgs) -> Result<(), TableError> {
    let options = UpdateOptions {
        threads: args.threads,
        show_progress: args.progress,
    };
    let summary = update_table_with_vcfs(&args.vcfs, &args.table, &args.output, &options)?;
    for path in &summary.failed {
        eprintln!("> Skipped {}", path.display());
    }
    eprintln!("> File saved as {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_threads_flag(args.iter().map(OsString::from)))
            .expect("arguments parse")
    }

    #[test]
    fn short_threads_flag_is_accepted() {
        let cli = parse(&["vcf2table", "extract", "-i", "in.vcf", "-o", "out.xlsx", "-th", "8"]);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.threads, 8);
                assert!(!args.progress);
                assert_eq!(args.feature_table, PathBuf::from(DEFAULT_FEATURE_TABLE));
            }
            Commands::Update(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn update_takes_several_vcfs() {
        let cli = parse(&[
            "vcf2table", "update", "-v", "a.vcf", "b.vcf", "-t", "t.xlsx", "-o", "o.xlsx", "-p",
            "-th=2",
        ]);
        match cli.command {
            Commands::Update(args) => {
                assert_eq!(args.vcfs.len(), 2);
                assert_eq!(args.threads, 2);
                assert!(args.progress);
            }
            Commands::Extract(_) => panic!("expected update"),
        }
    }

    #[test]
    fn zero_threads_are_rejected() {
        for threads in [["-th", "0"], ["--threads", "0"]] {
            let mut args = vec!["vcf2table", "extract", "-i", "in.vcf", "-o", "out.xlsx"];
            args.extend(threads);
            let parsed =
                Cli::try_parse_from(normalize_threads_flag(args.iter().map(OsString::from)));
            assert!(parsed.is_err());
        }
    }

    #[test]
    fn option_values_and_trailing_arguments_keep_their_spelling() {
        let normalized: Vec<_> = normalize_threads_flag(
            ["vcf2table", "extract", "-o", "-th", "-th", "3", "--", "-th", "-th=2"]
                .iter()
                .map(OsString::from),
        );
        assert_eq!(
            normalized,
            ["vcf2table", "extract", "-o", "-th", "--threads", "3", "--", "-th", "-th=2"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn threads_default_to_four() {
        let cli = parse(&["vcf2table", "extract", "-i", "in.vcf", "-o", "out.xlsx"]);
        match cli.command {
            Commands::Extract(args) => assert_eq!(args.threads, DEFAULT_THREADS),
            Commands::Update(_) => panic!("expected extract"),
        }
    }
}
