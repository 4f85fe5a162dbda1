use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use docvqa_core::config::{ConfigOverrides, ExtractorProvider, StorageProvider};
use docvqa_evaluation::RunSpec;

mod commands;
mod logging;

use commands::{CommandError, RunArgs};

#[derive(Parser, Debug)]
#[command(
    name = "docvqa",
    about = "Run document extraction pipelines against DocVQA datasets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute the extraction pipeline over a dataset
    Run {
        /// Path to a YAML or JSON configuration file
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Override the dataset path from configuration/environment
        #[arg(long, value_name = "PATH")]
        dataset_path: Option<PathBuf>,

        /// Maximum number of documents to process
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Extraction backend to use
        #[arg(long, value_enum, ignore_case = true)]
        extractor_provider: Option<ExtractorArg>,

        /// Storage backend to use
        #[arg(long, value_enum, ignore_case = true)]
        storage_provider: Option<StorageArg>,

        /// Identifier for this run (default: UTC timestamp)
        #[arg(long, value_name = "ID")]
        run_id: Option<String>,
    },

    /// Compare extraction outputs across providers
    Evaluate {
        /// Labelled run of the form provider=path/to/results.jsonl; repeat for each run
        #[arg(short, long = "run", value_name = "PROVIDER=PATH", required = true)]
        runs: Vec<RunSpec>,
    },

    /// Copy a curated slice of supported documents into a new directory
    Prepare {
        #[arg(long, value_name = "DIR")]
        source: PathBuf,

        #[arg(long, value_name = "DIR")]
        destination: PathBuf,

        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExtractorArg {
    Llm,
    #[value(name = "document_ai")]
    DocumentAi,
}

impl From<ExtractorArg> for ExtractorProvider {
    fn from(arg: ExtractorArg) -> Self {
        match arg {
            ExtractorArg::Llm => ExtractorProvider::Llm,
            ExtractorArg::DocumentAi => ExtractorProvider::DocumentAi,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StorageArg {
    #[value(name = "local_json")]
    LocalJson,
    Neo4j,
}

impl From<StorageArg> for StorageProvider {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::LocalJson => StorageProvider::LocalJson,
            StorageArg::Neo4j => StorageProvider::Neo4j,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Run {
            config,
            dataset_path,
            limit,
            extractor_provider,
            storage_provider,
            run_id,
        } => {
            let overrides = ConfigOverrides {
                dataset_path,
                limit: limit.map(|n| n as usize),
                extractor_provider: extractor_provider.map(Into::into),
                storage_provider: storage_provider.map(Into::into),
            };
            commands::run(RunArgs {
                config,
                overrides,
                run_id,
            })
            .await
        }
        Command::Evaluate { runs } => commands::evaluate(&runs).map(|report| print!("{report}")),
        Command::Prepare {
            source,
            destination,
            limit,
        } => commands::prepare(&source, &destination, limit).map(|copied| {
            println!("Copied {copied} documents to {}", destination.display());
        }),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError { code, error }) => {
            eprintln!("error: {error:#}");
            ExitCode::from(code)
        }
    }
}
