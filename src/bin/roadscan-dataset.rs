//! Dataset preparation tool for the road damage classifier.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use roadscan::dataset::{
    remove_duplicates, sort_by_csv, split_dataset, SortOptions, SplitOptions,
};

#[derive(Parser, Debug)]
#[command(name = "roadscan-dataset")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every file operation.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete byte-identical images across the class folders of a dataset.
    Dedup {
        /// Directory containing one folder per class.
        dataset: PathBuf,

        /// Report duplicates without deleting them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Move each class folder's images into train and test sets.
    Split {
        /// Directory containing one folder per class.
        source: PathBuf,
        /// Destination for the training images.
        train: PathBuf,
        /// Destination for the test images.
        test: PathBuf,

        /// Fraction of every class that goes to the training set.
        #[arg(long, default_value_t = 0.8)]
        ratio: f64,

        /// Seed for a reproducible shuffle.
        #[arg(long, env = "ROADSCAN_SPLIT_SEED")]
        seed: Option<u64>,
    },

    /// Sort a flat image directory into label folders using a CSV file.
    Sort {
        /// CSV file mapping image ids to labels.
        csv: PathBuf,
        /// Directory holding `<id>.jpg|png|jpeg` files.
        images: PathBuf,
        /// Directory receiving one folder per label.
        output: PathBuf,

        /// Column holding the image id (file name without extension).
        #[arg(long, default_value = "Image ID")]
        image_column: String,

        /// Column holding the label.
        #[arg(long, default_value = "Level")]
        label_column: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "roadscan=debug" } else { "roadscan=info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Dedup { dataset, dry_run } => {
            let report = remove_duplicates(&dataset, dry_run)?;
            if report.duplicates.is_empty() {
                info!(scanned = report.scanned, "no duplicate images found");
            } else {
                for (dup, original) in &report.duplicates {
                    info!(duplicate = %dup.display(), original = %original.display(), "duplicate image");
                }
                info!(
                    scanned = report.scanned,
                    duplicates = report.duplicates.len(),
                    removed = report.removed,
                    "dedup complete"
                );
            }
        }
        Command::Split {
            source,
            train,
            test,
            ratio,
            seed,
        } => {
            let report = split_dataset(&source, &train, &test, &SplitOptions { ratio, seed })?;
            info!(
                classes = report.classes.len(),
                train = report.train_total(),
                test = report.test_total(),
                "split complete"
            );
        }
        Command::Sort {
            csv,
            images,
            output,
            image_column,
            label_column,
        } => {
            let opts = SortOptions {
                image_column,
                label_column,
            };
            let report = sort_by_csv(&csv, &images, &output, &opts)?;
            info!(
                moved = report.moved,
                missing = report.missing.len(),
                "image sorting complete"
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
