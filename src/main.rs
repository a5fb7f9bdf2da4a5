// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use dance_pose_extract::cli::args::{Cli, Commands};
use dance_pose_extract::cli::{extract, validate};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => extract::run_extract(&args),
        Commands::Batch(args) => extract::run_batch(&args),
        Commands::Validate(args) => validate::run_validate(&args),
    }
}
