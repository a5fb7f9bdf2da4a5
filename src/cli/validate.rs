// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use crate::cli::args::ValidateArgs;
use crate::validate::Validator;
use crate::{error, info, success};

/// Validate a pose document, or every document in a directory.
///
/// Exits non-zero when any document is invalid, so the command composes in
/// scripts and CI.
pub fn run_validate(args: &ValidateArgs) {
    let validator = Validator::new().with_null_angles(args.allow_null_angles);

    if args.path.is_dir() {
        run_validate_directory(&validator, &args.path);
    } else {
        let report = validator.validate_file(&args.path);
        if report.is_valid() {
            success!("{}: VALID", display_name(&args.path));
        } else {
            print_invalid(&args.path, &report.errors);
            process::exit(1);
        }
    }
}

fn run_validate_directory(validator: &Validator, dir: &Path) {
    let mut documents: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(e) => {
            error!("Cannot read {}: {e}", dir.display());
            process::exit(1);
        }
    };
    documents.sort();

    if documents.is_empty() {
        info!("No JSON files found in {}", dir.display());
        return;
    }

    info!("Validating {} JSON file(s)...", documents.len());
    info!("{}", "=".repeat(60));

    let mut valid_count = 0;
    let mut invalid_count = 0;

    for document in &documents {
        let report = validator.validate_file(document);
        if report.is_valid() {
            success!("{}: VALID", display_name(document));
            valid_count += 1;
        } else {
            print_invalid(document, &report.errors);
            invalid_count += 1;
        }
    }

    info!("");
    info!("{}", "=".repeat(60));
    info!("VALIDATION SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Total files: {}", documents.len());
    info!("Valid: {valid_count}");
    info!("Invalid: {invalid_count}");

    if invalid_count == 0 {
        success!("All files are valid!");
    } else {
        error!("{invalid_count} file(s) have errors");
        process::exit(1);
    }
}

fn print_invalid(path: &Path, errors: &[String]) {
    error!("{}: INVALID", display_name(path));
    for err in errors {
        info!("  - {err}");
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}
