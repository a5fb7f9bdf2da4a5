// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::angles::DEFAULT_ANGLE_THRESHOLD;
use crate::detector::BackendKind;
use crate::download::DEFAULT_POSE_MODEL;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
    dance-pose-extract extract songs/salsa-01.mp4
    dance-pose-extract extract songs/salsa-01.mp4 --model yolov8s-pose.onnx --output poses/
    dance-pose-extract extract songs/salsa-01.mp4 --imgsz 192 --angle-conf 0.5
    dance-pose-extract batch songs/ --output poses/ --backup
    dance-pose-extract validate poses/
    dance-pose-extract validate poses/salsa-01.json"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract pose data from a single video into a JSON document
    Extract(ExtractArgs),
    /// Process every video in a directory
    Batch(BatchArgs),
    /// Validate pose documents (a file or a whole directory)
    Validate(ValidateArgs),
}

/// Arguments for the extract command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Path to the input video file
    pub video: PathBuf,

    /// Path to the ONNX pose model (auto-downloaded if it is the default)
    #[arg(short, long, default_value = DEFAULT_POSE_MODEL)]
    pub model: PathBuf,

    /// Output directory for JSON documents
    #[arg(short, long, default_value = "poses")]
    pub output: PathBuf,

    /// Detector backend (onnx, stub)
    #[arg(long, default_value_t = BackendKind::Onnx)]
    pub backend: BackendKind,

    /// Square detector input resolution
    #[arg(long, default_value_t = 256)]
    pub imgsz: usize,

    /// Candidate confidence threshold for person detection
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// Keypoint confidence threshold for angle gating
    #[arg(long, default_value_t = DEFAULT_ANGLE_THRESHOLD)]
    pub angle_conf: f32,

    /// Write non-computable angles as null instead of 0.0
    #[arg(long, default_value_t = false)]
    pub nullable_angles: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

/// Arguments for the batch command.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory containing input videos
    pub videos: PathBuf,

    /// Path to the ONNX pose model (auto-downloaded if it is the default)
    #[arg(short, long, default_value = DEFAULT_POSE_MODEL)]
    pub model: PathBuf,

    /// Output directory for JSON documents
    #[arg(short, long, default_value = "poses")]
    pub output: PathBuf,

    /// Detector backend (onnx, stub)
    #[arg(long, default_value_t = BackendKind::Onnx)]
    pub backend: BackendKind,

    /// Square detector input resolution
    #[arg(long, default_value_t = 256)]
    pub imgsz: usize,

    /// Candidate confidence threshold for person detection
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// Keypoint confidence threshold for angle gating
    #[arg(long, default_value_t = DEFAULT_ANGLE_THRESHOLD)]
    pub angle_conf: f32,

    /// Back up existing documents before regenerating them
    #[arg(long, default_value_t = false)]
    pub backup: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document file or directory of documents to validate
    pub path: PathBuf,

    /// Accept null angle values (the nullable export format)
    #[arg(long, default_value_t = false)]
    pub allow_null_angles: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_args_defaults() {
        let args = Cli::parse_from(["app", "extract", "video.mp4"]);
        match args.command {
            Commands::Extract(extract) => {
                assert_eq!(extract.video, PathBuf::from("video.mp4"));
                assert_eq!(extract.model, PathBuf::from(DEFAULT_POSE_MODEL));
                assert_eq!(extract.backend, BackendKind::Onnx);
                assert_eq!(extract.imgsz, 256);
                assert!((extract.conf - 0.25).abs() < f32::EPSILON);
                assert!((extract.angle_conf - 0.3).abs() < f32::EPSILON);
                assert!(!extract.nullable_angles);
                assert!(extract.verbose);
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_batch_args_custom() {
        let args = Cli::parse_from([
            "app", "batch", "songs/", "--output", "out/", "--backend", "stub", "--backup",
            "--angle-conf", "0.5", "--verbose", "false",
        ]);
        match args.command {
            Commands::Batch(batch) => {
                assert_eq!(batch.videos, PathBuf::from("songs/"));
                assert_eq!(batch.output, PathBuf::from("out/"));
                assert_eq!(batch.backend, BackendKind::Stub);
                assert!(batch.backup);
                assert!((batch.angle_conf - 0.5).abs() < f32::EPSILON);
                assert!(!batch.verbose);
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn test_validate_args() {
        let args = Cli::parse_from(["app", "validate", "poses/", "--allow-null-angles"]);
        match args.command {
            Commands::Validate(validate) => {
                assert_eq!(validate.path, PathBuf::from("poses/"));
                assert!(validate.allow_null_angles);
            }
            _ => panic!("expected validate command"),
        }
    }
}
