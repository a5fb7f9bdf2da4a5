// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Dance Pose Extraction Library
//!
//! Converts dance reference videos into per-frame skeletal descriptions for
//! a mobile trainer app: for every frame, 17 named COCO body keypoints
//! (position + confidence) and a set of derived joint angles, persisted as
//! one JSON document per video.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use dance_pose_extract::{FrameSource, OnnxPoseDetector, SequenceAssembler};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let detector = OnnxPoseDetector::load("yolov8s-pose.onnx")?;
//!     let mut assembler = SequenceAssembler::new(detector);
//!
//!     let mut source = FrameSource::open("songs/salsa-01.mp4")?;
//!     let sequence = assembler.extract(&mut source, "salsa-01");
//!
//!     println!("Processed {} frames at {} fps", sequence.total_frames, sequence.fps);
//!     sequence.save("poses/salsa-01.json")?;
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Extract poses from one video (model auto-downloads if missing)
//! dance-pose-extract extract songs/salsa-01.mp4 --output poses/
//!
//! # Process a whole directory, backing up previous documents
//! dance-pose-extract batch songs/ --output poses/ --backup
//!
//! # Validate generated documents
//! dance-pose-extract validate poses/
//! ```
//!
//! ## Pipeline
//!
//! Data flows one way through the pipeline, one frame at a time:
//!
//! ```text
//! FrameSource -> PoseDetector -> calculate_angles -> SequenceAssembler -> JSON document
//! ```
//!
//! The produced document is validated independently by [`Validator`], the
//! consumer-side schema guard. Per-frame detection failures degrade the
//! frame (zeroed keypoints, gated angles) but never abort a run; only
//! model load, video open and document write failures are fatal.
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`keypoint`] | Canonical joints ([`Joint`], [`Keypoint`], [`KeypointSet`]) |
//! | [`angles`] | Joint angle computation ([`calculate_angles`], [`AngleSet`]) |
//! | [`detector`] | Detector abstraction ([`PoseDetector`], [`StubDetector`]) |
//! | [`model`] | ONNX detector backend ([`OnnxPoseDetector`]) |
//! | [`source`] | Video frame supply ([`FrameSource`]) |
//! | [`sequence`] | Pipeline driver ([`SequenceAssembler`]) |
//! | [`document`] | Persisted document ([`PoseSequence`], [`Frame`]) |
//! | [`validate`] | Document schema checks ([`Validator`]) |
//! | [`batch`] | Directory orchestration |
//! | [`backup`] | Backup-then-replace of existing documents |
//! | [`download`] | Default model fetching |
//! | [`error`] | Error types ([`PoseError`], [`Result`]) |

// Modules
pub mod angles;
pub mod backup;
pub mod batch;
pub mod cli;
pub mod detector;
pub mod document;
pub mod download;
pub mod error;
pub mod keypoint;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;
pub mod sequence;
pub mod source;
pub mod validate;

// Re-export main types for convenience
pub use angles::{calculate_angles, joint_angle, try_joint_angle, AngleName, AngleSet};
pub use detector::{BackendKind, PoseDetector, StubDetector};
pub use document::{AngleWire, Frame, PoseSequence};
pub use error::{PoseError, Result};
pub use keypoint::{Joint, Keypoint, KeypointSet};
pub use model::{DetectorConfig, OnnxPoseDetector};
pub use sequence::{AssemblerConfig, ProgressObserver, SequenceAssembler};
pub use source::FrameSource;
pub use validate::{ValidationReport, Validator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // Version should be semver format like "0.1.0"
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "dance-pose-extract");
    }
}
