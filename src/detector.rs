// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose detector abstraction.
//!
//! A detector maps one raw frame to a full set of 17 keypoints. Concrete
//! backends differ in model and input resolution but share the same output
//! contract, so the rest of the pipeline (and the document schema) is
//! independent of which backend produced the data.

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;

use crate::keypoint::{Joint, Keypoint, KeypointSet};

/// A pose detector backend.
///
/// `detect` is infallible by contract: a backend that fails on a single
/// frame (malformed frame, no candidates, inference error) returns the
/// zeroed [`KeypointSet`] instead of erroring, so one bad frame can never
/// abort a run. Only backend construction is allowed to fail.
///
/// Detectors hold their loaded model as read-only state for the duration of
/// a run; `&mut self` exists only because inference runtimes require it.
pub trait PoseDetector {
    /// Detect the 17 canonical keypoints in a frame.
    ///
    /// Coordinates are normalized to [0, 1] relative to the original frame
    /// dimensions, confidence is in [0, 1].
    fn detect(&mut self, frame: &DynamicImage) -> KeypointSet;

    /// Backend tag recorded in produced documents (e.g. "yolov8s-pose").
    fn name(&self) -> &str;
}

impl<D: PoseDetector + ?Sized> PoseDetector for Box<D> {
    fn detect(&mut self, frame: &DynamicImage) -> KeypointSet {
        (**self).detect(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Selectable detector backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// ONNX pose model via [`crate::model::OnnxPoseDetector`].
    Onnx,
    /// Deterministic stub pose via [`StubDetector`].
    Stub,
}

impl BackendKind {
    /// Returns the string representation used in CLI arguments.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Stub => "stub",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BackendParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "stub" => Ok(Self::Stub),
            _ => Err(BackendParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid backend name.
#[derive(Debug, Clone)]
pub struct BackendParseError(String);

impl fmt::Display for BackendParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid backend '{}', expected one of: onnx, stub", self.0)
    }
}

impl std::error::Error for BackendParseError {}

/// Stub detector returning a fixed upright pose for every frame.
///
/// Useful for tests and dry runs: the pipeline, document writer and
/// validator can all be exercised without a model file or a real video.
#[derive(Debug, Clone)]
pub struct StubDetector {
    keypoints: KeypointSet,
}

/// Fixed upright reference pose (x, y) per joint, in COCO order.
const STUB_POSE: [(f32, f32); Joint::COUNT] = [
    (0.50, 0.10), // nose
    (0.48, 0.08), // leftEye
    (0.52, 0.08), // rightEye
    (0.46, 0.09), // leftEar
    (0.54, 0.09), // rightEar
    (0.40, 0.25), // leftShoulder
    (0.60, 0.25), // rightShoulder
    (0.35, 0.40), // leftElbow
    (0.65, 0.40), // rightElbow
    (0.33, 0.55), // leftWrist
    (0.67, 0.55), // rightWrist
    (0.43, 0.55), // leftHip
    (0.57, 0.55), // rightHip
    (0.42, 0.75), // leftKnee
    (0.58, 0.75), // rightKnee
    (0.41, 0.95), // leftAnkle
    (0.59, 0.95), // rightAnkle
];

impl StubDetector {
    /// Create a stub detector emitting the fixed reference pose with 0.9
    /// confidence on every joint.
    #[must_use]
    pub fn new() -> Self {
        let mut keypoints = KeypointSet::default();
        for (joint, (x, y)) in Joint::ALL.into_iter().zip(STUB_POSE) {
            keypoints.set(joint, Keypoint::new(x, y, 0.9));
        }
        Self { keypoints }
    }

    /// Create a stub detector emitting a caller-provided pose.
    #[must_use]
    pub const fn with_keypoints(keypoints: KeypointSet) -> Self {
        Self { keypoints }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseDetector for StubDetector {
    fn detect(&mut self, _frame: &DynamicImage) -> KeypointSet {
        self.keypoints.clone()
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("onnx".parse::<BackendKind>().unwrap(), BackendKind::Onnx);
        assert_eq!("Stub".parse::<BackendKind>().unwrap(), BackendKind::Stub);
        assert!("tflite".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_stub_detect_is_deterministic() {
        let mut detector = StubDetector::new();
        let frame = DynamicImage::new_rgb8(64, 64);
        let first = detector.detect(&frame);
        let second = detector.detect(&frame);
        assert_eq!(first, second);
        assert_eq!(detector.name(), "stub");
    }

    #[test]
    fn test_stub_pose_in_unit_range() {
        let mut detector = StubDetector::new();
        let set = detector.detect(&DynamicImage::new_rgb8(8, 8));
        for (_, kp) in set.iter() {
            assert!((0.0..=1.0).contains(&kp.x));
            assert!((0.0..=1.0).contains(&kp.y));
            assert!((kp.confidence - 0.9).abs() < f32::EPSILON);
        }
    }
}
