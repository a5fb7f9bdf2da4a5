// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX pose model loading and inference.
//!
//! This module provides the [`OnnxPoseDetector`], which wraps an ONNX
//! Runtime session around an exported pose model and conforms it to the
//! [`PoseDetector`] contract.

use std::path::Path;

use image::DynamicImage;
use ort::session::Session;
use ort::value::TensorRef;

use crate::detector::PoseDetector;
use crate::error::{PoseError, Result};
use crate::keypoint::KeypointSet;
use crate::postprocessing::decode_pose_output;
use crate::preprocessing::preprocess_frame;

/// Configuration for the ONNX pose detector.
///
/// # Example
///
/// ```rust
/// use dance_pose_extract::model::DetectorConfig;
///
/// let config = DetectorConfig::new().with_imgsz(192).with_confidence(0.5);
/// ```
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Square input resolution the frame is letterboxed into. Model
    /// variants in the wild use 192 or 256.
    pub imgsz: usize,
    /// Minimum person score for a candidate to be considered at all.
    /// Frames where no candidate reaches this yield a zeroed keypoint set.
    pub confidence_threshold: f32,
    /// Number of intra-op threads for ONNX Runtime. `0` lets the runtime
    /// choose.
    pub num_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            imgsz: 256,
            confidence_threshold: 0.25,
            num_threads: 0,
        }
    }
}

impl DetectorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the square input resolution.
    #[must_use]
    pub const fn with_imgsz(mut self, imgsz: usize) -> Self {
        self.imgsz = imgsz;
        self
    }

    /// Set the candidate confidence threshold.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the number of intra-op threads. `0` for auto-configuration.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }
}

/// Pose detector backed by an ONNX Runtime session.
///
/// Loading is fatal on failure; a run never starts without a working model.
/// Per-frame inference failures are absorbed and reported as a zeroed
/// keypoint set, per the [`PoseDetector`] contract.
pub struct OnnxPoseDetector {
    /// ONNX Runtime session. Read-only after load; shared across all
    /// `detect` calls of a run.
    session: Session,
    /// Input tensor name.
    input_name: String,
    /// Output tensor name.
    output_name: String,
    /// Detector configuration.
    config: DetectorConfig,
    /// Backend tag (model file stem) recorded in produced documents.
    name: String,
}

impl OnnxPoseDetector {
    /// Load a pose model from an ONNX file with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, DetectorConfig::default())
    }

    /// Load a pose model with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: DetectorConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PoseError::ModelLoad(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| PoseError::ModelLoad(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| PoseError::ModelLoad(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(config.num_threads)
            .map_err(|e| PoseError::ModelLoad(format!("Failed to set intra-thread count: {e}")))?
            .commit_from_file(path)
            .map_err(|e| PoseError::ModelLoad(format!("Failed to load model: {e}")))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output0".to_string());

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "onnx".to_string());

        Ok(Self {
            session,
            input_name,
            output_name,
            config,
            name,
        })
    }

    /// Get the detector configuration.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run one frame through the model, propagating failures.
    fn try_detect(&mut self, frame: &DynamicImage) -> Result<KeypointSet> {
        let preprocess = preprocess_frame(frame, self.config.imgsz)?;
        let (output, shape) = self.run_inference(&preprocess.tensor)?;
        Ok(decode_pose_output(
            &output,
            &shape,
            &preprocess,
            self.config.confidence_threshold,
        ))
    }

    /// Run the ONNX session on a preprocessed tensor.
    fn run_inference(&mut self, input: &ndarray::Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input_contiguous = input.as_standard_layout();

        let input_tensor = TensorRef::from_array_view(&input_contiguous)
            .map_err(|e| PoseError::Inference(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![&self.input_name => input_tensor];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| PoseError::Inference(format!("Inference failed: {e}")))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| {
                PoseError::Inference(format!("Output '{}' not found", self.output_name))
            })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PoseError::Inference(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let shape_vec: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        Ok((data.to_vec(), shape_vec))
    }
}

impl PoseDetector for OnnxPoseDetector {
    fn detect(&mut self, frame: &DynamicImage) -> KeypointSet {
        match self.try_detect(frame) {
            Ok(keypoints) => keypoints,
            Err(e) => {
                eprintln!("WARNING ⚠️ pose inference failed on frame: {e}");
                KeypointSet::default()
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for OnnxPoseDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPoseDetector")
            .field("name", &self.name)
            .field("imgsz", &self.config.imgsz)
            .field("confidence_threshold", &self.config.confidence_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let result = OnnxPoseDetector::load("nonexistent.onnx");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), PoseError::ModelLoad(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = DetectorConfig::new()
            .with_imgsz(192)
            .with_confidence(0.5)
            .with_threads(4);

        assert_eq!(config.imgsz, 192);
        assert!((config.confidence_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.num_threads, 4);
    }
}
