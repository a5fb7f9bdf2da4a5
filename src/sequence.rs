// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Sequence assembly.
//!
//! The [`SequenceAssembler`] drives the pipeline: frames are pulled from a
//! source one at a time, run through the detector and the angle calculator,
//! and appended as [`Frame`] records in strict decode order. At stream
//! exhaustion the assembled [`PoseSequence`] carries the actual processed
//! count, which overrides whatever the source estimated.

use std::path::Path;

use image::DynamicImage;

use crate::angles::{calculate_angles, DEFAULT_ANGLE_THRESHOLD};
use crate::detector::PoseDetector;
use crate::document::{AngleWire, Frame, PoseSequence};
use crate::error::Result;
use crate::source::FrameSource;

/// Configuration for sequence assembly.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Keypoint confidence threshold passed to the angle calculator.
    pub angle_threshold: f32,
    /// Invoke the progress observer every this many frames.
    pub progress_interval: usize,
    /// Wire format used when persisting the document.
    pub wire: AngleWire,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            angle_threshold: DEFAULT_ANGLE_THRESHOLD,
            progress_interval: 10,
            wire: AngleWire::LegacyZero,
        }
    }
}

impl AssemblerConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the angle gating threshold.
    #[must_use]
    pub const fn with_angle_threshold(mut self, threshold: f32) -> Self {
        self.angle_threshold = threshold;
        self
    }

    /// Set the progress notification cadence (in frames).
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the angle wire format for persisted documents.
    #[must_use]
    pub const fn with_wire(mut self, wire: AngleWire) -> Self {
        self.wire = wire;
        self
    }
}

/// Observer notified periodically while a sequence is assembled.
///
/// Purely informational: observers cannot pause or cancel the run, and the
/// estimated total they receive is the source's hint, not a promise. The
/// observer fires every [`AssemblerConfig::progress_interval`] frames and
/// once more after the final frame.
pub trait ProgressObserver {
    /// Called with the number of frames processed so far and the source's
    /// estimated total, if known.
    fn on_progress(&mut self, processed: usize, estimated_total: Option<usize>);
}

impl<F: FnMut(usize, Option<usize>)> ProgressObserver for F {
    fn on_progress(&mut self, processed: usize, estimated_total: Option<usize>) {
        self(processed, estimated_total);
    }
}

/// Observer that ignores all notifications.
struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _processed: usize, _estimated_total: Option<usize>) {}
}

/// Drives frame decoding, detection and angle computation into an ordered
/// pose document.
pub struct SequenceAssembler<D> {
    detector: D,
    config: AssemblerConfig,
}

impl<D: PoseDetector> SequenceAssembler<D> {
    /// Create an assembler with default configuration.
    pub fn new(detector: D) -> Self {
        Self::with_config(detector, AssemblerConfig::default())
    }

    /// Create an assembler with custom configuration.
    pub fn with_config(detector: D, config: AssemblerConfig) -> Self {
        Self { detector, config }
    }

    /// Get the assembler configuration.
    #[must_use]
    pub const fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Process a video end to end.
    ///
    /// Never fails once the source is open: per-frame detection failures
    /// produce degraded frames (zeroed keypoints, gated angles) and the run
    /// continues. An exhausted source ends the pass normally, even when the
    /// source's frame-count estimate promised more.
    pub fn extract(&mut self, source: &mut FrameSource, song_id: &str) -> PoseSequence {
        self.extract_with_progress(source, song_id, &mut NoProgress)
    }

    /// Process a video end to end with progress notifications.
    pub fn extract_with_progress(
        &mut self,
        source: &mut FrameSource,
        song_id: &str,
        observer: &mut dyn ProgressObserver,
    ) -> PoseSequence {
        let fps = source.fps();
        let estimated = source.estimated_frames();
        self.extract_frames(source, fps, estimated, song_id, observer)
    }

    /// Process an arbitrary frame stream.
    ///
    /// This is the core loop; [`Self::extract`] wires it to a video file.
    /// Frames are numbered 0, 1, 2, … in the order the iterator yields
    /// them, and each frame's timestamp is `frame_number / fps`.
    pub fn extract_frames<I>(
        &mut self,
        frames: I,
        fps: f32,
        estimated_total: Option<usize>,
        song_id: &str,
        observer: &mut dyn ProgressObserver,
    ) -> PoseSequence
    where
        I: IntoIterator<Item = DynamicImage>,
    {
        let mut records = Vec::with_capacity(estimated_total.unwrap_or(0));
        let interval = self.config.progress_interval.max(1);

        for (frame_number, frame) in frames.into_iter().enumerate() {
            let keypoints = self.detector.detect(&frame);
            let angles = calculate_angles(&keypoints, self.config.angle_threshold);

            #[allow(clippy::cast_precision_loss)]
            let timestamp = frame_number as f64 / f64::from(fps);

            records.push(Frame {
                frame_number: frame_number as u64,
                timestamp,
                keypoints,
                angles,
            });

            if records.len() % interval == 0 {
                observer.on_progress(records.len(), estimated_total);
            }
        }

        // Final notification, unless the loop just fired one at this count.
        if records.len() % interval != 0 {
            observer.on_progress(records.len(), estimated_total);
        }

        PoseSequence {
            song_id: song_id.to_string(),
            fps,
            total_frames: records.len() as u64,
            frames: records,
            detector: Some(self.detector.name().to_string()),
        }
    }

    /// Process a video end to end and persist the document.
    ///
    /// # Errors
    ///
    /// Returns an error only for the final write: the output directory
    /// cannot be created or the file cannot be written.
    pub fn extract_to_file(
        &mut self,
        source: &mut FrameSource,
        song_id: &str,
        output: &Path,
        observer: &mut dyn ProgressObserver,
    ) -> Result<PoseSequence> {
        let sequence = self.extract_with_progress(source, song_id, observer);
        sequence.save_with(output, self.config.wire)?;
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::StubDetector;
    use crate::keypoint::KeypointSet;

    fn frames(n: usize) -> Vec<DynamicImage> {
        (0..n).map(|_| DynamicImage::new_rgb8(64, 48)).collect()
    }

    #[test]
    fn test_frames_are_contiguous_from_zero() {
        let mut assembler = SequenceAssembler::new(StubDetector::new());
        let sequence =
            assembler.extract_frames(frames(5), 25.0, Some(5), "song", &mut NoProgress);

        assert_eq!(sequence.total_frames, 5);
        assert_eq!(sequence.frames.len(), 5);
        for (i, frame) in sequence.frames.iter().enumerate() {
            assert_eq!(frame.frame_number, i as u64);
            assert!((frame.timestamp - i as f64 / 25.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_actual_count_overrides_estimate() {
        let mut assembler = SequenceAssembler::new(StubDetector::new());
        // The source claimed 100 frames but only yields 3.
        let sequence =
            assembler.extract_frames(frames(3), 30.0, Some(100), "song", &mut NoProgress);
        assert_eq!(sequence.total_frames, 3);
    }

    #[test]
    fn test_empty_stream_yields_empty_document() {
        let mut assembler = SequenceAssembler::new(StubDetector::new());
        let sequence =
            assembler.extract_frames(frames(0), 30.0, Some(0), "song", &mut NoProgress);
        assert_eq!(sequence.total_frames, 0);
        assert!(sequence.frames.is_empty());
    }

    #[test]
    fn test_degraded_detector_still_appends_frames() {
        // A detector that always fails yields zeroed keypoint sets; every
        // frame must still be counted.
        let detector = StubDetector::with_keypoints(KeypointSet::default());
        let mut assembler = SequenceAssembler::new(detector);
        let sequence =
            assembler.extract_frames(frames(4), 30.0, None, "song", &mut NoProgress);

        assert_eq!(sequence.total_frames, 4);
        for frame in &sequence.frames {
            for (_, kp) in frame.keypoints.iter() {
                assert_eq!(kp.confidence, 0.0);
            }
            for (_, angle) in frame.angles.iter() {
                assert_eq!(angle, None);
            }
        }
    }

    #[test]
    fn test_progress_cadence() {
        let config = AssemblerConfig::new().with_progress_interval(2);
        let mut assembler = SequenceAssembler::with_config(StubDetector::new(), config);

        let mut calls: Vec<usize> = Vec::new();
        let mut observer = |processed: usize, _estimated: Option<usize>| {
            calls.push(processed);
        };
        assembler.extract_frames(frames(5), 30.0, Some(5), "song", &mut observer);

        // Every 2nd frame, plus the final notification.
        assert_eq!(calls, vec![2, 4, 5]);
    }

    #[test]
    fn test_detector_tag_recorded() {
        let mut assembler = SequenceAssembler::new(StubDetector::new());
        let sequence =
            assembler.extract_frames(frames(1), 30.0, None, "song", &mut NoProgress);
        assert_eq!(sequence.detector.as_deref(), Some("stub"));
    }
}
