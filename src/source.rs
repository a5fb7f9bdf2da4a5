// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Video frame source.
//!
//! A [`FrameSource`] opens a stored video and yields its frames lazily in
//! decode order. It reports the container's frame rate and an *estimated*
//! total frame count; some containers misreport their length, so only the
//! count of frames actually yielded is authoritative.

use std::path::{Path, PathBuf};
use std::sync::Once;

use image::DynamicImage;

use crate::error::{PoseError, Result};

static INIT: Once = Once::new();

/// Initialize the video backend once per process.
fn init_video() {
    INIT.call_once(|| {
        if let Err(e) = video_rs::init() {
            eprintln!("Failed to initialize video backend: {e}");
        }
    });
}

/// Lazy, forward-only frame supplier for one stored video.
pub struct FrameSource {
    decoder: video_rs::decode::Decoder,
    fps: f32,
    estimated_frames: Option<usize>,
    path: PathBuf,
}

impl FrameSource {
    /// Open a video file for decoding.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::VideoOpen`] if the container cannot be opened or
    /// decoded at all, or if it reports a non-positive frame rate.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        init_video();

        let path = path.as_ref();
        let decoder = video_rs::decode::Decoder::new(path).map_err(|e| {
            PoseError::VideoOpen(format!("Could not open video {}: {e}", path.display()))
        })?;

        let fps = decoder.frame_rate();
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PoseError::VideoOpen(format!(
                "Video {} reports invalid frame rate {fps}",
                path.display()
            )));
        }

        // Frame count estimated from duration; containers can misreport
        // either, so consumers must treat this as a hint only.
        let estimated_frames = decoder.duration().ok().map(|duration| {
            let seconds = duration.as_secs_f64();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                (seconds * f64::from(fps)) as usize
            }
        });

        Ok(Self {
            decoder,
            fps,
            estimated_frames,
            path: path.to_path_buf(),
        })
    }

    /// Nominal frame rate reported by the container.
    #[must_use]
    pub const fn fps(&self) -> f32 {
        self.fps
    }

    /// Estimated total frame count, if the container reports a duration.
    ///
    /// The actual stream may end before (or after) this estimate.
    #[must_use]
    pub const fn estimated_frames(&self) -> Option<usize> {
        self.estimated_frames
    }

    /// Path of the opened video.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for FrameSource {
    type Item = DynamicImage;

    /// Decode the next frame.
    ///
    /// Ends silently (returns `None`) when the underlying stream is
    /// exhausted, including before the estimated frame count is reached.
    fn next(&mut self) -> Option<Self::Item> {
        match self.decoder.decode() {
            Ok((_ts, frame)) => frame_to_image(&frame),
            // The decoder reports end-of-stream as an error; treat any
            // decode failure as exhaustion rather than aborting the run.
            Err(_) => None,
        }
    }
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("path", &self.path)
            .field("fps", &self.fps)
            .field("estimated_frames", &self.estimated_frames)
            .finish()
    }
}

/// Convert a decoded HWC frame array to a `DynamicImage`.
fn frame_to_image(frame: &video_rs::Frame) -> Option<DynamicImage> {
    let shape = frame.shape();
    let height = u32::try_from(shape[0]).ok()?;
    let width = u32::try_from(shape[1]).ok()?;

    let mut rgb_data = Vec::with_capacity((height * width * 3) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            rgb_data.push(frame[[y, x, 0]]);
            rgb_data.push(frame[[y, x, 1]]);
            rgb_data.push(frame[[y, x, 2]]);
        }
    }

    image::RgbImage::from_raw(width, height, rgb_data).map(DynamicImage::ImageRgb8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_fatal() {
        let result = FrameSource::open("definitely-not-a-video.mp4");
        assert!(matches!(result, Err(PoseError::VideoOpen(_))));
    }
}
