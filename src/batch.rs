// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Batch processing of a video directory.
//!
//! Thin orchestration over the [`SequenceAssembler`]: every video found in a
//! directory is processed to `<output>/<stem>.json`, failures are collected
//! per video, and one failed video never stops the batch.

use std::fs;
use std::path::{Path, PathBuf};

use crate::detector::PoseDetector;
use crate::error::{PoseError, Result};
use crate::sequence::SequenceAssembler;
use crate::source::FrameSource;

/// Video container extensions considered for batch processing.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Per-batch outcome counts.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Number of videos found.
    pub total: usize,
    /// Number of videos processed to a document.
    pub succeeded: usize,
    /// Failed videos as (file name, error description) pairs.
    pub failed: Vec<(String, String)>,
}

/// Collect video files in a directory, sorted by name.
///
/// Non-recursive; only files with a [`VIDEO_EXTENSIONS`] extension match.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn collect_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PoseError::IoMsg(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut videos: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| PoseError::IoMsg(format!("Cannot read {}: {e}", dir.display())))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                VIDEO_EXTENSIONS.contains(&ext.as_str())
            })
        })
        .collect();

    videos.sort();
    Ok(videos)
}

/// Derive the output document path for a video: `<output_dir>/<stem>.json`.
#[must_use]
pub fn document_path(video: &Path, output_dir: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    output_dir.join(format!("{stem}.json"))
}

/// Process every video in `videos_dir` into documents under `output_dir`.
///
/// `on_video` is called before each video with (1-based index, total count,
/// path), so callers can report progress.
///
/// # Errors
///
/// Returns an error only for batch-level failures: the video directory
/// cannot be read or the output directory cannot be created. Per-video
/// failures are recorded in the returned [`BatchSummary`].
pub fn process_directory<D, F>(
    assembler: &mut SequenceAssembler<D>,
    videos_dir: &Path,
    output_dir: &Path,
    mut on_video: F,
) -> Result<BatchSummary>
where
    D: PoseDetector,
    F: FnMut(usize, usize, &Path),
{
    let videos = collect_videos(videos_dir)?;

    fs::create_dir_all(output_dir).map_err(|e| {
        PoseError::IoMsg(format!(
            "Failed to create output directory {}: {e}",
            output_dir.display()
        ))
    })?;

    let mut summary = BatchSummary {
        total: videos.len(),
        ..BatchSummary::default()
    };

    for (i, video) in videos.iter().enumerate() {
        on_video(i + 1, videos.len(), video);

        let name = video
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| video.display().to_string());
        let song_id = video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        let result = FrameSource::open(video).and_then(|mut source| {
            assembler.extract_to_file(
                &mut source,
                &song_id,
                &document_path(video, output_dir),
                &mut |_processed: usize, _estimated: Option<usize>| {},
            )
        });

        match result {
            Ok(_) => summary.succeeded += 1,
            Err(e) => summary.failed.push((name, e.to_string())),
        }
    }

    Ok(summary)
}
