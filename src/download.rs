// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Model downloading.
//!
//! Fetches the default pose model from the Ultralytics release assets when
//! the configured model file is not present locally, so a fresh checkout can
//! run without a manual download step.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PoseError, Result};

/// Default pose model file name.
pub const DEFAULT_POSE_MODEL: &str = "yolov8s-pose.onnx";

/// URL for downloading the default pose model.
const DEFAULT_POSE_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.3.0/yolov8s-pose.onnx";

/// Ensure a model file exists, downloading the default model if needed.
///
/// A path that already exists is returned unchanged. A missing path is only
/// auto-downloaded when its file name is the default model; any other
/// missing model is an error, since we don't know where to fetch it from.
///
/// # Errors
///
/// Returns an error if the model is missing and cannot be downloaded.
pub fn ensure_model<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();

    if path.exists() {
        return Ok(path.to_path_buf());
    }

    if path.file_name().is_some_and(|n| n == DEFAULT_POSE_MODEL) {
        println!("Downloading {DEFAULT_POSE_MODEL}...");
        download_file(DEFAULT_POSE_MODEL_URL, path)?;
        println!("✓ Saved {}", path.display());
        return Ok(path.to_path_buf());
    }

    Err(PoseError::ModelLoad(format!(
        "Model file not found: {} (only {DEFAULT_POSE_MODEL} is auto-downloaded)",
        path.display()
    )))
}

/// Download a file to a destination path.
fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = ureq::get(url)
        .call()
        .map_err(|e| PoseError::ModelLoad(format!("Failed to download {url}: {e}")))?
        .into_body();

    let bytes = response
        .read_to_vec()
        .map_err(|e| PoseError::ModelLoad(format!("Failed to read response from {url}: {e}")))?;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(dest, bytes)
        .map_err(|e| PoseError::IoMsg(format!("Failed to write {}: {e}", dest.display())))?;

    Ok(())
}
