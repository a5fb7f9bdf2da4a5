// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The persisted pose document.
//!
//! One [`PoseSequence`] is produced per processed video and written as a
//! single JSON object. The schema is the stable contract consumed by the
//! mobile trainer app: key names never change across detector backends, and
//! backend-specific information is limited to the additive `detector` tag.
//!
//! Documents are written exactly once per run, via a temp file and rename:
//! regeneration replaces a document wholesale, never patches it in place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use crate::angles::AngleSet;
use crate::error::{PoseError, Result};
use crate::keypoint::KeypointSet;

/// How non-computable angles are represented on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AngleWire {
    /// Write `0.0` for a non-computable angle. This is the legacy format
    /// consumed by the mobile app and the default. Note the inherent
    /// ambiguity: `0.0` also means a genuine zero-degree measurement.
    #[default]
    LegacyZero,
    /// Write `null` for a non-computable angle. Opt-in export for consumers
    /// that want the distinction; not accepted by the default validator.
    Nullable,
}

/// One sampled video instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// 0-based frame index, contiguous and strictly increasing.
    pub frame_number: u64,
    /// Seconds from video start: `frame_number / fps`.
    pub timestamp: f64,
    /// All 17 canonical keypoints; zeroed entries on detection failure.
    pub keypoints: KeypointSet,
    /// All 8 canonical joint angles.
    pub angles: AngleSet,
}

/// The full pose document for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseSequence {
    /// The video's base filename, used by the app to pair poses with audio.
    pub song_id: String,
    /// Nominal frame rate of the source video.
    pub fps: f32,
    /// Number of frames actually produced. Authoritative: always equals
    /// `frames.len()`, even when the source's frame-count estimate differed.
    pub total_frames: u64,
    /// Ordered frame records, `frameNumber` ascending from 0 with no gaps.
    pub frames: Vec<Frame>,
    /// Tag of the detector backend that produced the data. Additive
    /// metadata; absent in documents from producers that predate it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector: Option<String>,
}

impl PoseSequence {
    /// Write the document as pretty-printed JSON in the legacy wire format.
    ///
    /// Missing parent directories are created. The document is written to a
    /// temp file first and renamed into place, so a partially written file
    /// never replaces an existing document.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with(path, AngleWire::LegacyZero)
    }

    /// Write the document with an explicit angle wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be written.
    pub fn save_with<P: AsRef<Path>>(&self, path: P, wire: AngleWire) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    PoseError::IoMsg(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let tmp_path = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path).map_err(|e| {
                PoseError::IoMsg(format!("Failed to create {}: {e}", tmp_path.display()))
            })?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &DocumentWire { doc: self, wire })?;
            writer.flush()?;
        }

        fs::rename(&tmp_path, path).map_err(|e| {
            PoseError::IoMsg(format!(
                "Failed to move document into place at {}: {e}",
                path.display()
            ))
        })?;

        Ok(())
    }

    /// Read a document back from disk.
    ///
    /// Accepts both wire formats; legacy `0.0` values are preserved as-is
    /// (they stay ambiguous), `null` values come back as non-computable.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PoseError::IoMsg(format!("Failed to open {}: {e}", path.display())))?;
        let sequence = serde_json::from_reader(BufReader::new(file))?;
        Ok(sequence)
    }
}

/// Serialization wrapper threading the angle wire format through the
/// document tree. Key order is fixed so produced files diff cleanly.
struct DocumentWire<'a> {
    doc: &'a PoseSequence,
    wire: AngleWire,
}

impl Serialize for DocumentWire<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = usize::from(self.doc.detector.is_some());
        let mut map = serializer.serialize_map(Some(4 + extra))?;
        map.serialize_entry("songId", &self.doc.song_id)?;
        map.serialize_entry("fps", &self.doc.fps)?;
        map.serialize_entry("totalFrames", &self.doc.total_frames)?;
        map.serialize_entry(
            "frames",
            &FramesWire {
                frames: &self.doc.frames,
                wire: self.wire,
            },
        )?;
        if let Some(detector) = &self.doc.detector {
            map.serialize_entry("detector", detector)?;
        }
        map.end()
    }
}

struct FramesWire<'a> {
    frames: &'a [Frame],
    wire: AngleWire,
}

impl Serialize for FramesWire<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.frames.len()))?;
        for frame in self.frames {
            seq.serialize_element(&FrameWire {
                frame,
                wire: self.wire,
            })?;
        }
        seq.end()
    }
}

struct FrameWire<'a> {
    frame: &'a Frame,
    wire: AngleWire,
}

impl Serialize for FrameWire<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("frameNumber", &self.frame.frame_number)?;
        map.serialize_entry("timestamp", &self.frame.timestamp)?;
        map.serialize_entry("keypoints", &self.frame.keypoints)?;
        map.serialize_entry(
            "angles",
            &AnglesWire {
                angles: &self.frame.angles,
                wire: self.wire,
            },
        )?;
        map.end()
    }
}

struct AnglesWire<'a> {
    angles: &'a AngleSet,
    wire: AngleWire,
}

impl Serialize for AnglesWire<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.angles.iter() {
            match self.wire {
                AngleWire::LegacyZero => {
                    map.serialize_entry(name.as_str(), &value.unwrap_or(0.0))?;
                }
                AngleWire::Nullable => {
                    map.serialize_entry(name.as_str(), &value)?;
                }
            }
        }
        map.end()
    }
}
