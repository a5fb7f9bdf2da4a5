// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Structural validation of persisted pose documents.
//!
//! The validator is the consumer-side guard of the document schema. It only
//! reports problems, it never repairs them, and it scans the whole document
//! instead of stopping at the first error so callers can assert on the full
//! set of findings.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::angles::AngleName;
use crate::keypoint::Joint;

/// Outcome of validating one document.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Every problem found, as human-readable descriptions.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Whether the document passed all checks.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(message: String) -> Self {
        Self {
            errors: vec![message],
        }
    }
}

/// Structural/semantic checker for pose documents.
///
/// Accepts a document with `totalFrames == 0` and an empty `frames` array:
/// a zero-length video legitimately produces an empty document. (Earlier
/// tooling required a positive frame count; that rule rejected a valid
/// boundary case and is deliberately relaxed here.)
#[derive(Debug, Clone, Default)]
pub struct Validator {
    allow_null_angles: bool,
}

impl Validator {
    /// Create a validator for the legacy wire format.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `null` angle values (the nullable export format).
    #[must_use]
    pub const fn with_null_angles(mut self, allow: bool) -> Self {
        self.allow_null_angles = allow;
        self
    }

    /// Validate a document file.
    ///
    /// An unreadable or unparsable file yields an invalid report with a
    /// single descriptive error rather than an `Err`: the caller decides
    /// severity for validation findings.
    #[must_use]
    pub fn validate_file<P: AsRef<Path>>(&self, path: P) -> ValidationReport {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                return ValidationReport::fail(format!("Cannot read {}: {e}", path.display()));
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => self.validate_value(&value),
            Err(e) => ValidationReport::fail(format!("Invalid JSON: {e}")),
        }
    }

    /// Validate a parsed document.
    #[must_use]
    pub fn validate_value(&self, doc: &Value) -> ValidationReport {
        let mut errors = Vec::new();

        let Some(obj) = doc.as_object() else {
            return ValidationReport::fail("document must be a JSON object".to_string());
        };

        // Required top-level fields.
        let mut missing = false;
        for field in ["songId", "fps", "totalFrames", "frames"] {
            if !obj.contains_key(field) {
                errors.push(format!("missing required field: {field}"));
                missing = true;
            }
        }
        if missing {
            return ValidationReport { errors };
        }

        if !obj["songId"].is_string() {
            errors.push("songId must be a string".to_string());
        }

        match obj["fps"].as_f64() {
            Some(fps) if fps > 0.0 => {}
            _ => errors.push("fps must be a positive number".to_string()),
        }

        let total_frames = obj["totalFrames"].as_u64();
        if total_frames.is_none() {
            errors.push("totalFrames must be a non-negative integer".to_string());
        }

        match obj["frames"].as_array() {
            None => errors.push("frames must be an array".to_string()),
            Some(frames) => {
                if let Some(total) = total_frames {
                    if frames.len() as u64 != total {
                        errors.push(format!(
                            "frames array length ({}) doesn't match totalFrames ({total})",
                            frames.len()
                        ));
                    }
                }

                // Sample the first and last frames for structural checks.
                let mut sample: Vec<usize> = Vec::new();
                if !frames.is_empty() {
                    sample.push(0);
                    if frames.len() > 1 {
                        sample.push(frames.len() - 1);
                    }
                }
                for index in sample {
                    self.validate_frame(index, &frames[index], &mut errors);
                }
            }
        }

        ValidationReport { errors }
    }

    fn validate_frame(&self, index: usize, frame: &Value, errors: &mut Vec<String>) {
        let Some(obj) = frame.as_object() else {
            errors.push(format!("frame {index} must be an object"));
            return;
        };

        for field in ["frameNumber", "timestamp", "keypoints", "angles"] {
            if !obj.contains_key(field) {
                errors.push(format!("frame {index} missing required field: {field}"));
            }
        }

        if let Some(number) = obj.get("frameNumber") {
            match number.as_u64() {
                Some(n) if n == index as u64 => {}
                Some(n) => errors.push(format!(
                    "frame {index} frameNumber ({n}) doesn't match its position"
                )),
                None => errors.push(format!("frame {index} frameNumber must be an integer")),
            }
        }

        if let Some(keypoints) = obj.get("keypoints") {
            match keypoints.as_object() {
                None => errors.push(format!("frame {index} keypoints must be an object")),
                Some(map) => {
                    for joint in Joint::ALL {
                        match map.get(joint.as_str()) {
                            None => errors
                                .push(format!("frame {index} keypoints missing {joint}")),
                            Some(kp) => {
                                let complete = ["x", "y", "confidence"]
                                    .iter()
                                    .all(|k| kp.get(k).is_some_and(Value::is_number));
                                if !complete {
                                    errors.push(format!(
                                        "keypoint {joint} missing x, y, or confidence"
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }

        if let Some(angles) = obj.get("angles") {
            match angles.as_object() {
                None => errors.push(format!("frame {index} angles must be an object")),
                Some(map) => {
                    for name in AngleName::ALL {
                        let Some(value) = map.get(name.as_str()) else {
                            continue;
                        };
                        if value.is_null() {
                            if !self.allow_null_angles {
                                errors.push(format!("angle {name} must be a number"));
                            }
                            continue;
                        }
                        match value.as_f64() {
                            None => errors.push(format!("angle {name} must be a number")),
                            Some(v) if !(0.0..=180.0).contains(&v) => {
                                errors.push(format!("angle {name} out of range (0-180): {v}"));
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }
    }
}
