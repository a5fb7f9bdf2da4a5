// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Canonical body keypoints.
//!
//! This module defines the 17 COCO joint names used as dictionary keys in
//! every frame of a pose document, together with the [`Keypoint`] value type
//! and the always-fully-populated [`KeypointSet`] container.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The 17 canonical COCO body joints.
///
/// The wire names are camelCase to match the document schema consumed by the
/// mobile trainer app. Variant order is the COCO keypoint order, which is
/// also the order pose models emit keypoints in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    /// Nose tip.
    Nose,
    /// Left eye.
    LeftEye,
    /// Right eye.
    RightEye,
    /// Left ear.
    LeftEar,
    /// Right ear.
    RightEar,
    /// Left shoulder.
    LeftShoulder,
    /// Right shoulder.
    RightShoulder,
    /// Left elbow.
    LeftElbow,
    /// Right elbow.
    RightElbow,
    /// Left wrist.
    LeftWrist,
    /// Right wrist.
    RightWrist,
    /// Left hip.
    LeftHip,
    /// Right hip.
    RightHip,
    /// Left knee.
    LeftKnee,
    /// Right knee.
    RightKnee,
    /// Left ankle.
    LeftAnkle,
    /// Right ankle.
    RightAnkle,
}

impl Joint {
    /// All 17 joints in COCO keypoint order.
    pub const ALL: [Self; 17] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Number of canonical joints.
    pub const COUNT: usize = 17;

    /// Returns the wire name used as the JSON key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "leftEye",
            Self::RightEye => "rightEye",
            Self::LeftEar => "leftEar",
            Self::RightEar => "rightEar",
            Self::LeftShoulder => "leftShoulder",
            Self::RightShoulder => "rightShoulder",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftWrist => "leftWrist",
            Self::RightWrist => "rightWrist",
            Self::LeftHip => "leftHip",
            Self::RightHip => "rightHip",
            Self::LeftKnee => "leftKnee",
            Self::RightKnee => "rightKnee",
            Self::LeftAnkle => "leftAnkle",
            Self::RightAnkle => "rightAnkle",
        }
    }

    /// Returns the joint's index in COCO keypoint order.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Joint {
    type Err = JointParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|j| j.as_str() == s)
            .copied()
            .ok_or_else(|| JointParseError(s.to_string()))
    }
}

/// Error returned when parsing an invalid joint name.
#[derive(Debug, Clone)]
pub struct JointParseError(String);

impl fmt::Display for JointParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown joint name '{}'", self.0)
    }
}

impl std::error::Error for JointParseError {}

/// One detected body keypoint.
///
/// Coordinates are normalized to [0, 1] relative to the original frame
/// dimensions. Confidence is the detector-reported certainty in [0, 1]; a
/// value of 0.0 marks a keypoint that was not usefully detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Horizontal position as a fraction of frame width.
    pub x: f32,
    /// Vertical position as a fraction of frame height.
    pub y: f32,
    /// Detection confidence.
    pub confidence: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }
}

/// A full set of 17 keypoints, one per canonical joint.
///
/// The set is always fully populated: a failed or degenerate detection is
/// represented by zero-coordinate, zero-confidence entries rather than
/// missing keys. `Default` yields exactly that degraded value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointSet([Keypoint; Joint::COUNT]);

impl KeypointSet {
    /// Get the keypoint for a joint.
    #[must_use]
    pub fn get(&self, joint: Joint) -> &Keypoint {
        &self.0[joint.index()]
    }

    /// Set the keypoint for a joint.
    pub fn set(&mut self, joint: Joint, keypoint: Keypoint) {
        self.0[joint.index()] = keypoint;
    }

    /// Iterate over all joints and their keypoints in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, &Keypoint)> {
        Joint::ALL.iter().map(move |&j| (j, &self.0[j.index()]))
    }

    /// Number of keypoints in the set. Always 17.
    #[must_use]
    pub const fn len(&self) -> usize {
        Joint::COUNT
    }

    /// A `KeypointSet` is never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl Serialize for KeypointSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Joint::COUNT))?;
        for (joint, keypoint) in self.iter() {
            map.serialize_entry(joint.as_str(), keypoint)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeypointSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = HashMap::<String, Keypoint>::deserialize(deserializer)?;
        let mut set = Self::default();
        for joint in Joint::ALL {
            let keypoint = entries
                .get(joint.as_str())
                .ok_or_else(|| D::Error::custom(format!("missing keypoint '{joint}'")))?;
            set.set(joint, *keypoint);
        }
        Ok(set)
    }
}
