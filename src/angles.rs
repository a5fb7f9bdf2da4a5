// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Joint angle computation.
//!
//! Angles are computed over triples of keypoints with the middle point as the
//! joint vertex, gated on keypoint confidence. The result is a set of 8
//! canonical angle names covering 6 distinct geometric triples; the elbow and
//! leg names alias the arm and thigh values for output compatibility with
//! existing consumers.
//!
//! Historically two gating thresholds were in use at once (a strict 0.5 and a
//! lenient 0.3, depending on which detector produced the keypoints). The
//! threshold is therefore an explicit parameter everywhere in this module;
//! [`DEFAULT_ANGLE_THRESHOLD`] picks the lenient value, which keeps wrist
//! angles available on more frames.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::keypoint::{Joint, Keypoint, KeypointSet};

/// Default keypoint confidence threshold for angle gating.
pub const DEFAULT_ANGLE_THRESHOLD: f32 = 0.3;

/// Guard against division by zero when normalizing direction vectors.
const EPSILON: f32 = 1e-6;

/// The 8 canonical joint-angle names.
///
/// `LeftElbow`/`RightElbow` alias `LeftArm`/`RightArm`, and
/// `LeftLeg`/`RightLeg` alias `LeftThigh`/`RightThigh`: the aliased pairs
/// always carry identical values in a produced document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngleName {
    /// leftShoulder-leftElbow-leftWrist.
    LeftArm,
    /// rightShoulder-rightElbow-rightWrist.
    RightArm,
    /// Alias of `LeftArm`.
    LeftElbow,
    /// Alias of `RightArm`.
    RightElbow,
    /// leftHip-leftKnee-leftAnkle.
    LeftThigh,
    /// rightHip-rightKnee-rightAnkle.
    RightThigh,
    /// Alias of `LeftThigh`.
    LeftLeg,
    /// Alias of `RightThigh`.
    RightLeg,
}

impl AngleName {
    /// All 8 angle names in canonical document order.
    pub const ALL: [Self; 8] = [
        Self::LeftArm,
        Self::RightArm,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftThigh,
        Self::RightThigh,
        Self::LeftLeg,
        Self::RightLeg,
    ];

    /// Number of canonical angle names.
    pub const COUNT: usize = 8;

    /// Returns the wire name used as the JSON key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LeftArm => "leftArm",
            Self::RightArm => "rightArm",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftThigh => "leftThigh",
            Self::RightThigh => "rightThigh",
            Self::LeftLeg => "leftLeg",
            Self::RightLeg => "rightLeg",
        }
    }

    /// Returns the index in canonical document order.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AngleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AngleName {
    type Err = AngleNameParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| AngleNameParseError(s.to_string()))
    }
}

/// Error returned when parsing an invalid angle name.
#[derive(Debug, Clone)]
pub struct AngleNameParseError(String);

impl fmt::Display for AngleNameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown angle name '{}'", self.0)
    }
}

impl std::error::Error for AngleNameParseError {}

/// Compute the angle at `p2` formed by the segments to `p1` and `p3`.
///
/// Returns `None` when any of the three points has confidence at or below
/// `threshold`, i.e. the angle is not computable from this detection. The
/// angle itself is the 2D angle in degrees, in [0, 180].
#[must_use]
pub fn try_joint_angle(
    p1: &Keypoint,
    p2: &Keypoint,
    p3: &Keypoint,
    threshold: f32,
) -> Option<f32> {
    if p1.confidence <= threshold || p2.confidence <= threshold || p3.confidence <= threshold {
        return None;
    }

    let v1 = (p1.x - p2.x, p1.y - p2.y);
    let v2 = (p3.x - p2.x, p3.y - p2.y);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let norm1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let norm2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    let cos_angle = dot / (norm1 * norm2 + EPSILON);
    Some(cos_angle.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Legacy projection of [`try_joint_angle`].
///
/// A gated (not computable) angle is flattened to exactly `0.0`, which is
/// the value the legacy document format carries. Note that `0.0` is
/// therefore ambiguous between "not computable" and a genuine zero-degree
/// measurement; prefer [`try_joint_angle`] when the distinction matters.
#[must_use]
pub fn joint_angle(p1: &Keypoint, p2: &Keypoint, p3: &Keypoint, threshold: f32) -> f32 {
    try_joint_angle(p1, p2, p3, threshold).unwrap_or(0.0)
}

/// The 6 distinct (proximal, joint, distal) triples, paired with the angle
/// name they produce. Alias names are filled afterwards.
const TRIPLES: [(AngleName, [Joint; 3]); 4] = [
    (
        AngleName::LeftArm,
        [Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist],
    ),
    (
        AngleName::RightArm,
        [Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist],
    ),
    (
        AngleName::LeftThigh,
        [Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle],
    ),
    (
        AngleName::RightThigh,
        [Joint::RightHip, Joint::RightKnee, Joint::RightAnkle],
    ),
];

/// All 8 canonical angles for one frame.
///
/// Each slot is `None` when the angle was not computable (gated on keypoint
/// confidence). Serialization emits the legacy wire form, writing `0.0` for
/// `None`; see [`crate::document::AngleWire`] for the nullable export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleSet([Option<f32>; AngleName::COUNT]);

impl AngleSet {
    /// Get the angle value for a name, `None` when not computable.
    #[must_use]
    pub fn get(&self, name: AngleName) -> Option<f32> {
        self.0[name.index()]
    }

    /// Set the angle value for a name.
    pub fn set(&mut self, name: AngleName, value: Option<f32>) {
        self.0[name.index()] = value;
    }

    /// Iterate over all angle names and values in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (AngleName, Option<f32>)> + '_ {
        AngleName::ALL.iter().map(move |&a| (a, self.0[a.index()]))
    }

    /// Get the legacy value for a name: gated angles flatten to `0.0`.
    #[must_use]
    pub fn legacy(&self, name: AngleName) -> f32 {
        self.get(name).unwrap_or(0.0)
    }
}

impl Serialize for AngleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(AngleName::COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.as_str(), &value.unwrap_or(0.0))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AngleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = HashMap::<String, Option<f32>>::deserialize(deserializer)?;
        let mut set = Self::default();
        // Non-canonical keys are skipped rather than rejected; strictness is
        // the validator's job, not the loader's.
        for (key, value) in entries {
            if let Ok(name) = key.parse::<AngleName>() {
                set.set(name, value);
            }
        }
        Ok(set)
    }
}

/// Compute all 8 canonical angles from a keypoint set.
///
/// Angles are a pure function of the keypoints and the threshold; the same
/// input always yields the same output. Aliased names are copied from their
/// source value, never recomputed.
#[must_use]
pub fn calculate_angles(keypoints: &KeypointSet, threshold: f32) -> AngleSet {
    let mut angles = AngleSet::default();

    for (name, [proximal, joint, distal]) in TRIPLES {
        let value = try_joint_angle(
            keypoints.get(proximal),
            keypoints.get(joint),
            keypoints.get(distal),
            threshold,
        );
        angles.set(name, value);
    }

    angles.set(AngleName::LeftElbow, angles.get(AngleName::LeftArm));
    angles.set(AngleName::RightElbow, angles.get(AngleName::RightArm));
    angles.set(AngleName::LeftLeg, angles.get(AngleName::LeftThigh));
    angles.set(AngleName::RightLeg, angles.get(AngleName::RightThigh));

    angles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f32, y: f32) -> Keypoint {
        Keypoint::new(x, y, 0.9)
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(&kp(0.0, 0.0), &kp(0.5, 0.0), &kp(0.5, 0.5), 0.5);
        assert!((angle - 90.0).abs() < 1.0, "expected ~90, got {angle}");
    }

    #[test]
    fn test_straight_angle() {
        let angle = joint_angle(&kp(0.0, 0.5), &kp(0.5, 0.5), &kp(1.0, 0.5), 0.5);
        assert!((angle - 180.0).abs() < 1.0, "expected ~180, got {angle}");
    }

    #[test]
    fn test_low_confidence_gates_to_zero() {
        let low = Keypoint::new(0.0, 0.0, 0.3);
        let angle = joint_angle(&low, &kp(0.5, 0.0), &kp(0.5, 0.5), 0.5);
        assert_eq!(angle, 0.0);
        assert_eq!(try_joint_angle(&low, &kp(0.5, 0.0), &kp(0.5, 0.5), 0.5), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // Confidence exactly at the threshold is gated.
        let at = Keypoint::new(0.0, 0.0, 0.5);
        assert_eq!(try_joint_angle(&at, &kp(0.5, 0.0), &kp(0.5, 0.5), 0.5), None);
    }

    #[test]
    fn test_coincident_points_do_not_panic() {
        let p = kp(0.5, 0.5);
        let angle = joint_angle(&p, &p, &p, 0.1);
        assert!((0.0..=180.0).contains(&angle));
    }

    fn full_pose() -> KeypointSet {
        let mut set = KeypointSet::default();
        // Rough upright pose, all joints confidently detected.
        let coords = [
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
        for (joint, (x, y)) in Joint::ALL.into_iter().zip(coords) {
            set.set(joint, Keypoint::new(x, y, 0.9));
        }
        set
    }

    #[test]
    fn test_calculate_angles_all_names_present() {
        let angles = calculate_angles(&full_pose(), 0.5);
        for name in AngleName::ALL {
            let value = angles.get(name).expect("angle should be computable");
            assert!(
                (0.0..=180.0).contains(&value),
                "{name} out of range: {value}"
            );
        }
    }

    #[test]
    fn test_aliases_match_sources() {
        let angles = calculate_angles(&full_pose(), 0.5);
        assert_eq!(angles.get(AngleName::LeftElbow), angles.get(AngleName::LeftArm));
        assert_eq!(angles.get(AngleName::RightElbow), angles.get(AngleName::RightArm));
        assert_eq!(angles.get(AngleName::LeftLeg), angles.get(AngleName::LeftThigh));
        assert_eq!(angles.get(AngleName::RightLeg), angles.get(AngleName::RightThigh));
    }

    #[test]
    fn test_degraded_pose_gates_all_angles() {
        let angles = calculate_angles(&KeypointSet::default(), 0.5);
        for name in AngleName::ALL {
            assert_eq!(angles.get(name), None);
            assert_eq!(angles.legacy(name), 0.0);
        }
    }

    #[test]
    fn test_legacy_serialization_flattens_none() {
        let angles = calculate_angles(&KeypointSet::default(), 0.5);
        let value = serde_json::to_value(&angles).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 8);
        for name in AngleName::ALL {
            assert_eq!(obj[name.as_str()], serde_json::json!(0.0));
        }
    }
}
