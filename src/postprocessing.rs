// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Decoding of raw pose model output.
//!
//! Pose models emit a prediction grid where each candidate carries a bounding
//! box, a person score, and 17 keypoint triples (x, y, confidence) in model
//! input space. This module selects the single best candidate per frame and
//! maps its keypoints back into normalized original-frame coordinates.

use ndarray::{s, Array2};

use crate::keypoint::{Joint, Keypoint, KeypointSet};
use crate::preprocessing::{unletterbox_point, PreprocessResult};

/// Values per keypoint in the model output: x, y, confidence.
const KPT_DIM: usize = 3;

/// Box (4) + person score (1) preceding the keypoint block.
const KPT_START: usize = 5;

/// Decode raw pose model output into a keypoint set.
///
/// Candidate selection: the single prediction with the maximum person score
/// wins and all others are discarded. There is no identity continuity across
/// frames; when several people are visible the selected subject may change
/// from one frame to the next if a different person scores higher. Callers
/// that need tracking must layer it on top.
///
/// Returns the zeroed [`KeypointSet`] when the output is empty, malformed,
/// or no candidate reaches `conf_threshold`.
#[must_use]
pub fn decode_pose_output(
    output: &[f32],
    output_shape: &[usize],
    preprocess: &PreprocessResult,
    conf_threshold: f32,
) -> KeypointSet {
    let expected_features = KPT_START + Joint::COUNT * KPT_DIM; // 56

    // Parse output shape - handle both [1, features, preds] and
    // [1, preds, features] layouts, plus the batchless 2D forms.
    let (num_preds, is_transposed) = match output_shape {
        [_, a, b] | [a, b] => {
            if *a == expected_features || (a < b && *a >= expected_features) {
                (*b, false)
            } else {
                (*a, true)
            }
        }
        _ => (0, false),
    };

    if output.is_empty() || num_preds == 0 {
        return KeypointSet::default();
    }

    let actual_features = output.len() / num_preds;
    if actual_features < expected_features || output.len() != actual_features * num_preds {
        eprintln!(
            "WARNING ⚠️ pose output has {actual_features} features per prediction, expected at least {expected_features}"
        );
        return KeypointSet::default();
    }

    // Convert to 2D [preds, features].
    let output_2d = if is_transposed {
        match Array2::from_shape_vec((num_preds, actual_features), output.to_vec()) {
            Ok(arr) => arr,
            Err(_) => return KeypointSet::default(),
        }
    } else {
        match Array2::from_shape_vec((actual_features, num_preds), output.to_vec()) {
            Ok(arr) => arr.t().to_owned(),
            Err(_) => return KeypointSet::default(),
        }
    };

    // Single-subject policy: keep only the candidate with the maximum person
    // score. With one survivor per frame there is nothing left to suppress,
    // so no NMS pass is needed.
    let mut best: Option<(usize, f32)> = None;
    for i in 0..num_preds {
        let score = output_2d[[i, 4]];
        if score.is_nan() || score < conf_threshold {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }

    let Some((best_idx, _)) = best else {
        return KeypointSet::default();
    };

    let kpts = output_2d.slice(s![best_idx, KPT_START..KPT_START + Joint::COUNT * KPT_DIM]);

    #[allow(clippy::cast_precision_loss)]
    let (orig_h, orig_w) = (
        preprocess.orig_shape.0 as f32,
        preprocess.orig_shape.1 as f32,
    );

    let mut set = KeypointSet::default();
    for joint in Joint::ALL {
        let offset = joint.index() * KPT_DIM;
        let (px, py) = unletterbox_point(
            kpts[offset],
            kpts[offset + 1],
            preprocess.scale,
            preprocess.padding,
        );
        let confidence = kpts[offset + 2].clamp(0.0, 1.0);

        set.set(
            joint,
            Keypoint::new(
                (px / orig_w).clamp(0.0, 1.0),
                (py / orig_h).clamp(0.0, 1.0),
                confidence,
            ),
        );
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    const FEATURES: usize = 56;

    fn identity_preprocess(size: u32) -> PreprocessResult {
        PreprocessResult {
            tensor: Array4::zeros((1, 3, size as usize, size as usize)),
            orig_shape: (size, size),
            scale: (1.0, 1.0),
            padding: (0.0, 0.0),
        }
    }

    /// Build one candidate: box, person score, all keypoints at (x, y, kpt_conf).
    fn candidate(score: f32, x: f32, y: f32, kpt_conf: f32) -> Vec<f32> {
        let mut features = vec![x, y, 10.0, 10.0, score];
        for _ in 0..Joint::COUNT {
            features.extend_from_slice(&[x, y, kpt_conf]);
        }
        features
    }

    /// Lay candidates out as [1, features, preds] (the untransposed layout).
    fn to_output(candidates: &[Vec<f32>]) -> (Vec<f32>, Vec<usize>) {
        let n = candidates.len();
        let mut output = vec![0.0; FEATURES * n];
        for (i, c) in candidates.iter().enumerate() {
            for (f, &v) in c.iter().enumerate() {
                output[f * n + i] = v;
            }
        }
        (output, vec![1, FEATURES, n])
    }

    #[test]
    fn test_selects_highest_scoring_candidate() {
        let (output, shape) = to_output(&[
            candidate(0.6, 32.0, 32.0, 0.8),
            candidate(0.9, 128.0, 128.0, 0.8),
        ]);
        let pre = identity_preprocess(256);

        let set = decode_pose_output(&output, &shape, &pre, 0.25);
        let nose = set.get(Joint::Nose);
        assert!((nose.x - 0.5).abs() < 1e-5);
        assert!((nose.y - 0.5).abs() < 1e-5);
        assert!((nose.confidence - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_below_threshold_yields_zeroed_set() {
        let (output, shape) = to_output(&[candidate(0.1, 128.0, 128.0, 0.8)]);
        let pre = identity_preprocess(256);

        let set = decode_pose_output(&output, &shape, &pre, 0.25);
        assert_eq!(set, KeypointSet::default());
    }

    #[test]
    fn test_empty_output_yields_zeroed_set() {
        let pre = identity_preprocess(256);
        let set = decode_pose_output(&[], &[1, FEATURES, 0], &pre, 0.25);
        assert_eq!(set, KeypointSet::default());
    }

    #[test]
    fn test_transposed_layout() {
        // [1, preds, features]: candidates are stored row-major already.
        let c = candidate(0.9, 64.0, 192.0, 0.7);
        let shape = vec![1, 1, FEATURES];
        let pre = identity_preprocess(256);

        let set = decode_pose_output(&c, &shape, &pre, 0.25);
        let nose = set.get(Joint::Nose);
        assert!((nose.x - 0.25).abs() < 1e-5);
        assert!((nose.y - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_coordinates_clamped_to_unit_range() {
        // Keypoints outside the frame clamp to [0, 1].
        let c = candidate(0.9, 10_000.0, -50.0, 1.5);
        let shape = vec![1, 1, FEATURES];
        let pre = identity_preprocess(256);

        let set = decode_pose_output(&c, &shape, &pre, 0.25);
        let nose = set.get(Joint::Nose);
        assert_eq!(nose.x, 1.0);
        assert_eq!(nose.y, 0.0);
        assert_eq!(nose.confidence, 1.0);
    }
}
