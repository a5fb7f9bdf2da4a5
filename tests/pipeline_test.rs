// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! End-to-end pipeline tests: assemble a sequence with the stub detector,
//! persist it, and check the produced document against the validator.

use image::DynamicImage;
use serde_json::Value;

use dance_pose_extract::{
    AngleWire, AssemblerConfig, Joint, PoseSequence, SequenceAssembler, StubDetector, Validator,
};

fn frames(n: usize) -> Vec<DynamicImage> {
    (0..n).map(|_| DynamicImage::new_rgb8(320, 240)).collect()
}

fn extract(n: usize) -> PoseSequence {
    let mut assembler = SequenceAssembler::new(StubDetector::new());
    let mut no_progress = |_processed: usize, _estimated: Option<usize>| {};
    assembler.extract_frames(frames(n), 30.0, Some(n), "test-song", &mut no_progress)
}

fn save_and_parse(sequence: &PoseSequence, wire: AngleWire) -> Value {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test-song.json");
    sequence.save_with(&path, wire).unwrap();
    serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap()
}

#[test]
fn produced_document_passes_validation() {
    let doc = save_and_parse(&extract(12), AngleWire::LegacyZero);

    let report = Validator::new().validate_value(&doc);
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
}

#[test]
fn every_frame_has_all_17_keypoints() {
    let doc = save_and_parse(&extract(5), AngleWire::LegacyZero);

    let frames = doc["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 5);
    for frame in frames {
        let keypoints = frame["keypoints"].as_object().unwrap();
        assert_eq!(keypoints.len(), 17);
        for joint in Joint::ALL {
            assert!(keypoints.contains_key(joint.as_str()), "missing {joint}");
        }
    }
}

#[test]
fn every_angle_is_in_range_or_zero() {
    let doc = save_and_parse(&extract(5), AngleWire::LegacyZero);

    for frame in doc["frames"].as_array().unwrap() {
        for (name, value) in frame["angles"].as_object().unwrap() {
            let v = value.as_f64().unwrap_or_else(|| panic!("{name} not numeric"));
            assert!((0.0..=180.0).contains(&v), "{name} out of range: {v}");
        }
    }
}

#[test]
fn total_frames_mutation_is_caught() {
    let mut doc = save_and_parse(&extract(3), AngleWire::LegacyZero);
    doc["totalFrames"] = serde_json::json!(99);

    let report = Validator::new().validate_value(&doc);
    assert!(!report.is_valid());
    assert!(
        report
            .errors
            .iter()
            .any(|e| e.contains("frames array length (3) doesn't match totalFrames (99)")),
        "errors: {:?}",
        report.errors
    );
}

#[test]
fn zero_length_video_produces_valid_empty_document() {
    let sequence = extract(0);
    assert_eq!(sequence.total_frames, 0);

    let doc = save_and_parse(&sequence, AngleWire::LegacyZero);
    let report = Validator::new().validate_value(&doc);
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
}

#[test]
fn nullable_export_validates_with_flag() {
    // A degraded detector gates every angle; nullable export writes nulls.
    let detector = StubDetector::with_keypoints(Default::default());
    let mut assembler = SequenceAssembler::with_config(detector, AssemblerConfig::new());
    let mut no_progress = |_p: usize, _e: Option<usize>| {};
    let sequence =
        assembler.extract_frames(frames(2), 30.0, Some(2), "degraded", &mut no_progress);

    let doc = save_and_parse(&sequence, AngleWire::Nullable);
    assert!(doc["frames"][0]["angles"]["leftArm"].is_null());

    let strict = Validator::new().validate_value(&doc);
    assert!(!strict.is_valid());

    let lenient = Validator::new().with_null_angles(true).validate_value(&doc);
    assert!(lenient.is_valid(), "unexpected errors: {:?}", lenient.errors);
}

#[test]
fn document_roundtrips_through_typed_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.json");

    let sequence = extract(4);
    sequence.save(&path).unwrap();
    let loaded = PoseSequence::load(&path).unwrap();

    assert_eq!(loaded.song_id, "test-song");
    assert_eq!(loaded.total_frames, 4);
    assert_eq!(loaded.frames.len(), 4);
    assert_eq!(loaded.detector.as_deref(), Some("stub"));
    for (i, frame) in loaded.frames.iter().enumerate() {
        assert_eq!(frame.frame_number, i as u64);
    }
}
