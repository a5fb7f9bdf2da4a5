// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::Path;
use std::process;

use indicatif::{ProgressBar, ProgressStyle};

use crate::backup::backup_documents;
use crate::batch::{document_path, process_directory, BatchSummary};
use crate::cli::args::{BatchArgs, ExtractArgs};
use crate::detector::{BackendKind, PoseDetector, StubDetector};
use crate::document::AngleWire;
use crate::download::ensure_model;
use crate::model::{DetectorConfig, OnnxPoseDetector};
use crate::sequence::{AssemblerConfig, ProgressObserver, SequenceAssembler};
use crate::source::FrameSource;
use crate::{error, info, success, verbose};

/// Build the selected detector backend, exiting on load failure.
fn build_detector(
    backend: BackendKind,
    model: &Path,
    imgsz: usize,
    conf: f32,
) -> Box<dyn PoseDetector> {
    match backend {
        BackendKind::Stub => Box::new(StubDetector::new()),
        BackendKind::Onnx => {
            let model_path = match ensure_model(model) {
                Ok(path) => path,
                Err(e) => {
                    error!("{e}");
                    process::exit(1);
                }
            };

            let config = DetectorConfig::new().with_imgsz(imgsz).with_confidence(conf);
            verbose!("Loading pose model from {}...", model_path.display());
            match OnnxPoseDetector::load_with_config(&model_path, config) {
                Ok(detector) => Box::new(detector),
                Err(e) => {
                    error!("{e}");
                    process::exit(1);
                }
            }
        }
    }
}

/// Progress bar bridging [`ProgressObserver`] to indicatif.
struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    fn new(estimated: Option<usize>) -> Self {
        let bar = match estimated {
            Some(total) => ProgressBar::new(total as u64),
            None => ProgressBar::new_spinner(),
        };
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} frames ({elapsed})")
                .expect("valid progress template"),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BarObserver {
    fn on_progress(&mut self, processed: usize, estimated_total: Option<usize>) {
        if let Some(total) = estimated_total {
            // The estimate can undershoot; keep the bar length honest.
            self.bar.set_length((total.max(processed)) as u64);
        }
        self.bar.set_position(processed as u64);
    }
}

/// Run pose extraction on a single video.
pub fn run_extract(args: &ExtractArgs) {
    crate::cli::logging::set_verbose(args.verbose);

    let detector = build_detector(args.backend, &args.model, args.imgsz, args.conf);
    verbose!("✓ Loaded {} backend", detector.name());

    let config = AssemblerConfig::new()
        .with_angle_threshold(args.angle_conf)
        .with_wire(if args.nullable_angles {
            AngleWire::Nullable
        } else {
            AngleWire::LegacyZero
        });
    let mut assembler = SequenceAssembler::with_config(detector, config);

    info!("Processing video: {}", args.video.display());
    let mut source = match FrameSource::open(&args.video) {
        Ok(source) => source,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let estimate = source
        .estimated_frames()
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    verbose!("Video info: ~{} frames at {} fps", estimate, source.fps());

    let song_id = args
        .video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let output = document_path(&args.video, &args.output);

    let mut observer = BarObserver::new(source.estimated_frames());
    let result = assembler.extract_to_file(&mut source, &song_id, &output, &mut observer);
    observer.finish();

    match result {
        Ok(sequence) => {
            success!("Successfully processed {} frames", sequence.total_frames);
            success!("Output saved to {}", output.display());
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

/// Run pose extraction on every video in a directory.
pub fn run_batch(args: &BatchArgs) {
    crate::cli::logging::set_verbose(args.verbose);

    if args.backup {
        let backup_root = args
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| Path::new("backups").to_path_buf(), |p| p.join("backups"));

        match backup_documents(&args.output, &backup_root) {
            Ok(Some((dir, count))) => {
                info!("Backed up {count} existing document(s) to {}", dir.display());
            }
            Ok(None) => verbose!("No existing documents to back up"),
            Err(e) => {
                error!("{e}");
                process::exit(1);
            }
        }
    }

    let detector = build_detector(args.backend, &args.model, args.imgsz, args.conf);
    let config = AssemblerConfig::new().with_angle_threshold(args.angle_conf);
    let mut assembler = SequenceAssembler::with_config(detector, config);

    let summary = match process_directory(
        &mut assembler,
        &args.videos,
        &args.output,
        |i, total, video| {
            info!(
                "[{i}/{total}] Processing: {}",
                video
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| video.display().to_string())
            );
        },
    ) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    print_batch_summary(&summary, &args.output);

    if summary.total > 0 && summary.succeeded == 0 {
        process::exit(1);
    }
}

fn print_batch_summary(summary: &BatchSummary, output: &Path) {
    info!("");
    info!("{}", "=".repeat(60));
    info!("BATCH PROCESSING SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Total videos: {}", summary.total);
    info!("Successfully processed: {}", summary.succeeded);
    info!("Failed: {}", summary.failed.len());

    if !summary.failed.is_empty() {
        info!("");
        info!("Failed videos:");
        for (name, err) in &summary.failed {
            info!("  - {name}: {err}");
        }
    }

    info!("");
    info!("Output directory: {}", output.display());
}
