//! End-to-end tests: config file, encode, PNG storage, decode, reports.

use crate::fixtures::panning;
use mocomp_core::{FailureStage, Frame, FrameDims, FrameSequence, ResidualFrame, Result};
use mocomp_gop::CancelHandle;
use mocomp_media::{FrameByteCodec, PngCodec};
use mocomp_motion::SearchAlgorithm;
use mocomp_pipeline::{FailurePolicy, MotionConfig, Pipeline, PipelineConfig, Strategy};

fn config(strategy: Strategy) -> PipelineConfig {
    PipelineConfig {
        gop_period: 5,
        strategy,
        motion: MotionConfig {
            algorithm: SearchAlgorithm::Logarithmic,
            block_size: 16,
            radius: 4,
        },
        ..Default::default()
    }
}

/// PNG, but any frame whose first sample is `poison` is stored as junk.
struct PoisonedCodec {
    poison: u8,
}

impl FrameByteCodec for PoisonedCodec {
    fn name(&self) -> &'static str {
        "poisoned"
    }
    fn encode_frame(&self, frame: &Frame) -> Result<Vec<u8>> {
        if frame.get(0, 0, 0) == self.poison {
            return Ok(b"not a png".to_vec());
        }
        PngCodec.encode_frame(frame)
    }
    fn decode_frame(&self, bytes: &[u8]) -> Result<Frame> {
        PngCodec.decode_frame(bytes)
    }
    fn encode_residual(&self, residual: &ResidualFrame) -> Result<Vec<u8>> {
        PngCodec.encode_residual(residual)
    }
    fn decode_residual(&self, bytes: &[u8]) -> Result<ResidualFrame> {
        PngCodec.decode_residual(bytes)
    }
}

fn flat_sequence(values: &[u8]) -> FrameSequence {
    let dims = FrameDims::new(16, 16, 1);
    FrameSequence::new(values.iter().map(|&v| Frame::filled(dims, v)).collect()).unwrap()
}

// ── Round trips ────────────────────────────────────────────────

#[test]
fn saved_config_drives_a_lossless_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    config(Strategy::MotionCompensated).save_to_file(&path).unwrap();

    let loaded = PipelineConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config(Strategy::MotionCompensated));

    let frames = panning(FrameDims::new(64, 48, 3), 11);
    let output = Pipeline::new(loaded)
        .unwrap()
        .run(&frames, &CancelHandle::new(), |_| {})
        .unwrap();
    assert_eq!(output.report.i_frames, 3);
    assert_eq!(output.report.p_frames, 8);
    assert_eq!(output.into_frames().unwrap(), frames.frames());
}

#[test]
fn compare_reports_both_strategies() {
    let frames = panning(FrameDims::new(64, 64, 3), 6);
    let pipeline = Pipeline::new(config(Strategy::Differencing)).unwrap();
    let mut seen = Vec::new();
    let results = pipeline
        .compare(&frames, &CancelHandle::new(), |strategy, _| {
            if seen.last() != Some(&strategy) {
                seen.push(strategy);
            }
        })
        .unwrap();

    assert_eq!(seen, Strategy::ALL.to_vec());
    assert_eq!(results.len(), 2);
    for (strategy, output) in &results {
        assert_eq!(output.report.strategy, strategy.name());
        assert_eq!(output.report.original_bytes, frames.total_bytes() as u64);
        assert_eq!(output.report.failed_items, 0);
        assert!(output.report.motion_bytes > 0 || *strategy == Strategy::Differencing);
        assert_eq!(output.failures().count(), 0);
    }
    let json = results[1].1.report.to_json().unwrap();
    assert!(json.contains("\"strategy\": \"motion-compensated\""));
}

#[test]
fn analysis_uses_its_own_parameters() {
    let frames = panning(FrameDims::new(64, 64, 1), 4);
    let mut cfg = config(Strategy::MotionCompensated);
    cfg.analysis = MotionConfig {
        algorithm: SearchAlgorithm::Exhaustive,
        block_size: 32,
        radius: 2,
    };
    let report = Pipeline::new(cfg)
        .unwrap()
        .analyze(&frames, &CancelHandle::new(), |_| {})
        .unwrap();
    let summary = report.summary();
    assert_eq!(summary.p_frames, 3);
    assert_eq!(summary.blocks, 3 * 4);
    assert!(summary.max_component <= 2);
}

// ── Failure handling ───────────────────────────────────────────

#[test]
fn lost_intra_frame_breaks_its_group_only() {
    let frames = flat_sequence(&[10, 20, 30, 99, 40, 50, 60]);
    let mut cfg = config(Strategy::Differencing);
    cfg.gop_period = 3;
    cfg.failure_policy = FailurePolicy::Tolerate;
    let pipeline = Pipeline::with_codec(cfg, Box::new(PoisonedCodec { poison: 99 })).unwrap();

    let output = pipeline.run(&frames, &CancelHandle::new(), |_| {}).unwrap();
    assert_eq!(output.frames.len(), 7);
    let stages: Vec<Option<FailureStage>> = output
        .frames
        .iter()
        .map(|f| f.as_ref().err().map(|e| e.stage))
        .collect();
    assert_eq!(
        stages,
        vec![
            None,
            None,
            None,
            Some(FailureStage::Decode),
            Some(FailureStage::BrokenReference),
            Some(FailureStage::BrokenReference),
            None,
        ]
    );
    let kept: Vec<usize> = output.reconstructed().map(|(i, _)| i).collect();
    assert_eq!(kept, vec![0, 1, 2, 6]);
    assert_eq!(output.frames[6].as_ref().unwrap(), &frames.frames()[6]);
}

#[test]
fn abort_policy_surfaces_first_failure() {
    let frames = flat_sequence(&[99, 20, 30]);
    let codec = Box::new(PoisonedCodec { poison: 99 });
    let pipeline = Pipeline::with_codec(config(Strategy::Differencing), codec).unwrap();
    let err = pipeline
        .run(&frames, &CancelHandle::new(), |_| {})
        .unwrap_err();
    match err {
        mocomp_core::CodecError::Item(failure) => {
            assert_eq!(failure.index, 0);
            assert_eq!(failure.stage, FailureStage::Decode);
        }
        other => panic!("expected an item failure, got {other}"),
    }
}

#[test]
fn cancelled_run_stops() {
    let frames = panning(FrameDims::new(32, 32, 1), 4);
    let cancel = CancelHandle::new();
    cancel.cancel();
    let err = Pipeline::new(config(Strategy::Differencing))
        .unwrap()
        .run(&frames, &cancel, |_| {})
        .unwrap_err();
    assert!(matches!(err, mocomp_core::CodecError::Cancelled));
}
