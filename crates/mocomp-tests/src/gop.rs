//! Integration tests for GOP scheduling with both coding strategies.

use crate::fixtures::{noise, panning};
use mocomp_core::{Frame, FrameDims, FrameSequence};
use mocomp_gop::{
    EncodedFrame, FrameDifferencing, FrameKind, GopSchedule, GopScheduler, InterFrameCoder,
    MotionCompensated,
};
use mocomp_motion::BlockMatcher;
use proptest::prelude::*;

fn compensated() -> MotionCompensated {
    MotionCompensated::new(BlockMatcher::logarithmic(16, 4)).unwrap()
}

// ── Schedule ───────────────────────────────────────────────────

#[test]
fn period_twelve_marks_every_twelfth_frame() {
    let frames = panning(FrameDims::new(32, 32, 1), 30);
    let coder = FrameDifferencing;
    let encoded = GopScheduler::new(GopSchedule::default(), &coder)
        .encode(&frames)
        .unwrap();
    let intra: Vec<usize> = encoded
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.kind() == FrameKind::Intra)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(intra, vec![0, 12, 24]);
}

#[test]
fn both_strategies_decode_every_frame_in_order() {
    let frames = panning(FrameDims::new(64, 48, 3), 15);
    let differencing = FrameDifferencing;
    let motion = compensated();
    let coders: [&dyn InterFrameCoder; 2] = [&differencing, &motion];
    for coder in coders {
        let scheduler = GopScheduler::new(GopSchedule::default(), coder);
        let encoded = scheduler.encode(&frames).unwrap();
        assert_eq!(encoded.intra_count() + encoded.inter_count(), frames.len());
        let decoded = scheduler.decode(&encoded).unwrap();
        assert_eq!(decoded, frames.frames(), "{}", coder.name());
    }
}

// ── Reference chain ────────────────────────────────────────────

#[test]
fn compensated_decode_predicts_from_reconstructed_frame() {
    let dims = FrameDims::new(64, 64, 3);
    let base = noise(dims, 17);
    let frames = FrameSequence::new(vec![base.clone(), base.clone(), base]).unwrap();
    let coder = compensated();
    let scheduler = GopScheduler::new(GopSchedule::default(), &coder);
    let mut encoded = scheduler.encode(&frames).unwrap();
    assert_eq!(
        encoded.entries().iter().map(EncodedFrame::kind).collect::<Vec<_>>(),
        vec![FrameKind::Intra, FrameKind::Inter, FrameKind::Inter]
    );

    // Darken the first P-frame's reconstruction by 3 in block (0, 0).
    match &mut encoded.entries_mut()[1] {
        EncodedFrame::Inter { residual, .. } => {
            for y in 0..16 {
                for x in 0..16 {
                    for c in 0..3 {
                        let r = residual.get(y, x, c);
                        residual.set(y, x, c, r - 3);
                    }
                }
            }
        }
        EncodedFrame::Intra(_) => panic!("position 1 should be a P-frame"),
    }

    let decoded = scheduler.decode(&encoded).unwrap();
    let original = &frames.frames()[2];
    let expected = |y: usize, x: usize| original.get(y, x, 0).saturating_sub(3);
    // Identical frames give zero motion in block (0, 0) and a zero residual for
    // the second P-frame, so its block (0, 0) inherits the darkened samples.
    let second = encoded.entries()[2].motion().unwrap();
    assert!(second.get(0, 0).is_zero());
    for y in 0..16 {
        for x in 0..16 {
            assert_eq!(decoded[2].get(y, x, 0), expected(y, x));
        }
    }
    assert_ne!(&decoded[2], original);
}

#[test]
fn differencing_encodes_against_original_frames() {
    let dims = FrameDims::new(8, 8, 1);
    let frames = FrameSequence::new(vec![
        Frame::filled(dims, 10),
        Frame::filled(dims, 250),
        Frame::filled(dims, 5),
    ])
    .unwrap();
    let encoded = GopScheduler::new(GopSchedule::default(), &FrameDifferencing)
        .encode(&frames)
        .unwrap();
    let residuals: Vec<i16> = encoded.p_frames().map(|(_, r)| r.data()[0]).collect();
    assert_eq!(residuals, vec![240, -245]);
}

// ── Properties ─────────────────────────────────────────────────

fn arbitrary_sequence() -> impl Strategy<Value = FrameSequence> {
    (1usize..6, any::<u64>()).prop_map(|(len, seed)| {
        let dims = FrameDims::new(12, 8, 3);
        let frames = (0..len).map(|i| noise(dims, seed.wrapping_add(i as u64))).collect();
        FrameSequence::new(frames).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn differencing_round_trips_any_sequence(frames in arbitrary_sequence(), period in 1usize..4) {
        let scheduler = GopScheduler::new(GopSchedule::new(period).unwrap(), &FrameDifferencing);
        let encoded = scheduler.encode(&frames).unwrap();
        let decoded = scheduler.decode(&encoded).unwrap();
        prop_assert_eq!(decoded.as_slice(), frames.frames());
    }

    #[test]
    fn compensated_round_trips_any_sequence(frames in arbitrary_sequence()) {
        let coder = MotionCompensated::new(BlockMatcher::exhaustive(4, 1)).unwrap();
        let scheduler = GopScheduler::new(GopSchedule::default(), &coder);
        let encoded = scheduler.encode(&frames).unwrap();
        let decoded = scheduler.decode(&encoded).unwrap();
        prop_assert_eq!(decoded.as_slice(), frames.frames());
    }
}
