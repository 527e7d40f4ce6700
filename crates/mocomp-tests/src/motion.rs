//! Integration tests for estimation, prediction and residual coding together.

use crate::fixtures::{noise, shifted};
use mocomp_core::{Frame, FrameDims};
use mocomp_motion::{
    block_sad, compute_residual, placement_valid, reconstruct, BlockMatcher, MotionField,
    MotionVector, Predictor,
};

// ── Estimation ─────────────────────────────────────────────────

#[test]
fn shifted_frame_recovers_displacement() {
    let dims = FrameDims::new(128, 128, 3);
    let frame1 = noise(dims, 11);
    let frame2 = shifted(&frame1, 4, -4);

    let field = BlockMatcher::exhaustive(64, 8)
        .estimate(&frame2, &frame1)
        .unwrap();
    assert_eq!((field.rows(), field.cols()), (2, 2));
    // Block (0, 1) is the only one whose true match passes the placement rule.
    assert_eq!(field.get(0, 1), MotionVector::new(4, -4));
}

#[test]
fn zero_radius_is_always_zero() {
    let dims = FrameDims::new(96, 64, 1);
    let field = BlockMatcher::exhaustive(16, 0)
        .estimate(&noise(dims, 1), &noise(dims, 2))
        .unwrap();
    assert!(field.vectors().iter().all(MotionVector::is_zero));
}

#[test]
fn exhaustive_never_worse_than_zero_vector() {
    let dims = FrameDims::new(64, 64, 1);
    let reference = noise(dims, 3);
    let current = shifted(&reference, 2, 1);
    let b = 16;
    let field = BlockMatcher::exhaustive(b, 3)
        .estimate(&current, &reference)
        .unwrap();

    for (row, col, v) in field.blocks() {
        let (oy, ox) = (row * b, col * b);
        if !placement_valid(dims, b, oy as i64, ox as i64) {
            continue;
        }
        let chosen = block_sad(
            &current,
            &reference,
            (oy, ox),
            ((oy as i64 + i64::from(v.dy)) as usize, (ox as i64 + i64::from(v.dx)) as usize),
            b,
        );
        let zero = block_sad(&current, &reference, (oy, ox), (oy, ox), b);
        assert!(chosen <= zero, "block ({row},{col}): {chosen} > {zero}");
    }
}

#[test]
fn logarithmic_is_deterministic() {
    let dims = FrameDims::new(128, 96, 3);
    let reference = noise(dims, 5);
    let current = shifted(&reference, -3, 2);
    let matcher = BlockMatcher::logarithmic(32, 8);
    let a = matcher.estimate(&current, &reference).unwrap();
    let b = matcher.estimate(&current, &reference).unwrap();
    assert_eq!(a, b);
}

// ── Prediction + residual ──────────────────────────────────────

#[test]
fn zero_motion_reproduces_valid_blocks() {
    let dims = FrameDims::new(64, 64, 3);
    let reference = noise(dims, 9);
    let field = MotionField::for_frame(dims, 16);
    let prediction = Predictor::new(16).predict(&reference, &field).unwrap();

    for y in 0..48 {
        for x in 0..48 {
            for c in 0..3 {
                assert_eq!(prediction.frame.get(y, x, c), reference.get(y, x, c));
            }
        }
    }
    // Last block row and column sit on the excluded boundary and stay black.
    assert_eq!(prediction.degraded_blocks, 7);
    assert_eq!(prediction.frame.get(63, 63, 0), 0);
}

#[test]
fn out_of_bounds_vector_blacks_out_block() {
    let dims = FrameDims::new(32, 32, 1);
    let reference = Frame::filled(dims, 200);
    let mut field = MotionField::for_frame(dims, 8);
    field.set(1, 1, MotionVector::new(-9, 0));
    let prediction = Predictor::new(8).predict(&reference, &field).unwrap();
    assert_eq!(prediction.frame.get(8, 8, 0), 0);
    assert_eq!(prediction.frame.get(15, 15, 0), 0);
    assert_eq!(prediction.frame.get(0, 0, 0), 200);
}

#[test]
fn residual_closes_the_loop() {
    let dims = FrameDims::new(64, 48, 3);
    let reference = noise(dims, 21);
    let current = shifted(&reference, 1, -2);
    let field = BlockMatcher::logarithmic(16, 4)
        .estimate(&current, &reference)
        .unwrap();
    let predicted = Predictor::new(16).predict(&reference, &field).unwrap().frame;
    let residual = compute_residual(&current, &predicted).unwrap();
    assert_eq!(reconstruct(&predicted, &residual).unwrap(), current);
}

#[test]
fn mismatched_block_size_rejected() {
    let dims = FrameDims::new(64, 64, 1);
    let reference = noise(dims, 4);
    let field = BlockMatcher::exhaustive(16, 2)
        .estimate(&reference, &reference)
        .unwrap();
    assert!(Predictor::new(32).predict(&reference, &field).is_err());
}
