//! Synthetic frames shared by the integration tests.

use mocomp_core::{Frame, FrameDims, FrameSequence};

/// Deterministic pseudo-random frame.
pub fn noise(dims: FrameDims, seed: u64) -> Frame {
    let mut state = seed;
    let data = (0..dims.sample_count())
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect();
    Frame::from_raw(dims, data).unwrap()
}

/// Frame whose sample at `(y, x)` is `src` at `(y + dy, x + dx)`, with edge
/// samples repeated past the border.
pub fn shifted(src: &Frame, dy: i64, dx: i64) -> Frame {
    let (h, w) = (src.height() as i64, src.width() as i64);
    let mut out = Frame::new(src.dims());
    for y in 0..h {
        for x in 0..w {
            let sy = (y + dy).clamp(0, h - 1) as usize;
            let sx = (x + dx).clamp(0, w - 1) as usize;
            for c in 0..src.channels() {
                out.set(y as usize, x as usize, c, src.get(sy, sx, c));
            }
        }
    }
    out
}

/// Noise panning right by one pixel per frame.
pub fn panning(dims: FrameDims, len: usize) -> FrameSequence {
    let base = noise(dims, 7);
    let frames = (0..len).map(|i| shifted(&base, 0, i as i64)).collect();
    FrameSequence::new(frames).unwrap()
}
