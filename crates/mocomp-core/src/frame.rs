//! Frame rasters for video frames and residuals in CPU memory.
//!
//! Samples are interleaved and stored row-major (`height x width x channels`),
//! without row padding, so a block row is a contiguous slice.

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width, height and channel count of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDims {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Samples per pixel
    pub channels: u8,
}

impl FrameDims {
    pub const fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Total number of samples in a raster of these dimensions.
    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Samples per row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Block grid `(rows, cols)` for a block size. Partial blocks are dropped.
    pub fn block_grid(&self, block_size: usize) -> (usize, usize) {
        if block_size == 0 {
            return (0, 0);
        }
        (
            self.height as usize / block_size,
            self.width as usize / block_size,
        )
    }
}

impl fmt::Display for FrameDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// Sample types a raster can hold.
pub trait Sample: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl Sample for u8 {}
impl Sample for i16 {}

/// A fixed-size grid of interleaved samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster<S> {
    dims: FrameDims,
    data: Vec<S>,
}

/// An 8-bit video frame.
pub type Frame = Raster<u8>;

/// Signed per-sample differences between an actual and a predicted frame.
///
/// 16 bits hold every difference of two 8-bit samples without wraparound.
pub type ResidualFrame = Raster<i16>;

impl<S: Sample> Raster<S> {
    /// Create a zero-filled raster.
    pub fn new(dims: FrameDims) -> Self {
        Self {
            dims,
            data: vec![S::default(); dims.sample_count()],
        }
    }

    /// Wrap existing interleaved samples, checking the length against `dims`.
    pub fn from_raw(dims: FrameDims, data: Vec<S>) -> Result<Self> {
        if dims.channels == 0 {
            return Err(CodecError::InvalidData(
                "raster must have at least one channel".into(),
            ));
        }
        if data.len() != dims.sample_count() {
            return Err(CodecError::InvalidData(format!(
                "{} samples supplied for a {} raster ({} expected)",
                data.len(),
                dims,
                dims.sample_count()
            )));
        }
        Ok(Self { dims, data })
    }

    #[inline]
    pub fn dims(&self) -> FrameDims {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims.width as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims.height as usize
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.dims.channels as usize
    }

    /// All samples, row-major.
    #[inline]
    pub fn data(&self) -> &[S] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [S] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<S> {
        self.data
    }

    #[inline]
    fn offset(&self, y: usize, x: usize) -> usize {
        y * self.dims.row_len() + x * self.channels()
    }

    /// Sample at row `y`, column `x`, channel `c`.
    #[inline]
    pub fn get(&self, y: usize, x: usize, c: usize) -> S {
        self.data[self.offset(y, x) + c]
    }

    #[inline]
    pub fn set(&mut self, y: usize, x: usize, c: usize, value: S) {
        let idx = self.offset(y, x) + c;
        self.data[idx] = value;
    }

    /// `pixels` consecutive pixels of row `y` starting at column `x`.
    #[inline]
    pub fn row_span(&self, y: usize, x: usize, pixels: usize) -> &[S] {
        let start = self.offset(y, x);
        &self.data[start..start + pixels * self.channels()]
    }

    #[inline]
    pub fn row_span_mut(&mut self, y: usize, x: usize, pixels: usize) -> &mut [S] {
        let start = self.offset(y, x);
        let len = pixels * self.channels();
        &mut self.data[start..start + len]
    }

    /// In-memory size of the samples in bytes.
    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(self.data.as_slice())
    }
}

impl Frame {
    /// Create a frame with every sample set to `value`.
    pub fn filled(dims: FrameDims, value: u8) -> Self {
        Self {
            dims,
            data: vec![value; dims.sample_count()],
        }
    }

    /// Create a test pattern frame (vertical color bars).
    pub fn test_pattern(width: u32, height: u32, channels: u8) -> Self {
        const BARS: [[u8; 4]; 8] = [
            [255, 255, 255, 255], // White
            [255, 255, 0, 255],   // Yellow
            [0, 255, 255, 255],   // Cyan
            [0, 255, 0, 255],     // Green
            [255, 0, 255, 255],   // Magenta
            [255, 0, 0, 255],     // Red
            [0, 0, 255, 255],     // Blue
            [0, 0, 0, 255],       // Black
        ];

        let dims = FrameDims::new(width, height, channels);
        let mut frame = Self::new(dims);
        let ch = channels as usize;
        for y in 0..height as usize {
            for x in 0..width as usize {
                let bar = BARS[x * 8 / width as usize];
                for c in 0..ch {
                    frame.set(y, x, c, bar[c % 4]);
                }
            }
        }
        frame
    }
}

/// A non-empty, ordered sequence of frames that all share one set of dimensions.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    dims: FrameDims,
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Validate and take ownership of `frames`.
    ///
    /// Fails on an empty list, or names the first frame whose dimensions differ
    /// from frame 0.
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        let dims = frames.first().ok_or(CodecError::EmptySequence)?.dims();
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.dims() != dims)
        {
            return Err(CodecError::DimensionMismatch {
                index,
                expected: dims,
                found: frame.dims(),
            });
        }
        Ok(Self { dims, frames })
    }

    pub fn dims(&self) -> FrameDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Sum of the raw sample sizes of every frame.
    pub fn total_bytes(&self) -> usize {
        self.frames.iter().map(Frame::byte_len).sum()
    }
}
