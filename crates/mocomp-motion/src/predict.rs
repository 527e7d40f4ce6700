//! Motion-compensated frame prediction.

use crate::block_match::placement_valid;
use crate::motion_field::MotionField;
use mocomp_core::{CodecError, Frame, Result};
use tracing::debug;

/// A predicted frame plus the number of blocks that could not be predicted.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub frame: Frame,
    /// Blocks whose vector pointed outside the valid placement region and were
    /// left black.
    pub degraded_blocks: usize,
}

/// Synthesizes predicted frames for one block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predictor {
    block_size: usize,
}

impl Predictor {
    pub fn new(block_size: usize) -> Self {
        Self { block_size }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Copy, for every block of the field, the reference block the vector points at.
    ///
    /// Blocks whose displaced placement breaks the placement rule stay zero, as do
    /// the remainder rows and columns outside the block grid. A field estimated
    /// with another block size, or for other frame dimensions, is rejected.
    pub fn predict(&self, reference: &Frame, field: &MotionField) -> Result<Prediction> {
        if field.block_size() != self.block_size {
            return Err(CodecError::BlockSizeMismatch {
                rows: field.rows(),
                cols: field.cols(),
                block_size: field.block_size(),
                frame: reference.dims(),
            });
        }
        field.check_fits(reference.dims())?;

        let b = self.block_size;
        let dims = reference.dims();
        let mut predicted = Frame::new(dims);
        let mut degraded_blocks = 0;

        for (row, col, v) in field.blocks() {
            let (oy, ox) = (row * b, col * b);
            let ry = oy as i64 + i64::from(v.dy);
            let rx = ox as i64 + i64::from(v.dx);
            if !placement_valid(dims, b, ry, rx) {
                degraded_blocks += 1;
                continue;
            }
            for r in 0..b {
                let src = reference.row_span(ry as usize + r, rx as usize, b);
                predicted.row_span_mut(oy + r, ox, b).copy_from_slice(src);
            }
        }

        if degraded_blocks > 0 {
            debug!(
                degraded_blocks,
                total = field.vectors().len(),
                "Blocks outside the placement region predicted as black"
            );
        }

        Ok(Prediction {
            frame: predicted,
            degraded_blocks,
        })
    }
}
