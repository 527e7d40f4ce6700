//! Plain frame differencing: no motion, residual against the original previous frame.
//!
//! Reconstruction narrows modulo 256 with no clipping, the exact inverse of the
//! 16-bit subtraction, so decode reproduces the input for every sequence.

use crate::coder::{InterFrameCoder, ReferenceSource};
use mocomp_core::{CodecError, Frame, ResidualFrame, Result};
use mocomp_motion::{reconstruct_wrapping, MotionField, VectorWidth};

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDifferencing;

impl InterFrameCoder for FrameDifferencing {
    fn name(&self) -> &'static str {
        "differencing"
    }

    fn reference_source(&self) -> ReferenceSource {
        ReferenceSource::Original
    }

    fn estimate(&self, _current: &Frame, _reference: &Frame) -> Result<Option<MotionField>> {
        Ok(None)
    }

    fn predict(&self, reference: &Frame, motion: Option<&MotionField>) -> Result<Frame> {
        if motion.is_some() {
            return Err(CodecError::InvalidData(
                "frame differencing does not take motion fields".into(),
            ));
        }
        Ok(reference.clone())
    }

    fn reconstruct(&self, predicted: &Frame, residual: &ResidualFrame) -> Result<Frame> {
        reconstruct_wrapping(predicted, residual)
    }

    fn vector_width(&self) -> Result<Option<VectorWidth>> {
        Ok(None)
    }
}
