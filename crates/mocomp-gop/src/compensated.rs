//! Motion-compensated prediction against the previously reconstructed frame.

use crate::coder::{InterFrameCoder, ReferenceSource};
use mocomp_core::{CodecError, Frame, ResidualFrame, Result};
use mocomp_motion::{reconstruct, BlockMatcher, MotionField, Predictor, VectorWidth};

/// Block matching + prediction + clipped reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCompensated {
    matcher: BlockMatcher,
}

impl MotionCompensated {
    pub const DEFAULT_BLOCK_SIZE: usize = 64;
    pub const DEFAULT_RADIUS: u32 = 4;

    pub fn new(matcher: BlockMatcher) -> Result<Self> {
        matcher.validate()?;
        Ok(Self { matcher })
    }

    pub fn matcher(&self) -> &BlockMatcher {
        &self.matcher
    }
}

impl Default for MotionCompensated {
    fn default() -> Self {
        Self {
            matcher: BlockMatcher::logarithmic(Self::DEFAULT_BLOCK_SIZE, Self::DEFAULT_RADIUS),
        }
    }
}

impl InterFrameCoder for MotionCompensated {
    fn name(&self) -> &'static str {
        "motion-compensated"
    }

    fn reference_source(&self) -> ReferenceSource {
        ReferenceSource::Reconstructed
    }

    fn estimate(&self, current: &Frame, reference: &Frame) -> Result<Option<MotionField>> {
        self.matcher.estimate(current, reference).map(Some)
    }

    fn predict(&self, reference: &Frame, motion: Option<&MotionField>) -> Result<Frame> {
        let field = motion.ok_or_else(|| {
            CodecError::InvalidData("motion-compensated P-frame has no motion field".into())
        })?;
        let prediction = Predictor::new(self.matcher.block_size).predict(reference, field)?;
        Ok(prediction.frame)
    }

    fn reconstruct(&self, predicted: &Frame, residual: &ResidualFrame) -> Result<Frame> {
        reconstruct(predicted, residual)
    }

    fn vector_width(&self) -> Result<Option<VectorWidth>> {
        self.matcher.vector_width().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mocomp_core::FrameDims;

    #[test]
    fn test_default_configuration() {
        let coder = MotionCompensated::default();
        assert_eq!(coder.matcher().block_size, 64);
        assert_eq!(coder.matcher().radius, 4);
        assert_eq!(coder.vector_width().unwrap(), Some(VectorWidth::I8));
        assert_eq!(coder.reference_source(), ReferenceSource::Reconstructed);
    }

    #[test]
    fn test_rejects_invalid_matcher() {
        assert!(MotionCompensated::new(BlockMatcher::exhaustive(0, 4)).is_err());
    }

    #[test]
    fn test_predict_requires_field() {
        let reference = Frame::new(FrameDims::new(64, 64, 1));
        assert!(MotionCompensated::default().predict(&reference, None).is_err());
    }

    #[test]
    fn test_field_from_other_block_size_rejected() {
        let coder = MotionCompensated::new(BlockMatcher::logarithmic(16, 4)).unwrap();
        let reference = Frame::new(FrameDims::new(64, 64, 1));
        let field = MotionField::for_frame(reference.dims(), 8);
        assert!(matches!(
            coder.predict(&reference, Some(&field)),
            Err(CodecError::BlockSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_identical_frames_reconstruct_exactly() {
        let frame = Frame::test_pattern(64, 48, 3);
        let coder = MotionCompensated::new(BlockMatcher::exhaustive(16, 2)).unwrap();
        let field = coder.estimate(&frame, &frame).unwrap();
        let predicted = coder.predict(&frame, field.as_ref()).unwrap();
        let residual = coder.compute_residual(&frame, &predicted).unwrap();
        assert_eq!(coder.reconstruct(&predicted, &residual).unwrap(), frame);
    }
}
