//! The shared capability behind both P-frame strategies.

use mocomp_core::{Frame, ResidualFrame, Result};
use mocomp_motion::{compute_residual, MotionField, VectorWidth};
use serde::{Deserialize, Serialize};

/// Which frame a P-frame is coded against during encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceSource {
    /// The original preceding frame.
    Original,
    /// The preceding frame as the decoder will reconstruct it.
    Reconstructed,
}

/// One way of turning a P-frame into (optional motion, residual) and back.
///
/// During decode the reference is always the last reconstructed frame.
pub trait InterFrameCoder: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    fn reference_source(&self) -> ReferenceSource;

    /// Motion field for `current` against `reference`, or `None` for coders
    /// that do not use motion.
    fn estimate(&self, current: &Frame, reference: &Frame) -> Result<Option<MotionField>>;

    /// Prediction of the current frame from `reference`.
    fn predict(&self, reference: &Frame, motion: Option<&MotionField>) -> Result<Frame>;

    fn compute_residual(&self, actual: &Frame, predicted: &Frame) -> Result<ResidualFrame> {
        compute_residual(actual, predicted)
    }

    fn reconstruct(&self, predicted: &Frame, residual: &ResidualFrame) -> Result<Frame>;

    /// Component width for packing this coder's motion fields, `None` when it
    /// produces none.
    fn vector_width(&self) -> Result<Option<VectorWidth>>;
}
