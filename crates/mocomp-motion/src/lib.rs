//! mocomp Motion - Block-matching motion estimation and compensation.

pub mod block_match;
pub mod motion_field;
pub mod predict;
pub mod residual;

pub use block_match::{block_sad, placement_valid, BlockMatcher, SearchAlgorithm};
pub use motion_field::{MotionField, MotionVector, VectorWidth};
pub use predict::{Prediction, Predictor};
pub use residual::{compute_residual, reconstruct, reconstruct_wrapping};
