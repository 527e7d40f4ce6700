//! mocomp Core - Foundation types for the motion-compensated codec
//!
//! This crate provides the fundamental types used throughout mocomp:
//! - Frame and residual rasters (interleaved, row-major samples)
//! - Validated frame sequences
//! - Error types and per-item failure records

pub mod error;
pub mod frame;

pub use error::{CodecError, FailureStage, FrameFailure, Result};
pub use frame::{Frame, FrameDims, FrameSequence, Raster, ResidualFrame, Sample};
