//! Error types for mocomp.

use crate::frame::FrameDims;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for mocomp operations.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Frame {index} has dimensions {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: FrameDims,
        found: FrameDims,
    },

    #[error("Operand dimensions differ: {left} vs {right}")]
    OperandMismatch { left: FrameDims, right: FrameDims },

    #[error(
        "Motion field grid {rows}x{cols} (block size {block_size}) does not match frame {frame}"
    )]
    BlockSizeMismatch {
        rows: usize,
        cols: usize,
        block_size: usize,
        frame: FrameDims,
    },

    #[error("Motion vector ({dy}, {dx}) does not fit {width} storage")]
    VectorOverflow {
        dy: i32,
        dx: i32,
        width: &'static str,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid frame data: {0}")]
    InvalidData(String),

    #[error("GOP schedule violation at frame {index}: {message}")]
    Schedule { index: usize, message: String },

    #[error("Media error: {0}")]
    Media(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Item(#[from] FrameFailure),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for mocomp operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Where a per-item failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStage {
    /// Serializing an artifact to bytes.
    Encode,
    /// Deserializing an artifact from bytes.
    Decode,
    /// The frame could not be rebuilt because a frame it depends on was lost.
    BrokenReference,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => f.write_str("encode"),
            Self::Decode => f.write_str("decode"),
            Self::BrokenReference => f.write_str("reconstruction"),
        }
    }
}

/// A failure of a single item, keyed by its index in the original sequence.
///
/// Cloneable so a failure can be recorded in a per-item outcome list and also
/// propagated to the frames that depend on it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("frame {index} failed during {stage}: {message}")]
pub struct FrameFailure {
    pub index: usize,
    pub stage: FailureStage,
    pub message: String,
}

impl FrameFailure {
    pub fn new(index: usize, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            index,
            stage,
            message: message.into(),
        }
    }
}
