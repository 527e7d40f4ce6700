//! Fixed-period I/P frame classification.

use mocomp_core::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Coding type of a frame position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// Stored as-is.
    Intra,
    /// Stored as a residual against the preceding frame.
    Inter,
}

impl FrameKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Intra => "I-frame",
            Self::Inter => "P-frame",
        }
    }
}

/// Position `i` is an I-frame iff `i % period == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GopSchedule {
    period: usize,
}

impl GopSchedule {
    pub const DEFAULT_PERIOD: usize = 12;

    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(CodecError::InvalidParameter(
                "GOP period must be at least 1".into(),
            ));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    #[inline]
    pub fn kind_at(&self, index: usize) -> FrameKind {
        if index % self.period == 0 {
            FrameKind::Intra
        } else {
            FrameKind::Inter
        }
    }

    /// Kinds of positions `0..len`, in order.
    pub fn kinds(&self, len: usize) -> impl Iterator<Item = FrameKind> + '_ {
        (0..len).map(move |i| self.kind_at(i))
    }

    /// Number of I-frames among `len` positions.
    pub fn intra_count(&self, len: usize) -> usize {
        len.div_ceil(self.period)
    }

    pub fn inter_count(&self, len: usize) -> usize {
        len - self.intra_count(len)
    }
}

impl Default for GopSchedule {
    fn default() -> Self {
        Self {
            period: Self::DEFAULT_PERIOD,
        }
    }
}
