//! The encoded form of a sequence: one entry per original position.

use crate::gop::{FrameKind, GopSchedule};
use mocomp_core::{Frame, FrameDims, ResidualFrame};
use mocomp_motion::MotionField;

/// The stored artifact for one position.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedFrame {
    Intra(Frame),
    Inter {
        /// Present for motion-compensated coding only.
        motion: Option<MotionField>,
        residual: ResidualFrame,
    },
}

impl EncodedFrame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Intra(_) => FrameKind::Intra,
            Self::Inter { .. } => FrameKind::Inter,
        }
    }

    pub fn motion(&self) -> Option<&MotionField> {
        match self {
            Self::Inter { motion, .. } => motion.as_ref(),
            Self::Intra(_) => None,
        }
    }

    pub fn residual(&self) -> Option<&ResidualFrame> {
        match self {
            Self::Inter { residual, .. } => Some(residual),
            Self::Intra(_) => None,
        }
    }
}

/// I-frames and P-frame artifacts in original order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSequence {
    schedule: GopSchedule,
    dims: FrameDims,
    entries: Vec<EncodedFrame>,
}

impl EncodedSequence {
    pub(crate) fn new(schedule: GopSchedule, dims: FrameDims, entries: Vec<EncodedFrame>) -> Self {
        Self {
            schedule,
            dims,
            entries,
        }
    }

    pub fn schedule(&self) -> GopSchedule {
        self.schedule
    }

    pub fn dims(&self) -> FrameDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EncodedFrame] {
        &self.entries
    }

    /// Mutable access to the stored artifacts, for callers that post-process
    /// residuals before decode.
    pub fn entries_mut(&mut self) -> &mut [EncodedFrame] {
        &mut self.entries
    }

    pub fn into_entries(self) -> Vec<EncodedFrame> {
        self.entries
    }

    /// Stored I-frames, in order.
    pub fn i_frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.entries.iter().filter_map(|e| match e {
            EncodedFrame::Intra(frame) => Some(frame),
            EncodedFrame::Inter { .. } => None,
        })
    }

    /// `(motion, residual)` of each P-frame, in order.
    pub fn p_frames(&self) -> impl Iterator<Item = (Option<&MotionField>, &ResidualFrame)> + '_ {
        self.entries.iter().filter_map(|e| match e {
            EncodedFrame::Inter { motion, residual } => Some((motion.as_ref(), residual)),
            EncodedFrame::Intra(_) => None,
        })
    }

    pub fn intra_count(&self) -> usize {
        self.i_frames().count()
    }

    pub fn inter_count(&self) -> usize {
        self.len() - self.intra_count()
    }
}
