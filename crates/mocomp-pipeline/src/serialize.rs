//! Per-item byte serialization of an encoded sequence.
//!
//! Every position yields its own outcome, so one failing frame never shifts
//! the positions of the others.

use mocomp_core::{FailureStage, FrameDims, FrameFailure, Result};
use mocomp_gop::{EncodedFrame, EncodedSequence, GopSchedule};
use mocomp_media::FrameByteCodec;
use mocomp_motion::{MotionField, VectorWidth};
use rayon::prelude::*;
use tracing::{debug, warn};

type Outcome<T> = std::result::Result<T, FrameFailure>;

/// Bytes stored for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedFrame {
    Intra {
        image: Vec<u8>,
    },
    Inter {
        motion: Option<Vec<u8>>,
        residual: Vec<u8>,
    },
}

impl SerializedFrame {
    pub fn intra_bytes(&self) -> usize {
        match self {
            Self::Intra { image } => image.len(),
            Self::Inter { .. } => 0,
        }
    }

    pub fn residual_bytes(&self) -> usize {
        match self {
            Self::Inter { residual, .. } => residual.len(),
            Self::Intra { .. } => 0,
        }
    }

    pub fn motion_bytes(&self) -> usize {
        match self {
            Self::Inter { motion, .. } => motion.as_ref().map_or(0, Vec::len),
            Self::Intra { .. } => 0,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.intra_bytes() + self.residual_bytes() + self.motion_bytes()
    }
}

/// Serialized positions in original order, each a success or a typed failure.
#[derive(Debug, Clone)]
pub struct SerializedSequence {
    pub schedule: GopSchedule,
    pub dims: FrameDims,
    pub items: Vec<Outcome<SerializedFrame>>,
}

impl SerializedSequence {
    pub fn failures(&self) -> impl Iterator<Item = &FrameFailure> + '_ {
        self.items.iter().filter_map(|item| item.as_ref().err())
    }

    pub fn successes(&self) -> impl Iterator<Item = &SerializedFrame> + '_ {
        self.items.iter().filter_map(|item| item.as_ref().ok())
    }
}

fn encode_failure(index: usize) -> impl Fn(mocomp_core::CodecError) -> FrameFailure {
    move |e| FrameFailure::new(index, FailureStage::Encode, e.to_string())
}

fn decode_failure(index: usize) -> impl Fn(mocomp_core::CodecError) -> FrameFailure {
    move |e| FrameFailure::new(index, FailureStage::Decode, e.to_string())
}

fn serialize_entry(
    index: usize,
    entry: &EncodedFrame,
    codec: &dyn FrameByteCodec,
    width: Option<VectorWidth>,
) -> Outcome<SerializedFrame> {
    let fail = encode_failure(index);
    match entry {
        EncodedFrame::Intra(frame) => Ok(SerializedFrame::Intra {
            image: codec.encode_frame(frame).map_err(&fail)?,
        }),
        EncodedFrame::Inter { motion, residual } => {
            let motion = match (motion, width) {
                (Some(field), Some(width)) => Some(field.to_bytes(width).map_err(&fail)?),
                (Some(_), None) => {
                    return Err(FrameFailure::new(
                        index,
                        FailureStage::Encode,
                        "motion field present but no vector width configured",
                    ))
                }
                (None, _) => None,
            };
            Ok(SerializedFrame::Inter {
                motion,
                residual: codec.encode_residual(residual).map_err(&fail)?,
            })
        }
    }
}

/// Serialize every entry through `codec`. Motion fields are packed at `width`.
///
/// Entries are independent and are serialized in parallel.
pub fn serialize_sequence(
    encoded: &EncodedSequence,
    codec: &dyn FrameByteCodec,
    width: Option<VectorWidth>,
) -> SerializedSequence {
    let items: Vec<Outcome<SerializedFrame>> = encoded
        .entries()
        .par_iter()
        .enumerate()
        .map(|(index, entry)| serialize_entry(index, entry, codec, width))
        .collect();

    for failure in items.iter().filter_map(|item| item.as_ref().err()) {
        warn!(index = failure.index, error = %failure.message, "Frame serialization failed");
    }
    debug!(codec = codec.name(), items = items.len(), "Serialized sequence");

    SerializedSequence {
        schedule: encoded.schedule(),
        dims: encoded.dims(),
        items,
    }
}

fn deserialize_entry(
    index: usize,
    item: &SerializedFrame,
    codec: &dyn FrameByteCodec,
    dims: FrameDims,
) -> Outcome<EncodedFrame> {
    let fail = decode_failure(index);
    let check = |found: FrameDims| {
        if found == dims {
            Ok(())
        } else {
            Err(FrameFailure::new(
                index,
                FailureStage::Decode,
                format!("decoded dimensions {found}, expected {dims}"),
            ))
        }
    };

    match item {
        SerializedFrame::Intra { image } => {
            let frame = codec.decode_frame(image).map_err(&fail)?;
            check(frame.dims())?;
            Ok(EncodedFrame::Intra(frame))
        }
        SerializedFrame::Inter { motion, residual } => {
            let residual = codec.decode_residual(residual).map_err(&fail)?;
            check(residual.dims())?;
            let motion = motion
                .as_deref()
                .map(MotionField::from_bytes)
                .transpose()
                .map_err(&fail)?;
            Ok(EncodedFrame::Inter { motion, residual })
        }
    }
}

/// Read every successfully serialized item back. Upstream failures pass through
/// unchanged at their index.
pub fn deserialize_sequence(
    serialized: &SerializedSequence,
    codec: &dyn FrameByteCodec,
) -> Vec<Outcome<EncodedFrame>> {
    let dims = serialized.dims;
    let items: Vec<Outcome<EncodedFrame>> = serialized
        .items
        .par_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Ok(item) => deserialize_entry(index, item, codec, dims),
            Err(failure) => Err(failure.clone()),
        })
        .collect();

    for failure in items
        .iter()
        .zip(&serialized.items)
        .filter_map(|(out, input)| match (out, input) {
            (Err(failure), Ok(_)) => Some(failure),
            _ => None,
        })
    {
        warn!(index = failure.index, error = %failure.message, "Frame deserialization failed");
    }
    items
}

/// Collect outcomes, failing on the first per-item failure.
pub(crate) fn require_all<T>(items: Vec<Outcome<T>>) -> Result<Vec<T>> {
    items
        .into_iter()
        .map(|item| item.map_err(Into::into))
        .collect()
}
