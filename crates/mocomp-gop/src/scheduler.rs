//! Sequential encode and decode over a GOP schedule.

use crate::cancel::CancelHandle;
use crate::coder::{InterFrameCoder, ReferenceSource};
use crate::gop::{FrameKind, GopSchedule};
use crate::sequence::{EncodedFrame, EncodedSequence};
use mocomp_core::{CodecError, FailureStage, Frame, FrameFailure, FrameSequence, Result};
use tracing::{debug, info, warn};

/// Progress notification emitted after each position is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEvent {
    pub index: usize,
    pub total: usize,
    pub kind: FrameKind,
}

impl FrameEvent {
    /// Fraction of the sequence processed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            (self.index + 1) as f32 / self.total as f32
        }
    }
}

/// Drives one [`InterFrameCoder`] over a sequence.
///
/// Positions are processed strictly in order: a P-frame at position `i` is
/// never computed before the frame at `i - 1` is available.
pub struct GopScheduler<'a> {
    schedule: GopSchedule,
    coder: &'a dyn InterFrameCoder,
}

impl<'a> GopScheduler<'a> {
    pub fn new(schedule: GopSchedule, coder: &'a dyn InterFrameCoder) -> Self {
        Self { schedule, coder }
    }

    pub fn schedule(&self) -> GopSchedule {
        self.schedule
    }

    pub fn coder(&self) -> &dyn InterFrameCoder {
        self.coder
    }

    pub fn encode(&self, frames: &FrameSequence) -> Result<EncodedSequence> {
        self.encode_with(frames, &CancelHandle::new(), |_| {})
    }

    /// Encode every position, checking `cancel` and reporting progress once per frame.
    pub fn encode_with(
        &self,
        frames: &FrameSequence,
        cancel: &CancelHandle,
        mut on_frame: impl FnMut(FrameEvent),
    ) -> Result<EncodedSequence> {
        let total = frames.len();
        info!(
            coder = self.coder.name(),
            frames = total,
            period = self.schedule.period(),
            "Encoding sequence"
        );

        let mut entries = Vec::with_capacity(total);
        // Last reconstructed frame, tracked only for coders that predict from it.
        let mut reconstructed: Option<Frame> = None;

        for (index, frame) in frames.iter().enumerate() {
            cancel.check()?;
            let kind = self.schedule.kind_at(index);
            let entry = match kind {
                FrameKind::Intra => {
                    if self.coder.reference_source() == ReferenceSource::Reconstructed {
                        reconstructed = Some(frame.clone());
                    }
                    EncodedFrame::Intra(frame.clone())
                }
                FrameKind::Inter => {
                    let reference = match self.coder.reference_source() {
                        ReferenceSource::Original => &frames.frames()[index - 1],
                        ReferenceSource::Reconstructed => {
                            reconstructed.as_ref().ok_or_else(|| CodecError::Schedule {
                                index,
                                message: "no reconstructed reference available".into(),
                            })?
                        }
                    };
                    let motion = self.coder.estimate(frame, reference)?;
                    let predicted = self.coder.predict(reference, motion.as_ref())?;
                    let residual = self.coder.compute_residual(frame, &predicted)?;
                    if self.coder.reference_source() == ReferenceSource::Reconstructed {
                        reconstructed = Some(self.coder.reconstruct(&predicted, &residual)?);
                    }
                    EncodedFrame::Inter { motion, residual }
                }
            };
            debug!(index, kind = kind.name(), "Encoded frame");
            entries.push(entry);
            on_frame(FrameEvent { index, total, kind });
        }

        let encoded = EncodedSequence::new(self.schedule, frames.dims(), entries);
        info!(
            i_frames = encoded.intra_count(),
            p_frames = encoded.inter_count(),
            "Encoding complete"
        );
        Ok(encoded)
    }

    pub fn decode(&self, encoded: &EncodedSequence) -> Result<Vec<Frame>> {
        self.decode_with(encoded, &CancelHandle::new(), |_| {})
    }

    /// Reconstruct every position in order. Any failure terminates the decode.
    pub fn decode_with(
        &self,
        encoded: &EncodedSequence,
        cancel: &CancelHandle,
        mut on_frame: impl FnMut(FrameEvent),
    ) -> Result<Vec<Frame>> {
        if encoded.schedule() != self.schedule {
            return Err(CodecError::Schedule {
                index: 0,
                message: format!(
                    "sequence was encoded with period {}, decoder uses {}",
                    encoded.schedule().period(),
                    self.schedule.period()
                ),
            });
        }

        let total = encoded.len();
        info!(coder = self.coder.name(), frames = total, "Decoding sequence");

        let mut reconstructed: Vec<Frame> = Vec::with_capacity(total);
        for (index, entry) in encoded.entries().iter().enumerate() {
            cancel.check()?;
            let kind = self.check_kind(index, entry)?;
            let frame = self.reconstruct_entry(entry, reconstructed.last())?;
            reconstructed.push(frame);
            debug!(index, kind = kind.name(), "Decoded frame");
            on_frame(FrameEvent { index, total, kind });
        }

        info!(frames = reconstructed.len(), "Decoding complete");
        Ok(reconstructed)
    }

    /// Decode a sequence whose entries may have failed individually upstream.
    ///
    /// The output has one outcome per input position. A failed or unrecoverable
    /// position breaks the reference chain: every following P-frame fails with
    /// [`FailureStage::BrokenReference`] until the next I-frame restores it.
    /// Schedule violations and cancellation still terminate the whole decode.
    pub fn decode_partial(
        &self,
        entries: Vec<std::result::Result<EncodedFrame, FrameFailure>>,
        cancel: &CancelHandle,
        mut on_frame: impl FnMut(FrameEvent),
    ) -> Result<Vec<std::result::Result<Frame, FrameFailure>>> {
        let total = entries.len();
        info!(
            coder = self.coder.name(),
            frames = total,
            "Decoding sequence with per-frame outcomes"
        );

        let mut outcomes = Vec::with_capacity(total);
        let mut last: Option<Frame> = None;
        let mut failures = 0usize;

        for (index, entry) in entries.into_iter().enumerate() {
            cancel.check()?;
            let kind = self.schedule.kind_at(index);
            let outcome = match entry {
                Err(failure) => Err(failure),
                Ok(entry) => {
                    self.check_kind(index, &entry)?;
                    if kind == FrameKind::Inter && last.is_none() {
                        Err(FrameFailure::new(
                            index,
                            FailureStage::BrokenReference,
                            format!("reference frame {} is unavailable", index.saturating_sub(1)),
                        ))
                    } else {
                        self.reconstruct_entry(&entry, last.as_ref()).map_err(|e| {
                            FrameFailure::new(index, FailureStage::Decode, e.to_string())
                        })
                    }
                }
            };

            match &outcome {
                Ok(frame) => last = Some(frame.clone()),
                Err(failure) => {
                    failures += 1;
                    warn!(
                        index,
                        stage = %failure.stage,
                        error = %failure.message,
                        "Frame not reconstructed"
                    );
                    last = None;
                }
            }
            outcomes.push(outcome);
            on_frame(FrameEvent { index, total, kind });
        }

        info!(frames = total, failures, "Decoding complete");
        Ok(outcomes)
    }

    fn check_kind(&self, index: usize, entry: &EncodedFrame) -> Result<FrameKind> {
        let expected = self.schedule.kind_at(index);
        let found = entry.kind();
        if found != expected {
            return Err(CodecError::Schedule {
                index,
                message: format!("expected {}, found {}", expected.name(), found.name()),
            });
        }
        Ok(found)
    }

    fn reconstruct_entry(&self, entry: &EncodedFrame, previous: Option<&Frame>) -> Result<Frame> {
        match entry {
            EncodedFrame::Intra(frame) => Ok(frame.clone()),
            EncodedFrame::Inter { motion, residual } => {
                let reference = previous.ok_or_else(|| {
                    CodecError::InvalidData("P-frame has no preceding reconstructed frame".into())
                })?;
                let predicted = self.coder.predict(reference, motion.as_ref())?;
                self.coder.reconstruct(&predicted, residual)
            }
        }
    }
}
