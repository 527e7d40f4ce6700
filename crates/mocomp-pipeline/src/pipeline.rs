//! End-to-end orchestration: encode, serialize, deserialize, decode.

use crate::config::{FailurePolicy, PipelineConfig, Strategy};
use crate::metrics::CompressionReport;
use crate::serialize::{deserialize_sequence, require_all, serialize_sequence};
use mocomp_core::{CodecError, Frame, FrameFailure, FrameSequence, Result};
use mocomp_gop::{AnalysisReport, CancelHandle, FrameEvent, GopScheduler, MotionAnalysis};
use mocomp_media::{FrameByteCodec, PngCodec};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Encode,
    Serialize,
    Deserialize,
    Decode,
    Analyze,
}

impl PipelineStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Encode => "Encoding",
            Self::Serialize => "Serializing",
            Self::Deserialize => "Deserializing",
            Self::Decode => "Decoding",
            Self::Analyze => "Analyzing motion",
        }
    }
}

/// Progress of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineProgress {
    pub stage: PipelineStage,
    /// Frames completed within the stage.
    pub completed: usize,
    pub total: usize,
}

impl PipelineProgress {
    /// Stage completion (0.0 to 1.0).
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f32 / self.total as f32
    }

    fn from_event(stage: PipelineStage, event: FrameEvent) -> Self {
        Self {
            stage,
            completed: event.index + 1,
            total: event.total,
        }
    }
}

/// Result of one strategy run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: CompressionReport,
    /// One outcome per input frame, in input order.
    pub frames: Vec<std::result::Result<Frame, FrameFailure>>,
}

impl PipelineOutput {
    pub fn failures(&self) -> impl Iterator<Item = &FrameFailure> + '_ {
        self.frames.iter().filter_map(|f| f.as_ref().err())
    }

    /// Successfully reconstructed frames with their indices.
    pub fn reconstructed(&self) -> impl Iterator<Item = (usize, &Frame)> + '_ {
        self.frames
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().ok().map(|frame| (i, frame)))
    }

    /// One frame per input index for playback.
    ///
    /// A failed index repeats the last reconstructed frame, or is black when
    /// nothing before it was reconstructed. `None` if every frame failed.
    pub fn held_frames(&self) -> Option<Vec<Frame>> {
        let (_, first) = self.reconstructed().next()?;
        let black = Frame::new(first.dims());
        let mut held = &black;
        Some(
            self.frames
                .iter()
                .map(|f| {
                    if let Ok(frame) = f {
                        held = frame;
                    }
                    held.clone()
                })
                .collect(),
        )
    }

    /// All frames, or the first failure.
    pub fn into_frames(self) -> Result<Vec<Frame>> {
        require_all(self.frames)
    }
}

/// Runs strategies over frame sequences with one configuration.
pub struct Pipeline {
    config: PipelineConfig,
    codec: Box<dyn FrameByteCodec>,
}

impl Pipeline {
    /// Validate `config` and use PNG for byte storage.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_codec(config, Box::new(PngCodec))
    }

    pub fn with_codec(config: PipelineConfig, codec: Box<dyn FrameByteCodec>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, codec })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the configured strategy.
    pub fn run(
        &self,
        frames: &FrameSequence,
        cancel: &CancelHandle,
        on_progress: impl FnMut(PipelineProgress),
    ) -> Result<PipelineOutput> {
        self.run_strategy(self.config.strategy, frames, cancel, on_progress)
    }

    /// Run one strategy end to end.
    pub fn run_strategy(
        &self,
        strategy: Strategy,
        frames: &FrameSequence,
        cancel: &CancelHandle,
        mut on_progress: impl FnMut(PipelineProgress),
    ) -> Result<PipelineOutput> {
        let schedule = self.config.schedule()?;
        let coder = strategy.coder(&self.config.motion)?;
        let scheduler = GopScheduler::new(schedule, coder.as_ref());
        let tolerate = self.config.failure_policy == FailurePolicy::Tolerate;
        let total = frames.len();

        info!(
            strategy = strategy.name(),
            frames = total,
            codec = self.codec.name(),
            "Pipeline run starting"
        );

        let encoded = scheduler.encode_with(frames, cancel, |event| {
            on_progress(PipelineProgress::from_event(PipelineStage::Encode, event))
        })?;

        cancel.check()?;
        let serialized = serialize_sequence(&encoded, self.codec.as_ref(), coder.vector_width()?);
        drop(encoded);
        if !tolerate {
            if let Some(failure) = serialized.failures().next() {
                return Err(CodecError::Item(failure.clone()));
            }
        }
        on_progress(PipelineProgress {
            stage: PipelineStage::Serialize,
            completed: total,
            total,
        });
        let report = CompressionReport::from_serialized(
            strategy.name(),
            frames.total_bytes() as u64,
            &serialized,
        );

        cancel.check()?;
        let entries = deserialize_sequence(&serialized, self.codec.as_ref());
        drop(serialized);
        if !tolerate {
            if let Some(Err(failure)) = entries.iter().find(|e| e.is_err()) {
                return Err(CodecError::Item(failure.clone()));
            }
        }
        on_progress(PipelineProgress {
            stage: PipelineStage::Deserialize,
            completed: total,
            total,
        });

        let outcomes = scheduler.decode_partial(entries, cancel, |event| {
            on_progress(PipelineProgress::from_event(PipelineStage::Decode, event))
        })?;
        if !tolerate {
            if let Some(Err(failure)) = outcomes.iter().find(|f| f.is_err()) {
                return Err(CodecError::Item(failure.clone()));
            }
        }

        let failed = outcomes.iter().filter(|f| f.is_err()).count();
        if failed > 0 {
            warn!(strategy = strategy.name(), failed, "Frames missing from reconstruction");
        }
        info!(
            strategy = strategy.name(),
            original_bytes = report.original_bytes,
            encoded_bytes = report.encoded_bytes(),
            ratio = report.ratio.unwrap_or(0.0),
            "Pipeline run complete"
        );
        Ok(PipelineOutput {
            report,
            frames: outcomes,
        })
    }

    /// Run both strategies on the same input.
    pub fn compare(
        &self,
        frames: &FrameSequence,
        cancel: &CancelHandle,
        mut on_progress: impl FnMut(Strategy, PipelineProgress),
    ) -> Result<Vec<(Strategy, PipelineOutput)>> {
        Strategy::ALL
            .into_iter()
            .map(|strategy| {
                let output =
                    self.run_strategy(strategy, frames, cancel, |p| on_progress(strategy, p))?;
                Ok((strategy, output))
            })
            .collect()
    }

    /// Estimation-only motion analysis with the analysis parameters.
    pub fn analyze(
        &self,
        frames: &FrameSequence,
        cancel: &CancelHandle,
        mut on_progress: impl FnMut(PipelineProgress),
    ) -> Result<AnalysisReport> {
        let analysis = MotionAnalysis::new(self.config.analysis.matcher(), self.config.schedule()?);
        let report = analysis.analyze(frames, cancel)?;
        on_progress(PipelineProgress {
            stage: PipelineStage::Analyze,
            completed: frames.len(),
            total: frames.len(),
        });
        Ok(report)
    }
}
