//! mocomp Pipeline - end-to-end runs over a frame sequence.
//!
//! A run encodes with the configured strategy, serializes every stored
//! artifact through a [`FrameByteCodec`](mocomp_media::FrameByteCodec),
//! reads the bytes back and decodes, keeping one outcome per frame index.

pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod serialize;

pub use config::{FailurePolicy, MotionConfig, PipelineConfig, Strategy};
pub use metrics::CompressionReport;
pub use pipeline::{Pipeline, PipelineOutput, PipelineProgress, PipelineStage};
pub use serialize::{deserialize_sequence, serialize_sequence, SerializedFrame, SerializedSequence};
