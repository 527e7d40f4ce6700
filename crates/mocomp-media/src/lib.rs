//! mocomp Media - serialization and video I/O around the coding core
//!
//! This crate handles:
//! - Lossless per-frame byte codecs (PNG)
//! - Decoding video files into frame sequences
//! - Encoding reconstructed frames back to video

pub mod codec;
pub mod video;

pub use codec::{FrameByteCodec, PngCodec};
pub use video::{read_video, VideoCodec, VideoSink};
