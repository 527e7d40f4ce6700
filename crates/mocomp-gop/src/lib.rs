//! mocomp GOP - Group-of-pictures scheduling and inter-frame coding.
//!
//! A [`GopSchedule`] decides which positions are I-frames. A
//! [`GopScheduler`] walks a sequence in order and hands every P-frame to an
//! [`InterFrameCoder`]:
//! - [`FrameDifferencing`]: residual against the original previous frame
//! - [`MotionCompensated`]: block matching and prediction against the
//!   previously reconstructed frame
//!
//! [`MotionAnalysis`] runs block matching alone, without residuals.

pub mod analysis;
pub mod cancel;
pub mod coder;
pub mod compensated;
pub mod differencing;
pub mod gop;
pub mod scheduler;
pub mod sequence;

pub use analysis::{AnalysisReport, AnalysisSummary, MotionAnalysis};
pub use cancel::CancelHandle;
pub use coder::{InterFrameCoder, ReferenceSource};
pub use compensated::MotionCompensated;
pub use differencing::FrameDifferencing;
pub use gop::{FrameKind, GopSchedule};
pub use scheduler::{FrameEvent, GopScheduler};
pub use sequence::{EncodedFrame, EncodedSequence};
