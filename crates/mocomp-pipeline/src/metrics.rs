//! Byte accounting for one strategy run.

use crate::serialize::SerializedSequence;
use mocomp_core::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Original versus stored byte counts.
///
/// The ratio is `original_bytes / encoded_bytes`, where encoded bytes cover
/// I-frame images, residual images and packed motion fields of every item
/// that serialized successfully.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub strategy: String,
    pub frames: usize,
    pub i_frames: usize,
    pub p_frames: usize,
    pub original_bytes: u64,
    pub intra_bytes: u64,
    pub residual_bytes: u64,
    pub motion_bytes: u64,
    pub failed_items: usize,
    /// `None` when nothing was stored.
    pub ratio: Option<f64>,
}

impl CompressionReport {
    pub fn from_serialized(
        strategy: &str,
        original_bytes: u64,
        serialized: &SerializedSequence,
    ) -> Self {
        let schedule = serialized.schedule;
        let frames = serialized.items.len();
        let mut report = Self {
            strategy: strategy.to_string(),
            frames,
            i_frames: schedule.intra_count(frames),
            p_frames: schedule.inter_count(frames),
            original_bytes,
            intra_bytes: 0,
            residual_bytes: 0,
            motion_bytes: 0,
            failed_items: serialized.failures().count(),
            ratio: None,
        };
        for item in serialized.successes() {
            report.intra_bytes += item.intra_bytes() as u64;
            report.residual_bytes += item.residual_bytes() as u64;
            report.motion_bytes += item.motion_bytes() as u64;
        }
        let encoded = report.encoded_bytes();
        report.ratio = (encoded > 0).then(|| original_bytes as f64 / encoded as f64);
        report
    }

    pub fn encoded_bytes(&self) -> u64 {
        self.intra_bytes + self.residual_bytes + self.motion_bytes
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CodecError::Serialization(format!("Failed to serialize report: {e}")))
    }
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} frames ({} I / {} P), {} -> {} bytes",
            self.strategy,
            self.frames,
            self.i_frames,
            self.p_frames,
            self.original_bytes,
            self.encoded_bytes()
        )?;
        match self.ratio {
            Some(ratio) => write!(f, ", ratio {ratio:.3}")?,
            None => write!(f, ", ratio n/a")?,
        }
        if self.failed_items > 0 {
            write!(f, ", {} failed", self.failed_items)?;
        }
        Ok(())
    }
}
