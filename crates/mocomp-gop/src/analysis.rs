//! Estimation-only motion analysis.
//!
//! Runs block matching for every P-frame position against the original
//! preceding frame and keeps the fields. No prediction, residual or
//! reconstruction is produced, so the result cannot be decoded.

use crate::cancel::CancelHandle;
use crate::gop::{FrameKind, GopSchedule};
use mocomp_core::{FrameSequence, Result};
use mocomp_motion::{BlockMatcher, MotionField};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionAnalysis {
    pub matcher: BlockMatcher,
    pub schedule: GopSchedule,
}

impl Default for MotionAnalysis {
    fn default() -> Self {
        Self {
            matcher: BlockMatcher::exhaustive(16, 8),
            schedule: GopSchedule::default(),
        }
    }
}

impl MotionAnalysis {
    pub fn new(matcher: BlockMatcher, schedule: GopSchedule) -> Self {
        Self { matcher, schedule }
    }

    pub fn analyze(&self, frames: &FrameSequence, cancel: &CancelHandle) -> Result<AnalysisReport> {
        self.matcher.validate()?;
        info!(
            algorithm = self.matcher.algorithm.name(),
            block_size = self.matcher.block_size,
            radius = self.matcher.radius,
            frames = frames.len(),
            "Analyzing motion"
        );

        let all = frames.frames();
        let mut fields = Vec::new();
        for index in 1..all.len() {
            cancel.check()?;
            if self.schedule.kind_at(index) != FrameKind::Inter {
                continue;
            }
            let field = self.matcher.estimate(&all[index], &all[index - 1])?;
            debug!(index, mean_magnitude = field.mean_magnitude(), "Analyzed frame");
            fields.push((index, field));
        }

        let report = AnalysisReport { fields };
        let summary = report.summary();
        info!(
            p_frames = summary.p_frames,
            mean_magnitude = summary.mean_magnitude,
            zero_share = summary.zero_share,
            "Motion analysis complete"
        );
        Ok(report)
    }
}

/// Motion fields keyed by frame index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub fields: Vec<(usize, MotionField)>,
}

impl AnalysisReport {
    pub fn summary(&self) -> AnalysisSummary {
        let blocks: usize = self.fields.iter().map(|(_, f)| f.vectors().len()).sum();
        let zero: usize = self.fields.iter().map(|(_, f)| f.zero_vectors()).sum();
        let magnitude: f64 = self
            .fields
            .iter()
            .flat_map(|(_, f)| f.vectors().iter().map(|v| v.magnitude()))
            .sum();
        let max_component = self
            .fields
            .iter()
            .map(|(_, f)| f.max_component())
            .max()
            .unwrap_or(0);

        AnalysisSummary {
            p_frames: self.fields.len(),
            blocks,
            mean_magnitude: if blocks == 0 { 0.0 } else { magnitude / blocks as f64 },
            zero_share: if blocks == 0 { 0.0 } else { zero as f64 / blocks as f64 },
            max_component,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub p_frames: usize,
    pub blocks: usize,
    pub mean_magnitude: f64,
    /// Fraction of vectors equal to (0, 0).
    pub zero_share: f64,
    pub max_component: u32,
}
