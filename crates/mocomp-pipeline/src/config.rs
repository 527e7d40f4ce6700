//! Run configuration, persisted as JSON.

use mocomp_core::{CodecError, Result};
use mocomp_gop::{FrameDifferencing, GopSchedule, InterFrameCoder, MotionCompensated};
use mocomp_motion::{BlockMatcher, SearchAlgorithm};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// P-frame coding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Residual against the original previous frame, no motion.
    Differencing,
    /// Block matching against the previously reconstructed frame.
    #[default]
    MotionCompensated,
}

impl Strategy {
    pub const ALL: [Self; 2] = [Self::Differencing, Self::MotionCompensated];

    pub fn name(self) -> &'static str {
        match self {
            Self::Differencing => "differencing",
            Self::MotionCompensated => "motion-compensated",
        }
    }

    /// Build the coder for this strategy.
    pub fn coder(self, motion: &MotionConfig) -> Result<Box<dyn InterFrameCoder>> {
        Ok(match self {
            Self::Differencing => Box::new(FrameDifferencing),
            Self::MotionCompensated => Box::new(MotionCompensated::new(motion.matcher())?),
        })
    }
}

/// What to do when a single frame fails to serialize or deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Terminate the run on the first per-frame failure.
    #[default]
    Abort,
    /// Record the failure at its index and keep going.
    Tolerate,
}

/// Block matching parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionConfig {
    pub algorithm: SearchAlgorithm,
    pub block_size: usize,
    pub radius: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            algorithm: SearchAlgorithm::Logarithmic,
            block_size: MotionCompensated::DEFAULT_BLOCK_SIZE,
            radius: MotionCompensated::DEFAULT_RADIUS,
        }
    }
}

impl MotionConfig {
    /// Estimation-only defaults: exhaustive, 16x16 blocks, radius 8.
    pub fn analysis() -> Self {
        Self {
            algorithm: SearchAlgorithm::Exhaustive,
            block_size: 16,
            radius: 8,
        }
    }

    pub fn matcher(&self) -> BlockMatcher {
        BlockMatcher::new(self.algorithm, self.block_size, self.radius)
    }
}

/// Everything a run needs apart from the frames themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub gop_period: usize,
    pub strategy: Strategy,
    pub motion: MotionConfig,
    #[serde(default = "MotionConfig::analysis")]
    pub analysis: MotionConfig,
    pub failure_policy: FailurePolicy,
    /// Frame rate used when writing video.
    pub fps: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gop_period: GopSchedule::DEFAULT_PERIOD,
            strategy: Strategy::default(),
            motion: MotionConfig::default(),
            analysis: MotionConfig::analysis(),
            failure_policy: FailurePolicy::default(),
            fps: 24,
        }
    }
}

impl PipelineConfig {
    pub fn schedule(&self) -> Result<GopSchedule> {
        GopSchedule::new(self.gop_period)
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule()?;
        self.motion.matcher().validate()?;
        self.analysis.matcher().validate()?;
        if self.fps == 0 {
            return Err(CodecError::InvalidParameter(
                "frame rate must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Serialize to pretty JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| CodecError::Serialization(format!("Failed to serialize config: {e}")))
    }

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| CodecError::Serialization(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}
