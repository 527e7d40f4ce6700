//! Block-matching motion estimation.
//!
//! Both searches score candidates with the sum of absolute differences (SAD)
//! over every sample of the block and keep the first candidate that strictly
//! improves on the best seen so far, so evaluation order is the tie-break.
//!
//! A candidate placement at `(y, x)` is valid iff `0 <= y < height - b` and
//! `0 <= x < width - b`. The upper bound is strict, which excludes the last
//! row and column of positions a block could physically occupy. Prediction uses
//! the same rule, so the two stay consistent.

use crate::motion_field::{MotionField, MotionVector, VectorWidth};
use mocomp_core::{CodecError, Frame, FrameDims, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Candidate search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchAlgorithm {
    /// Every offset in `[-r, r]^2`.
    Exhaustive,
    /// Three-step search: 9 candidates around the running best, halving the step.
    #[default]
    Logarithmic,
}

impl SearchAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::Logarithmic => "logarithmic",
        }
    }

    /// Largest component magnitude this search can produce for `radius`.
    ///
    /// The logarithmic search moves relative to a running best, so one pass at
    /// step `s` can shift a component by up to `3 * s`.
    pub fn reach(self, radius: u32) -> u32 {
        match self {
            Self::Exhaustive => radius,
            Self::Logarithmic => {
                let mut step = radius / 2;
                let mut total = 0u32;
                while step >= 1 {
                    total = total.saturating_add(step.saturating_mul(3));
                    step /= 2;
                }
                total
            }
        }
    }
}

/// Whether a block of size `b` may be read from `(y, x)` of a frame with `dims`.
#[inline]
pub fn placement_valid(dims: FrameDims, block_size: usize, y: i64, x: i64) -> bool {
    let b = block_size as i64;
    y >= 0 && y < dims.height as i64 - b && x >= 0 && x < dims.width as i64 - b
}

/// SAD between the block of `current` at `(cy, cx)` and the block of
/// `reference` at `(ry, rx)`. Both placements must lie inside their frames.
pub fn block_sad(
    current: &Frame,
    reference: &Frame,
    (cy, cx): (usize, usize),
    (ry, rx): (usize, usize),
    block_size: usize,
) -> u64 {
    (0..block_size)
        .map(|row| {
            let a = current.row_span(cy + row, cx, block_size);
            let b = reference.row_span(ry + row, rx, block_size);
            a.iter()
                .zip(b)
                .map(|(&p, &q)| u64::from(p.abs_diff(q)))
                .sum::<u64>()
        })
        .sum()
}

/// Computes motion fields between a current and a reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMatcher {
    pub algorithm: SearchAlgorithm,
    pub block_size: usize,
    pub radius: u32,
}

impl BlockMatcher {
    pub fn new(algorithm: SearchAlgorithm, block_size: usize, radius: u32) -> Self {
        Self {
            algorithm,
            block_size,
            radius,
        }
    }

    pub fn exhaustive(block_size: usize, radius: u32) -> Self {
        Self::new(SearchAlgorithm::Exhaustive, block_size, radius)
    }

    pub fn logarithmic(block_size: usize, radius: u32) -> Self {
        Self::new(SearchAlgorithm::Logarithmic, block_size, radius)
    }

    /// Component width needed to store any vector this matcher produces.
    pub fn vector_width(&self) -> Result<VectorWidth> {
        VectorWidth::for_reach(self.algorithm.reach(self.radius))
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(CodecError::InvalidParameter(
                "block size must be at least 1".into(),
            ));
        }
        self.vector_width().map(|_| ())
    }

    /// Estimate one vector per full block of `current` against `reference`.
    ///
    /// Blocks are searched in parallel; the result equals a raster-order
    /// sequential evaluation.
    pub fn estimate(&self, current: &Frame, reference: &Frame) -> Result<MotionField> {
        self.validate()?;
        if current.dims() != reference.dims() {
            return Err(CodecError::OperandMismatch {
                left: current.dims(),
                right: reference.dims(),
            });
        }

        let b = self.block_size;
        let (rows, cols) = current.dims().block_grid(b);
        let vectors: Vec<MotionVector> = (0..rows * cols)
            .into_par_iter()
            .map(|k| self.search_block(current, reference, (k / cols) * b, (k % cols) * b))
            .collect();

        debug!(
            algorithm = self.algorithm.name(),
            block_size = b,
            radius = self.radius,
            blocks = vectors.len(),
            "Estimated motion field"
        );
        MotionField::from_vectors(rows, cols, b, vectors)
    }

    /// Best vector for the block whose top-left corner is `(origin_y, origin_x)`.
    pub fn search_block(
        &self,
        current: &Frame,
        reference: &Frame,
        origin_y: usize,
        origin_x: usize,
    ) -> MotionVector {
        match self.algorithm {
            SearchAlgorithm::Exhaustive => {
                self.exhaustive_search(current, reference, origin_y, origin_x)
            }
            SearchAlgorithm::Logarithmic => {
                self.logarithmic_search(current, reference, origin_y, origin_x)
            }
        }
    }

    /// SAD of the candidate `(oy + m, ox + n)`, or `None` when the placement is invalid.
    #[inline]
    fn candidate_sad(
        &self,
        current: &Frame,
        reference: &Frame,
        (oy, ox): (usize, usize),
        (m, n): (i64, i64),
    ) -> Option<u64> {
        let ry = oy as i64 + m;
        let rx = ox as i64 + n;
        placement_valid(reference.dims(), self.block_size, ry, rx).then(|| {
            block_sad(
                current,
                reference,
                (oy, ox),
                (ry as usize, rx as usize),
                self.block_size,
            )
        })
    }

    fn exhaustive_search(
        &self,
        current: &Frame,
        reference: &Frame,
        origin_y: usize,
        origin_x: usize,
    ) -> MotionVector {
        let r = i64::from(self.radius);
        let mut best = MotionVector::ZERO;
        let mut min_sad = u64::MAX;

        for m in -r..=r {
            for n in -r..=r {
                if let Some(sad) =
                    self.candidate_sad(current, reference, (origin_y, origin_x), (m, n))
                {
                    if sad < min_sad {
                        min_sad = sad;
                        best = MotionVector::new(m as i32, n as i32);
                    }
                }
            }
        }
        best
    }

    fn logarithmic_search(
        &self,
        current: &Frame,
        reference: &Frame,
        origin_y: usize,
        origin_x: usize,
    ) -> MotionVector {
        let mut best = MotionVector::ZERO;
        let mut min_sad = u64::MAX;
        let mut step = i64::from(self.radius / 2);

        while step >= 1 {
            for m in [-step, 0, step] {
                for n in [-step, 0, step] {
                    // Offsets are relative to the best found so far, including
                    // improvements made earlier in this pass.
                    let cand = (i64::from(best.dy) + m, i64::from(best.dx) + n);
                    if let Some(sad) =
                        self.candidate_sad(current, reference, (origin_y, origin_x), cand)
                    {
                        if sad < min_sad {
                            min_sad = sad;
                            best = MotionVector::new(cand.0 as i32, cand.1 as i32);
                        }
                    }
                }
            }
            step /= 2;
        }
        best
    }
}
