//! Motion vectors and per-block motion fields.

use mocomp_core::{CodecError, FrameDims, Result};
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Displacement of a block, in whole pixels.
///
/// `dy` is the row offset and `dx` the column offset into the reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub dy: i32,
    pub dx: i32,
}

impl MotionVector {
    pub const ZERO: Self = Self { dy: 0, dx: 0 };

    pub const fn new(dy: i32, dx: i32) -> Self {
        Self { dy, dx }
    }

    pub fn is_zero(&self) -> bool {
        self.dy == 0 && self.dx == 0
    }

    /// Euclidean length.
    pub fn magnitude(&self) -> f64 {
        f64::from(self.dy).hypot(f64::from(self.dx))
    }

    /// Largest absolute component.
    pub fn max_abs(&self) -> u32 {
        self.dy.unsigned_abs().max(self.dx.unsigned_abs())
    }
}

impl Add for MotionVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.dy + rhs.dy, self.dx + rhs.dx)
    }
}

/// Storage width of one vector component in a packed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorWidth {
    I8,
    I16,
}

impl VectorWidth {
    /// Narrowest width holding every component up to `reach` in magnitude.
    pub fn for_reach(reach: u32) -> Result<Self> {
        if reach <= i8::MAX as u32 {
            Ok(Self::I8)
        } else if reach <= i16::MAX as u32 {
            Ok(Self::I16)
        } else {
            Err(CodecError::InvalidParameter(format!(
                "search reach {reach} exceeds 16-bit vector storage"
            )))
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
        }
    }

    fn component_bytes(self) -> usize {
        match self {
            Self::I8 => 1,
            Self::I16 => 2,
        }
    }

    fn tag(self) -> u8 {
        match self {
            Self::I8 => 1,
            Self::I16 => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(Self::I8),
            2 => Ok(Self::I16),
            other => Err(CodecError::InvalidData(format!(
                "unknown vector width tag {other}"
            ))),
        }
    }

    fn limit(self) -> i32 {
        match self {
            Self::I8 => i8::MAX as i32,
            Self::I16 => i16::MAX as i32,
        }
    }
}

/// Packed header: width tag + block size + rows + cols.
const HEADER_LEN: usize = 1 + 4 * 3;

/// A grid of motion vectors, one per full block of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionField {
    rows: usize,
    cols: usize,
    block_size: usize,
    vectors: Vec<MotionVector>,
}

impl MotionField {
    /// All-zero field for a grid.
    pub fn zeros(rows: usize, cols: usize, block_size: usize) -> Self {
        Self {
            rows,
            cols,
            block_size,
            vectors: vec![MotionVector::ZERO; rows * cols],
        }
    }

    /// All-zero field covering the full blocks of a frame.
    pub fn for_frame(dims: FrameDims, block_size: usize) -> Self {
        let (rows, cols) = dims.block_grid(block_size);
        Self::zeros(rows, cols, block_size)
    }

    /// Wrap raster-ordered vectors.
    pub fn from_vectors(
        rows: usize,
        cols: usize,
        block_size: usize,
        vectors: Vec<MotionVector>,
    ) -> Result<Self> {
        if vectors.len() != rows * cols {
            return Err(CodecError::InvalidData(format!(
                "{} vectors supplied for a {rows}x{cols} grid",
                vectors.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            block_size,
            vectors,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn vectors(&self) -> &[MotionVector] {
        &self.vectors
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> MotionVector {
        self.vectors[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, vector: MotionVector) {
        self.vectors[row * self.cols + col] = vector;
    }

    /// `(row, col, vector)` for every block in raster order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, usize, MotionVector)> + '_ {
        self.vectors
            .iter()
            .enumerate()
            .map(move |(i, v)| (i / self.cols.max(1), i % self.cols.max(1), *v))
    }

    /// Check that this field describes the block grid of a frame with `dims`.
    pub fn check_fits(&self, dims: FrameDims) -> Result<()> {
        if self.block_size == 0 || dims.block_grid(self.block_size) != (self.rows, self.cols) {
            return Err(CodecError::BlockSizeMismatch {
                rows: self.rows,
                cols: self.cols,
                block_size: self.block_size,
                frame: dims,
            });
        }
        Ok(())
    }

    /// Largest absolute component over the field.
    pub fn max_component(&self) -> u32 {
        self.vectors.iter().map(MotionVector::max_abs).max().unwrap_or(0)
    }

    pub fn zero_vectors(&self) -> usize {
        self.vectors.iter().filter(|v| v.is_zero()).count()
    }

    /// Mean Euclidean vector length, 0 for an empty field.
    pub fn mean_magnitude(&self) -> f64 {
        if self.vectors.is_empty() {
            return 0.0;
        }
        self.vectors.iter().map(MotionVector::magnitude).sum::<f64>() / self.vectors.len() as f64
    }

    /// Pack into little-endian bytes with the given component width.
    ///
    /// Fails with [`CodecError::VectorOverflow`] instead of truncating.
    pub fn to_bytes(&self, width: VectorWidth) -> Result<Vec<u8>> {
        let mut out =
            Vec::with_capacity(HEADER_LEN + self.vectors.len() * 2 * width.component_bytes());
        out.push(width.tag());
        for dim in [self.block_size, self.rows, self.cols] {
            let dim = u32::try_from(dim).map_err(|_| {
                CodecError::InvalidParameter(format!("field dimension {dim} exceeds u32"))
            })?;
            out.extend_from_slice(&dim.to_le_bytes());
        }

        let limit = width.limit();
        for v in &self.vectors {
            if v.dy.abs() > limit || v.dx.abs() > limit {
                return Err(CodecError::VectorOverflow {
                    dy: v.dy,
                    dx: v.dx,
                    width: width.name(),
                });
            }
            for component in [v.dy, v.dx] {
                match width {
                    VectorWidth::I8 => out.push(component as i8 as u8),
                    VectorWidth::I16 => out.extend_from_slice(&(component as i16).to_le_bytes()),
                }
            }
        }
        Ok(out)
    }

    /// Inverse of [`MotionField::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::InvalidData(format!(
                "motion field needs {HEADER_LEN} header bytes, got {}",
                bytes.len()
            )));
        }
        let width = VectorWidth::from_tag(bytes[0])?;
        let read_u32 = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
        };
        let block_size = read_u32(1);
        let rows = read_u32(5);
        let cols = read_u32(9);

        let body = &bytes[HEADER_LEN..];
        let per_vector = 2 * width.component_bytes();
        let expected = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(per_vector))
            .ok_or_else(|| {
                CodecError::InvalidData(format!("motion field grid {rows}x{cols} is too large"))
            })?;
        if body.len() != expected {
            return Err(CodecError::InvalidData(format!(
                "motion field body is {} bytes, expected {expected}",
                body.len()
            )));
        }

        let vectors = body
            .chunks_exact(per_vector)
            .map(|chunk| match width {
                VectorWidth::I8 => MotionVector::new(chunk[0] as i8 as i32, chunk[1] as i8 as i32),
                VectorWidth::I16 => MotionVector::new(
                    i16::from_le_bytes([chunk[0], chunk[1]]) as i32,
                    i16::from_le_bytes([chunk[2], chunk[3]]) as i32,
                ),
            })
            .collect();
        Self::from_vectors(rows, cols, block_size, vectors)
    }
}
