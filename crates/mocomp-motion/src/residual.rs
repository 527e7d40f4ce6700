//! Residual computation and reconstruction.
//!
//! Differences are taken in 16 bits, so encoding never wraps. Reconstruction
//! comes in two flavours: [`reconstruct`] clips to `[0, 255]`, while
//! [`reconstruct_wrapping`] narrows modulo 256 like unsigned 8-bit arithmetic.

use mocomp_core::{CodecError, Frame, FrameDims, Raster, ResidualFrame, Result, Sample};

fn check_dims<A: Sample, B: Sample>(a: &Raster<A>, b: &Raster<B>) -> Result<FrameDims> {
    if a.dims() != b.dims() {
        return Err(CodecError::OperandMismatch {
            left: a.dims(),
            right: b.dims(),
        });
    }
    Ok(a.dims())
}

/// `actual - predicted`, per sample.
pub fn compute_residual(actual: &Frame, predicted: &Frame) -> Result<ResidualFrame> {
    let dims = check_dims(actual, predicted)?;
    let data = actual
        .data()
        .iter()
        .zip(predicted.data())
        .map(|(&a, &p)| i16::from(a) - i16::from(p))
        .collect();
    ResidualFrame::from_raw(dims, data)
}

/// `predicted + residual`, clipped to the 8-bit sample range.
pub fn reconstruct(predicted: &Frame, residual: &ResidualFrame) -> Result<Frame> {
    let dims = check_dims(predicted, residual)?;
    let data = predicted
        .data()
        .iter()
        .zip(residual.data())
        .map(|(&p, &r)| (i32::from(p) + i32::from(r)).clamp(0, 255) as u8)
        .collect();
    Frame::from_raw(dims, data)
}

/// `predicted + residual`, narrowed modulo 256 without clipping.
pub fn reconstruct_wrapping(predicted: &Frame, residual: &ResidualFrame) -> Result<Frame> {
    let dims = check_dims(predicted, residual)?;
    let data = predicted
        .data()
        .iter()
        .zip(residual.data())
        .map(|(&p, &r)| (i32::from(p) + i32::from(r)) as u8)
        .collect();
    Frame::from_raw(dims, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(values: &[u8]) -> Frame {
        Frame::from_raw(FrameDims::new(values.len() as u32, 1, 1), values.to_vec()).unwrap()
    }

    #[test]
    fn test_residual_does_not_wrap() {
        let residual = compute_residual(&frame(&[0, 255, 10]), &frame(&[255, 0, 10])).unwrap();
        assert_eq!(residual.data(), &[-255, 255, 0]);
    }

    #[test]
    fn test_reconstruct_inverts_residual() {
        let actual = frame(&[0, 17, 128, 255]);
        let predicted = frame(&[255, 3, 130, 0]);
        let residual = compute_residual(&actual, &predicted).unwrap();
        assert_eq!(reconstruct(&predicted, &residual).unwrap(), actual);
        assert_eq!(reconstruct_wrapping(&predicted, &residual).unwrap(), actual);
    }

    #[test]
    fn test_reconstruct_clips() {
        let predicted = frame(&[250, 5]);
        let residual = ResidualFrame::from_raw(FrameDims::new(2, 1, 1), vec![10, -10]).unwrap();
        assert_eq!(reconstruct(&predicted, &residual).unwrap().data(), &[255, 0]);
    }

    #[test]
    fn test_reconstruct_wrapping_wraps() {
        let predicted = frame(&[250, 5]);
        let residual = ResidualFrame::from_raw(FrameDims::new(2, 1, 1), vec![10, -10]).unwrap();
        assert_eq!(
            reconstruct_wrapping(&predicted, &residual).unwrap().data(),
            &[4, 251]
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(matches!(
            compute_residual(&frame(&[1, 2]), &frame(&[1, 2, 3])),
            Err(CodecError::OperandMismatch { .. })
        ));
    }
}
