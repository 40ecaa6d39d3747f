use nalgebra::DMatrix;
use std::ops::Deref;

use crate::error::{Result, ShapeError};

/// Nod spectra stacked row-wise: one row per nod, one column per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct NodStack(DMatrix<f64>);
impl Deref for NodStack {
    type Target = DMatrix<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<DMatrix<f64>> for NodStack {
    fn from(value: DMatrix<f64>) -> Self {
        Self(value)
    }
}
impl NodStack {
    /// Stacks the nod spectra, all the spectra must have the same number of pixels
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n_pixels = rows.first().ok_or(ShapeError::Empty)?.as_ref().len();
        if let Some((nod, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.as_ref().len() != n_pixels)
        {
            return Err(ShapeError::PixelCount {
                nod,
                expected: n_pixels,
                found: row.as_ref().len(),
            }
            .into());
        }
        Ok(Self(DMatrix::from_fn(rows.len(), n_pixels, |i, j| {
            rows[i].as_ref()[j]
        })))
    }
    /// Number of nods
    pub fn n_nods(&self) -> usize {
        self.0.nrows()
    }
    /// Number of pixels per nod
    pub fn n_pixels(&self) -> usize {
        self.0.ncols()
    }
    /// Returns the spectrum of a nod
    pub fn nod(&self, nod: usize) -> Vec<f64> {
        self.0.row(nod).iter().cloned().collect()
    }
    /// Returns the values of a pixel across all the nods
    pub fn pixel(&self, pixel: usize) -> Vec<f64> {
        self.0.column(pixel).iter().cloned().collect()
    }
    pub(crate) fn set(&mut self, nod: usize, pixel: usize, value: f64) {
        self.0[(nod, pixel)] = value;
    }
    pub(crate) fn scale_nod(&mut self, nod: usize, gain: f64) {
        self.0.row_mut(nod).scale_mut(gain);
    }
    pub fn into_inner(self) -> DMatrix<f64> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn stack_rows() {
        let stack = NodStack::from_rows(&[vec![1., 2., 3.], vec![4., 5., 6.]]).unwrap();
        assert_eq!((stack.n_nods(), stack.n_pixels()), (2, 3));
        assert_eq!(stack.nod(1), vec![4., 5., 6.]);
        assert_eq!(stack.pixel(2), vec![3., 6.]);
    }
    #[test]
    fn ragged_rows() {
        let err = NodStack::from_rows(&[vec![1., 2., 3.], vec![4., 5.]]).unwrap_err();
        assert!(matches!(
            err,
            Error::Shape(ShapeError::PixelCount {
                nod: 1,
                expected: 3,
                found: 2
            })
        ));
    }
    #[test]
    fn no_rows() {
        let rows: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            NodStack::from_rows(&rows),
            Err(Error::Shape(ShapeError::Empty))
        ));
    }
}
