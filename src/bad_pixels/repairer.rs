use super::BadPixelSet;
use crate::{
    error::{Result, ShapeError},
    NodStack,
};

/// Replaces the bad pixels by interpolation along each nod spectrum
///
/// A flagged pixel is linearly interpolated between the nearest unflagged pixels
/// on each side, or set to the nearest unflagged pixel at the edges of the spectrum.
/// The input nods are left untouched.
pub fn repair(nods: &NodStack, bad_pixels: &BadPixelSet) -> Result<NodStack> {
    let shape = (nods.n_nods(), nods.n_pixels());
    if let Some((nod, pixel)) = bad_pixels
        .iter()
        .find(|&(nod, pixel)| nod >= shape.0 || pixel >= shape.1)
    {
        return Err(ShapeError::Coordinate { nod, pixel, shape }.into());
    }
    let mut fixed = nods.clone();
    for nod in 0..nods.n_nods() {
        let flagged = bad_pixels.pixels_in(nod);
        if flagged.is_empty() {
            continue;
        }
        if flagged.len() == nods.n_pixels() {
            return Err(ShapeError::Unrepairable(nod).into());
        }
        let spectrum = nods.nod(nod);
        for &pixel in &flagged {
            let left = (0..pixel).rev().find(|p| !flagged.contains(p));
            let right = (pixel + 1..spectrum.len()).find(|p| !flagged.contains(p));
            let value = match (left, right) {
                (Some(l), Some(r)) => {
                    let t = (pixel - l) as f64 / (r - l) as f64;
                    spectrum[l] + t * (spectrum[r] - spectrum[l])
                }
                (Some(l), None) => spectrum[l],
                (None, Some(r)) => spectrum[r],
                (None, None) => return Err(ShapeError::Unrepairable(nod).into()),
            };
            fixed.set(nod, pixel, value);
        }
    }
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ramp() -> NodStack {
        let rows: Vec<Vec<f64>> = (0..4)
            .map(|i| (0..10).map(|j| (i * 10 + j) as f64).collect())
            .collect();
        NodStack::from_rows(&rows).unwrap()
    }

    #[test]
    fn empty_set() {
        let nods = ramp();
        assert_eq!(repair(&nods, &BadPixelSet::new()).unwrap(), nods);
    }
    #[test]
    fn interpolation() {
        let mut rows = vec![vec![0f64; 10]; 3];
        rows[1] = vec![0., 1., 2., 50., -40., 5., 6., 7., 8., 9.];
        let nods = NodStack::from_rows(&rows).unwrap();
        let bad_pixels: BadPixelSet = [(1, 3), (1, 4)].into_iter().collect();
        let fixed = repair(&nods, &bad_pixels).unwrap();
        assert_eq!(fixed.nod(1), (0..10).map(|x| x as f64).collect::<Vec<_>>());
        assert_eq!(fixed.nod(0), nods.nod(0));
        assert_eq!(nods[(1, 3)], 50.);
    }
    #[test]
    fn edges() {
        let rows = vec![vec![100., 100., 3., 4., 5., 6., 7., -100.]];
        let nods = NodStack::from_rows(&rows).unwrap();
        let bad_pixels: BadPixelSet = [(0, 0), (0, 1), (0, 7)].into_iter().collect();
        let fixed = repair(&nods, &bad_pixels).unwrap();
        assert_eq!(fixed.nod(0), vec![3., 3., 3., 4., 5., 6., 7., 7.]);
    }
    #[test]
    fn flagged_coordinates_change() {
        let mut rows = vec![vec![1f64; 12]; 8];
        let outliers = [(0, 0), (2, 6), (5, 11), (7, 3)];
        for &(nod, pixel) in &outliers {
            rows[nod][pixel] = 7.5;
        }
        let nods = NodStack::from_rows(&rows).unwrap();
        let bad_pixels: BadPixelSet = outliers.into_iter().collect();
        let fixed = repair(&nods, &bad_pixels).unwrap();
        assert!(bad_pixels
            .iter()
            .all(|(nod, pixel)| fixed[(nod, pixel)] != nods[(nod, pixel)]));
    }
    #[test]
    fn whole_nod_flagged() {
        let nods = ramp();
        let bad_pixels: BadPixelSet = (0..10).map(|pixel| (2, pixel)).collect();
        assert!(matches!(
            repair(&nods, &bad_pixels),
            Err(Error::Shape(ShapeError::Unrepairable(2)))
        ));
    }
    #[test]
    fn outside_coordinates() {
        let nods = ramp();
        let bad_pixels: BadPixelSet = [(1, 10)].into_iter().collect();
        assert!(matches!(
            repair(&nods, &bad_pixels),
            Err(Error::Shape(ShapeError::Coordinate { nod: 1, pixel: 10, .. }))
        ));
    }
}
