use std::{fmt, ops::Deref};

use strum_macros::EnumIter;

use crate::{stats, NodStack, Selection};

/// Reduction across the nods
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Mean,
    Median,
    Sum,
}
impl Method {
    /// Header value of the combination method
    pub fn header_value(&self) -> &'static str {
        match self {
            Method::Mean => "Average",
            Method::Median => "Median",
            Method::Sum => "Sum",
        }
    }
}
impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Mean => write!(f, "mean"),
            Method::Median => write!(f, "median"),
            Method::Sum => write!(f, "sum"),
        }
    }
}

/// Mean, median and sum of the nods, pixel by pixel
#[derive(Debug, Clone, PartialEq)]
pub struct NodCalcs {
    pub mean: Vec<f64>,
    pub median: Vec<f64>,
    pub sum: Vec<f64>,
}
impl NodCalcs {
    pub fn get(&self, method: Method) -> &[f64] {
        match method {
            Method::Mean => &self.mean,
            Method::Median => &self.median,
            Method::Sum => &self.sum,
        }
    }
}
/// Computes the mean, median and sum across the nods
///
/// A NaN in any nod makes the pixel NaN in all three combinations
pub fn nod_calcs(nods: &NodStack) -> NodCalcs {
    let (mean, (median, sum)): (Vec<f64>, (Vec<f64>, Vec<f64>)) = (0..nods.n_pixels())
        .map(|pixel| {
            let samples = nods.pixel(pixel);
            (
                stats::mean(&samples),
                (stats::median(&samples), samples.iter().sum::<f64>()),
            )
        })
        .unzip();
    NodCalcs { mean, median, sum }
}

/// Nods combined into a single spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSpectrum {
    data: Vec<f64>,
    pub chip: usize,
    pub selection: Selection,
    pub method: Method,
    /// bad pixels were replaced before combining
    pub repaired: bool,
}
impl Deref for CombinedSpectrum {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
impl CombinedSpectrum {
    /// Combines the nods of a chip with the given method
    pub fn new(
        nods: &NodStack,
        chip: usize,
        selection: Selection,
        method: Method,
        repaired: bool,
    ) -> Self {
        Self {
            data: nod_calcs(nods).get(method).to_vec(),
            chip,
            selection,
            method,
            repaired,
        }
    }
    pub fn into_inner(self) -> Vec<f64> {
        self.data
    }
}
impl fmt::Display for CombinedSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chip #{} {} {} combination{} ({} pixels)",
            self.chip,
            self.selection.header_value(),
            self.method,
            if self.repaired { " of repaired nods" } else { "" },
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use strum::IntoEnumIterator;

    #[test]
    fn identical_rows() {
        let row: Vec<f64> = (0..32).map(|x| (x as f64 * 0.3).cos()).collect();
        let nods = NodStack::from_rows(&vec![row.clone(); 8]).unwrap();
        let calcs = nod_calcs(&nods);
        assert_eq!(calcs.median, row);
        calcs
            .mean
            .iter()
            .zip(&row)
            .for_each(|(m, r)| assert!((m - r).abs() < 1e-12));
        calcs
            .sum
            .iter()
            .zip(&row)
            .for_each(|(s, r)| assert!((s - 8. * r).abs() < 1e-12));
    }
    #[test]
    fn random_nods() {
        let nods = NodStack::from(DMatrix::<f64>::new_random(8, 64));
        let calcs = nod_calcs(&nods);
        for pixel in 0..64 {
            let samples = nods.pixel(pixel);
            let (lo, hi) = samples
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                    (lo.min(x), hi.max(x))
                });
            assert!((calcs.mean[pixel] * 8. - calcs.sum[pixel]).abs() < 1e-12);
            assert!(calcs.median[pixel] >= lo && calcs.median[pixel] <= hi);
        }
    }
    #[test]
    fn nan_pixel() {
        let mut rows = vec![vec![1f64; 4]; 3];
        rows[1][2] = f64::NAN;
        let calcs = nod_calcs(&NodStack::from_rows(&rows).unwrap());
        for method in Method::iter() {
            assert!(calcs.get(method)[2].is_nan());
            assert!(!calcs.get(method)[1].is_nan());
        }
    }
    #[test]
    fn provenance() {
        let nods = NodStack::from_rows(&[vec![1., 2.], vec![3., 4.]]).unwrap();
        let combined = CombinedSpectrum::new(&nods, 2, Selection::Mixed, Method::Sum, true);
        assert_eq!(&*combined, &[4., 6.]);
        assert_eq!(
            combined.to_string(),
            "chip #2 Mixed sum combination of repaired nods (2 pixels)"
        );
    }
}
