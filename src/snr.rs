//! Signal to noise ratio of the combined spectra
//!
//! The SNR is sampled in a continuum window of each chip, free of absorption lines.

use std::fmt;

use crate::{
    bad_pixels::Detector,
    combine::{nod_calcs, Method, NodCalcs},
    error::{ConfigurationError, Result, ShapeError},
    selection::select_from,
    stats, NodSpectrum, NodStack, QualityMask, Selection, CHIP_NUM,
};

/// Continuum pixel windows `[lo, hi)` of chips 1 to 4
pub const CONTINUUM_WINDOWS: [(usize, usize); CHIP_NUM] =
    [(900, 960), (460, 600), (240, 310), (450, 490)];

/// Returns the continuum window of a chip, chips are numbered from 1
pub fn continuum_window(chip: usize) -> Result<(usize, usize)> {
    chip.checked_sub(1)
        .and_then(|idx| CONTINUUM_WINDOWS.get(idx))
        .copied()
        .ok_or_else(|| ConfigurationError::Chip(chip).into())
}

/// Mean over standard deviation of the spectrum in the continuum window of the chip
///
/// A constant window gives an infinite ratio, or NaN if it is zero
pub fn sampled_snr(spectrum: &[f64], chip: usize) -> Result<f64> {
    let (lo, hi) = continuum_window(chip)?;
    let window = spectrum.get(lo..hi).ok_or(ShapeError::Window {
        len: spectrum.len(),
        lo,
        hi,
    })?;
    let (mean, std) = stats::mean_std(window);
    Ok(mean / std)
}

fn calcs_snr(calcs: &NodCalcs, chip: usize) -> Result<[f64; 3]> {
    Ok([
        sampled_snr(calcs.get(Method::Mean), chip)?,
        sampled_snr(calcs.get(Method::Median), chip)?,
        sampled_snr(calcs.get(Method::Sum), chip)?,
    ])
}

/// SNR of the combinations of a nods selection, before and after cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct SnrRow {
    pub selection: Selection,
    pub normalized: bool,
    /// mean, median and sum SNR of the raw nods
    pub raw: [f64; 3],
    /// mean, median and sum SNR of the cleaned nods
    pub cleaned: [f64; 3],
    pub bad_pixels: usize,
}
/// SNR of every nods selection of a chip
#[derive(Debug, Clone, PartialEq)]
pub struct SnrReport {
    pub chip: usize,
    pub rows: Vec<SnrRow>,
}
impl SnrReport {
    pub fn get(&self, selection: Selection, normalized: bool) -> Option<&SnrRow> {
        self.rows
            .iter()
            .find(|row| row.selection == selection && row.normalized == normalized)
    }
}
impl fmt::Display for SnrReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Chip #{} SNR:", self.chip)?;
        writeln!(
            f,
            "{:<18} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>5}",
            "", "mean", "median", "sum", "fix mean", "fix med", "fix sum", "bad"
        )?;
        for row in &self.rows {
            let name = format!(
                "{}{}",
                row.selection,
                if row.normalized { " (norm)" } else { "" }
            );
            write!(f, "{:<18}", name)?;
            for snr in row.raw.iter().chain(&row.cleaned) {
                write!(f, " {:>9.2}", snr)?;
            }
            writeln!(f, " {:>5}", row.bad_pixels)?;
        }
        Ok(())
    }
}

/// Computes the SNR of the optimal, non-optimal and, with a mask, mixed selections
/// of the un-normalized and normalized nods
pub fn snr_report(
    chip: usize,
    nods: &[NodSpectrum],
    norm_nods: &[NodSpectrum],
    mask: Option<&QualityMask>,
    detector: &Detector,
) -> Result<SnrReport> {
    let mut selections = vec![Selection::Optimal, Selection::NonOptimal];
    if mask.is_some() {
        selections.push(Selection::Mixed);
    }
    let mut rows = vec![];
    for selection in selections {
        for (normalized, nods) in [(false, nods), (true, norm_nods)] {
            let stack = NodStack::from_rows(&select_from(nods.to_vec(), chip, selection, mask)?)?;
            let raw = calcs_snr(&nod_calcs(&stack), chip)?;
            let cleaned = detector.clean_nods(&stack)?;
            rows.push(SnrRow {
                selection,
                normalized,
                raw,
                cleaned: calcs_snr(&nod_calcs(&cleaned.nods), chip)?,
                bad_pixels: cleaned.bad_pixels.len(),
            });
        }
    }
    Ok(SnrReport { chip, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn noisy(rng: &mut StdRng, level: f64) -> Vec<f64> {
        (0..crate::N_PIXELS)
            .map(|_| level + rng.gen_range(-1f64..1f64))
            .collect()
    }

    #[test]
    fn uniform_noise() {
        let mut rng = StdRng::seed_from_u64(7);
        let spectrum = noisy(&mut rng, 100.);
        // 100 / (1/√3)
        let snr = sampled_snr(&spectrum, 2).unwrap();
        assert!(snr > 140. && snr < 220., "{snr}");
    }
    #[test]
    fn constant_window() {
        assert_eq!(sampled_snr(&vec![2.; 1024], 1).unwrap(), f64::INFINITY);
        assert!(sampled_snr(&vec![0.; 1024], 4).unwrap().is_nan());
    }
    #[test]
    fn chip_and_length() {
        assert!(matches!(
            sampled_snr(&[1.; 1024], 5),
            Err(Error::Configuration(ConfigurationError::Chip(5)))
        ));
        assert!(matches!(
            sampled_snr(&[1.; 1024], 0),
            Err(Error::Configuration(ConfigurationError::Chip(0)))
        ));
        assert!(matches!(
            sampled_snr(&[1.; 500], 1),
            Err(Error::Shape(ShapeError::Window {
                len: 500,
                lo: 900,
                hi: 960
            }))
        ));
    }
    #[test]
    fn report() {
        let mut rng = StdRng::seed_from_u64(11);
        let nods: Vec<NodSpectrum> = (0..crate::NOD_NUM)
            .map(|i| {
                NodSpectrum::new(
                    format!("nod{i}"),
                    noisy(&mut rng, 100.),
                    noisy(&mut rng, 50.),
                )
            })
            .collect();
        let norm_nods: Vec<NodSpectrum> = nods
            .iter()
            .map(|nod| {
                NodSpectrum::new(
                    nod.name(),
                    nod.band(crate::Band::Optimal).iter().map(|x| x / 100.).collect(),
                    nod.band(crate::Band::NonOptimal).iter().map(|x| x / 50.).collect(),
                )
            })
            .collect();
        let detector = Detector::default();
        let report = snr_report(3, &nods, &norm_nods, None, &detector).unwrap();
        assert_eq!(report.rows.len(), 4);
        let raw = report.get(Selection::Optimal, false).unwrap().raw;
        let norm = report.get(Selection::Optimal, true).unwrap().raw;
        assert!((raw[0] / norm[0] - 1.).abs() < 1e-6);
        assert!(raw.iter().all(|snr| snr.is_finite() && *snr > 0.));

        let mask = QualityMask::parse(&"11110000\n".repeat(4), crate::NOD_NUM).unwrap();
        let report = snr_report(3, &nods, &norm_nods, Some(&mask), &detector).unwrap();
        assert_eq!(report.rows.len(), 6);
        assert!(report.get(Selection::Mixed, true).is_some());
        assert_eq!(report.to_string().lines().count(), 8);
    }
}
