use itertools::Itertools;

use super::{BadPixelSet, MAX_ITERATIONS, NEIGHBOURS, SIGMA};
use crate::{
    error::{ConfigurationError, Result},
    stats, NodStack,
};

// deviations below this fraction of the pixel value are never flagged
const TOLERANCE: f64 = 1e-12;

/// Sigma clipping bad pixels detector
///
/// The nods are first scaled to a common median level.
/// Each sample of a pixel is compared to the mean of the same pixel across the nods,
/// with the standard deviation pooled over all the nods and the [NEIGHBOURS] pixels
/// on either side, leaving aside the samples already flagged.
/// An outlier also flags the [NEIGHBOURS] pixels on either side in the same nod.
/// Detection is repeated until no new outlier is found.
#[derive(Debug, Clone)]
pub struct Detector {
    pub(crate) sigma: f64,
    pub(crate) max_iterations: usize,
    pub(crate) stop_on_consecutive: bool,
}
impl Default for Detector {
    fn default() -> Self {
        Self {
            sigma: SIGMA,
            max_iterations: MAX_ITERATIONS,
            stop_on_consecutive: false,
        }
    }
}
impl Detector {
    pub fn sigma(self, sigma: f64) -> Self {
        Self { sigma, ..self }
    }
    /// Maximum number of detection passes, 1 for a single pass
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            ..self
        }
    }
    /// Fails instead of warning if consecutive pixels are flagged in all the nods
    pub fn stop_on_consecutive(self, stop: bool) -> Self {
        Self {
            stop_on_consecutive: stop,
            ..self
        }
    }
    /// Detects the bad pixels
    pub fn detect(&self, nods: &NodStack) -> Detection {
        let leveled = leveled(nods);
        let mut bad_pixels = BadPixelSet::new();
        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;
            let outliers = self.outliers(&leveled, &bad_pixels);
            log::debug!("pass #{}: {} new outliers", iterations, outliers.len());
            if outliers.is_empty() {
                break;
            }
            for &(nod, pixel) in &outliers {
                bad_pixels.insert_outlier(nod, pixel);
            }
            let last_pixel = nods.n_pixels() - 1;
            for (nod, pixel) in outliers {
                (pixel.saturating_sub(NEIGHBOURS)..=(pixel + NEIGHBOURS).min(last_pixel))
                    .filter(|&neighbour| neighbour != pixel)
                    .for_each(|neighbour| {
                        bad_pixels.insert_neighbour(nod, neighbour);
                    });
            }
        }
        log::info!(
            "{} bad pixels found >{}sigma in {} iterations",
            bad_pixels.len(),
            self.sigma,
            iterations
        );
        Detection {
            bad_pixels,
            iterations,
        }
    }
    // outliers not yet in `flagged`
    fn outliers(&self, nods: &NodStack, flagged: &BadPixelSet) -> Vec<(usize, usize)> {
        let n_pixels = nods.n_pixels();
        let columns: Vec<Option<Column>> = (0..n_pixels)
            .map(|pixel| Column::new(nods, pixel, flagged))
            .collect();
        let mut outliers = vec![];
        for (pixel, column) in columns.iter().enumerate() {
            let mean = match column {
                Some(column) => column.mean,
                None => continue,
            };
            let window = pixel.saturating_sub(NEIGHBOURS)..=(pixel + NEIGHBOURS).min(n_pixels - 1);
            let (squares, dof) = columns[window]
                .iter()
                .flatten()
                .fold((0., 0.), |(squares, dof), column| {
                    (squares + column.squares, dof + column.dof)
                });
            let std = (squares / dof).sqrt();
            for (nod, value) in nods.pixel(pixel).into_iter().enumerate() {
                if flagged.contains(nod, pixel) {
                    continue;
                }
                let deviation = (value - mean).abs();
                if deviation > self.sigma * std && deviation > TOLERANCE * mean.abs().max(1.0) {
                    outliers.push((nod, pixel));
                }
            }
        }
        outliers
    }
}

// unflagged samples of a pixel: mean, sum of squared deviations and degrees of freedom
struct Column {
    mean: f64,
    squares: f64,
    dof: f64,
}
impl Column {
    fn new(nods: &NodStack, pixel: usize, flagged: &BadPixelSet) -> Option<Self> {
        let samples: Vec<f64> = nods
            .pixel(pixel)
            .into_iter()
            .enumerate()
            .filter(|&(nod, _)| !flagged.contains(nod, pixel))
            .map(|(_, x)| x)
            .collect();
        if samples.len() < 2 {
            return None;
        }
        let mean = stats::mean(&samples);
        Some(Self {
            mean,
            squares: samples.iter().map(|x| (x - mean).powi(2)).sum(),
            dof: (samples.len() - 1) as f64,
        })
    }
}

/// Scales each nod to the median of the nods median levels
///
/// Nods with a non positive or undefined level are left as they are.
fn leveled(nods: &NodStack) -> NodStack {
    let levels: Vec<f64> = (0..nods.n_nods())
        .map(|nod| stats::median(&nods.nod(nod)))
        .collect();
    let reference = stats::median(&levels);
    let mut leveled = nods.clone();
    for (nod, level) in levels.into_iter().enumerate() {
        let gain = reference / level;
        if level > 0. && gain > 0. && gain.is_finite() {
            leveled.scale_nod(nod, gain);
        }
    }
    leveled
}

/// Outcome of the bad pixels detection
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub bad_pixels: BadPixelSet,
    /// number of detection passes
    pub iterations: usize,
}

/// Detects the bad pixels at `sigma` standard deviations
pub fn detect(nods: &NodStack, sigma: f64) -> Detection {
    Detector::default().sigma(sigma).detect(nods)
}

/// Warns about consecutive pixels that are flagged in all the nods
///
/// This is a symptom of a threshold too close to the noise.
/// If `stop` is set, an error is returned instead.
pub fn warn_consecutive(bad_pixels: &BadPixelSet, n_nods: usize, stop: bool) -> Result<()> {
    let counts = bad_pixels.iter().map(|(_, pixel)| pixel).counts();
    let consecutive: Vec<usize> = counts
        .into_iter()
        .filter(|&(_, count)| count == n_nods)
        .map(|(pixel, _)| pixel)
        .sorted()
        .tuple_windows()
        .filter(|(a, b)| a + 1 == *b)
        .flat_map(|(a, b)| [a, b])
        .dedup()
        .collect();
    if consecutive.is_empty() {
        return Ok(());
    }
    if stop {
        Err(ConfigurationError::ConsecutiveBadPixels(consecutive).into())
    } else {
        log::warn!(
            "consecutive bad pixels found in all nods at pixels {:?}",
            consecutive
        );
        Ok(())
    }
}
