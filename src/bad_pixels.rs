//! Bad pixels detection and replacement
//!
//! Outliers are detected with a sigma clipping of each pixel across the nods and
//! replaced by a linear interpolation along the spectrum of the same nod.
//!
//! ```
//! use nod_combination::{bad_pixels, NodStack};
//!
//! let mut rows = vec![vec![1f64; 16]; 8];
//! rows[3][5] = 9.;
//! let nods = NodStack::from_rows(&rows)?;
//! let cleaned = bad_pixels::clean_nods(&nods)?;
//! assert_eq!(cleaned.bad_pixels.len(), 5);
//! assert_eq!(cleaned.nods.nod(3), vec![1f64; 16]);
//! # Ok::<(), nod_combination::Error>(())
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{
    error::{Result, ShapeError},
    NodStack,
};

mod detector;
mod repairer;
pub use detector::{detect, warn_consecutive, Detection, Detector};
pub use repairer::repair;

/// Default detection threshold in standard deviations
pub const SIGMA: f64 = 4.0;
/// Number of pixels flagged on either side of an outlier
pub const NEIGHBOURS: usize = 2;
/// Default maximum number of detection passes
pub const MAX_ITERATIONS: usize = 10;

/// Reason a pixel is flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// the pixel deviates from the other nods
    Outlier,
    /// the pixel is next to an outlier of the same nod
    Neighbour,
}

/// Flagged (nod, pixel) coordinates of a [NodStack]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BadPixelSet(BTreeMap<(usize, usize), Flag>);
impl BadPixelSet {
    pub fn new() -> Self {
        Default::default()
    }
    /// Flags an outlier, returns `false` if it was already flagged as such
    pub fn insert_outlier(&mut self, nod: usize, pixel: usize) -> bool {
        self.0.insert((nod, pixel), Flag::Outlier) != Some(Flag::Outlier)
    }
    /// Flags the neighbour of an outlier, an outlier flag is never downgraded
    pub fn insert_neighbour(&mut self, nod: usize, pixel: usize) -> bool {
        let mut inserted = false;
        self.0.entry((nod, pixel)).or_insert_with(|| {
            inserted = true;
            Flag::Neighbour
        });
        inserted
    }
    pub fn contains(&self, nod: usize, pixel: usize) -> bool {
        self.0.contains_key(&(nod, pixel))
    }
    pub fn flag(&self, nod: usize, pixel: usize) -> Option<Flag> {
        self.0.get(&(nod, pixel)).copied()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Iterator over the flagged (nod, pixel) coordinates in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.keys().copied()
    }
    /// Iterator over the detected outliers only
    pub fn outliers(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0
            .iter()
            .filter(|(_, flag)| **flag == Flag::Outlier)
            .map(|(k, _)| *k)
    }
    /// Returns the flagged pixels of a given nod
    pub fn pixels_in(&self, nod: usize) -> BTreeSet<usize> {
        self.0
            .range((nod, 0)..=(nod, usize::MAX))
            .map(|((_, pixel), _)| *pixel)
            .collect()
    }
}
impl FromIterator<(usize, usize)> for BadPixelSet {
    fn from_iter<T: IntoIterator<Item = (usize, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|k| (k, Flag::Outlier)).collect())
    }
}
impl fmt::Display for BadPixelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (nod, pixel)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({}, {})", nod, pixel)?;
        }
        write!(f, "]")
    }
}

/// Nod spectra with the bad pixels replaced
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub nods: NodStack,
    pub bad_pixels: BadPixelSet,
    /// number of detection passes
    pub iterations: usize,
}
impl Detector {
    /// Detects, reports and replaces the bad pixels
    ///
    /// Every detected outlier must have changed once repaired
    pub fn clean_nods(&self, nods: &NodStack) -> Result<Cleaned> {
        let Detection {
            bad_pixels,
            iterations,
        } = self.detect(nods);
        warn_consecutive(&bad_pixels, nods.n_nods(), self.stop_on_consecutive)?;
        let fixed = repair(nods, &bad_pixels)?;
        log::info!("Number of bad pixels = {}", bad_pixels.len());
        if let Some((nod, pixel)) = bad_pixels
            .outliers()
            .find(|&(nod, pixel)| fixed[(nod, pixel)] == nods[(nod, pixel)])
        {
            return Err(ShapeError::Unrepaired { nod, pixel }.into());
        }
        Ok(Cleaned {
            nods: fixed,
            bad_pixels,
            iterations,
        })
    }
}
/// Cleans the nods with the default [Detector]
pub fn clean_nods(nods: &NodStack) -> Result<Cleaned> {
    Detector::default().clean_nods(nods)
}
