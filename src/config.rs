//! Nods combination options
//!
//! Directory layout of an observation:
//!  - `Intermediate_steps/`: nod spectra `CRIRE*_<chip>.ms.norm.npy` and `CRIRE*_<chip>.ms.npy`
//!  - `Combined_Nods/`: reference combinations `CRIRE*_<chip>.ms.norm.sum.npy`
//!    and the combined spectra
//!  - `images/`: plots

use std::path::{Path, PathBuf};

use crate::{
    bad_pixels::{Detector, SIGMA},
    error::{ConfigurationError, Result},
    sink::OutputVerify,
    Selection, NOD_NUM,
};

/// Nod spectra sub-directory
pub const INTERMEDIATE_DIR: &str = "Intermediate_steps";
/// Combined spectra sub-directory
pub const COMBINED_DIR: &str = "Combined_Nods";
/// Plots sub-directory
pub const IMAGES_DIR: &str = "images";
/// Reference combinations file pattern
pub const REFERENCE_PATTERN: &str = "CRIRE*norm.sum.npy";

/// Nods combination options
#[derive(Debug, Clone)]
pub struct CombineOptions {
    pub(crate) path: PathBuf,
    pub(crate) combination: Selection,
    pub(crate) optimal_nods: Option<PathBuf>,
    pub(crate) spectral_coords: bool,
    pub(crate) nod_num: usize,
    pub(crate) unnorm: bool,
    pub(crate) snr: bool,
    pub(crate) plot: bool,
    pub(crate) output_verify: OutputVerify,
    pub(crate) overwrite: bool,
    pub(crate) sigma: f64,
    pub(crate) stop: bool,
}
impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            combination: Selection::All,
            optimal_nods: None,
            spectral_coords: false,
            nod_num: NOD_NUM,
            unnorm: false,
            snr: false,
            plot: false,
            output_verify: OutputVerify::default(),
            overwrite: false,
            sigma: SIGMA,
            stop: false,
        }
    }
}
impl CombineOptions {
    /// Options for the observation in `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
    pub fn combination(self, combination: Selection) -> Self {
        Self {
            combination,
            ..self
        }
    }
    /// Path to the optimal nods grid
    pub fn optimal_nods<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            optimal_nods: Some(path.as_ref().to_path_buf()),
            ..self
        }
    }
    pub fn spectral_coords(self, spectral_coords: bool) -> Self {
        Self {
            spectral_coords,
            ..self
        }
    }
    pub fn nod_num(self, nod_num: usize) -> Self {
        Self { nod_num, ..self }
    }
    /// Combines the un-normalized nod spectra
    pub fn unnorm(self, unnorm: bool) -> Self {
        Self { unnorm, ..self }
    }
    /// Reports the SNR of all the combinations
    pub fn snr(self, snr: bool) -> Self {
        Self { snr, ..self }
    }
    pub fn plot(self, plot: bool) -> Self {
        Self { plot, ..self }
    }
    pub fn output_verify(self, output_verify: OutputVerify) -> Self {
        Self {
            output_verify,
            ..self
        }
    }
    pub fn overwrite(self, overwrite: bool) -> Self {
        Self { overwrite, ..self }
    }
    /// Bad pixels detection threshold
    pub fn sigma(self, sigma: f64) -> Self {
        Self { sigma, ..self }
    }
    /// Stops on consecutive bad pixels in all the nods
    pub fn stop(self, stop: bool) -> Self {
        Self { stop, ..self }
    }
    /// Checks that the options are supported
    pub fn validate(&self) -> Result<()> {
        if self.spectral_coords {
            return Err(ConfigurationError::SpectralCoordinates.into());
        }
        if self.nod_num != NOD_NUM {
            return Err(ConfigurationError::NodNumber(self.nod_num).into());
        }
        if self.optimal_nods.is_none()
            && matches!(self.combination, Selection::Mixed | Selection::All)
        {
            return Err(ConfigurationError::MissingMask(self.combination.to_string()).into());
        }
        Ok(())
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn selection(&self) -> Selection {
        self.combination
    }
    pub fn mask_path(&self) -> Option<&Path> {
        self.optimal_nods.as_deref()
    }
    pub fn intermediate_dir(&self) -> PathBuf {
        self.path.join(INTERMEDIATE_DIR)
    }
    pub fn combined_dir(&self) -> PathBuf {
        self.path.join(COMBINED_DIR)
    }
    pub fn images_dir(&self) -> PathBuf {
        self.path.join(IMAGES_DIR)
    }
    /// Nod spectra file pattern and the word splitting the output file names
    pub fn nod_pattern(&self) -> (&'static str, &'static str) {
        if self.unnorm {
            ("CRIRE*.ms.npy", "ms")
        } else {
            ("CRIRE*.ms.norm.npy", "ms.norm")
        }
    }
    /// The other nod spectra file pattern, used for the SNR report
    pub fn other_nod_pattern(&self) -> (&'static str, &'static str) {
        Self {
            unnorm: !self.unnorm,
            ..self.clone()
        }
        .nod_pattern()
    }
    pub fn detector(&self) -> Detector {
        Detector::default()
            .sigma(self.sigma)
            .stop_on_consecutive(self.stop)
    }
}
