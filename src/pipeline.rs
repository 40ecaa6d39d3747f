//! Nods combination of an observation
//!
//! For each chip, the nods are selected, cleaned of bad pixels and averaged
//! for every requested selection method, then the combined spectra are saved
//! in the `Combined_Nods` directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;

use crate::{
    bad_pixels::{BadPixelSet, Detector, NEIGHBOURS},
    combine::Method,
    config::{CombineOptions, REFERENCE_PATTERN},
    discovery::get_filenames,
    error::{Error, Result},
    selection::{chip_pattern, select_from, NodDirectory, NodSource},
    sink::{header_path, NpySink, SpectrumSink},
    snr::snr_report,
    CombinedSpectrum, Header, NodSpectrum, NodStack, QualityMask, ReferenceCombination,
    Selection, CHIP_NUM,
};

/// Nods averaged with and without bad pixels repair
#[derive(Debug, Clone)]
pub struct Combination {
    pub raw: CombinedSpectrum,
    pub fixed: CombinedSpectrum,
    pub bad_pixels: BadPixelSet,
}
/// Selects, cleans and averages the nods of a chip
pub fn combine(
    nods: &[NodSpectrum],
    chip: usize,
    selection: Selection,
    mask: Option<&QualityMask>,
    detector: &Detector,
) -> Result<Combination> {
    let stack = NodStack::from_rows(&select_from(nods.to_vec(), chip, selection, mask)?)?;
    let cleaned = detector.clean_nods(&stack)?;
    Ok(Combination {
        raw: CombinedSpectrum::new(&stack, chip, selection, Method::Mean, false),
        fixed: CombinedSpectrum::new(&cleaned.nods, chip, selection, Method::Mean, true),
        bad_pixels: cleaned.bad_pixels,
    })
}

/// Header of a combined spectrum
pub fn combination_header(
    mut header: Header,
    selection: Selection,
    bad_pixels: &BadPixelSet,
    sigma: f64,
) -> Header {
    header
        .set(
            "NodSelectionMethod",
            selection.header_value(),
            "Method of selecting nod spectra.",
        )
        .set(
            "CombinationMethod",
            Method::Mean.header_value(),
            "Method of combing nod spectra.",
        )
        .set(
            "BadPixelNum",
            bad_pixels.len(),
            "Number of points removed from nod spectra.",
        )
        .comment(format!("{} sigma bad pixel detection performed", sigma))
        .comment(format!(
            "All nods and {} pixels either side of each pixel recursively.",
            NEIGHBOURS
        ))
        .comment(format!("Bad pixels found >{}sigma = {}", sigma, bad_pixels));
    header
}

/// Name of a combined spectrum file: the first nod file name up to `split`
/// followed by `split` and the selection extension
pub fn output_name(first_nod: &str, split: &str, selection: Selection) -> String {
    let prefix = first_nod.split(split).next().unwrap_or(first_nod);
    format!("{}{}{}.npy", prefix, split, selection.extension())
}

/// Observation nods combination
pub struct NodCombination<S: SpectrumSink = NpySink> {
    options: CombineOptions,
    mask: Option<QualityMask>,
    sink: S,
}
impl NodCombination<NpySink> {
    /// Checks the options and loads the optimal nods grid
    pub fn new(options: CombineOptions) -> Result<Self> {
        options.validate()?;
        let mask = options
            .mask_path()
            .map(|path| QualityMask::from_path(path, options.nod_num))
            .transpose()?;
        let sink = NpySink::new()
            .overwrite(options.overwrite)
            .output_verify(options.output_verify);
        Ok(Self {
            options,
            mask,
            sink,
        })
    }
}
impl<S: SpectrumSink> NodCombination<S> {
    /// Replaces the combined spectra storage
    pub fn with_sink<T: SpectrumSink>(self, sink: T) -> NodCombination<T> {
        NodCombination {
            options: self.options,
            mask: self.mask,
            sink,
        }
    }
    pub fn options(&self) -> &CombineOptions {
        &self.options
    }
    pub fn mask(&self) -> Option<&QualityMask> {
        self.mask.as_ref()
    }
    /// Combines the nods of all the chips, returns the paths to the created files
    pub fn run(&self) -> Result<Vec<PathBuf>>
    where
        S: Sync,
    {
        let pb = ProgressBar::new(CHIP_NUM as u64);
        let files = (1..=CHIP_NUM)
            .into_par_iter()
            .progress_with(pb)
            .map(|chip| self.chip(chip))
            .collect::<Result<Vec<Vec<PathBuf>>>>()?;
        Ok(files.into_iter().flatten().collect())
    }
    fn reference(&self, chip: usize) -> Result<Option<ReferenceCombination>> {
        let combined_dir = self.options.combined_dir();
        if !combined_dir.is_dir() {
            return Ok(None);
        }
        match get_filenames(&combined_dir, REFERENCE_PATTERN, Some(&chip_pattern(chip)))?
            .first()
        {
            Some(path) => ReferenceCombination::load(path).map(Some),
            None => {
                log::warn!(
                    "no reference combination for chip #{} in {:?}",
                    chip,
                    combined_dir
                );
                Ok(None)
            }
        }
    }
    /// Combines the nods of a chip, returns the paths to the created files
    pub fn chip(&self, chip: usize) -> Result<Vec<PathBuf>> {
        let options = &self.options;
        let (pattern, split) = options.nod_pattern();
        let nods = NodDirectory::new(options.intermediate_dir(), pattern).nods(chip)?;
        let reference = self.reference(chip)?.map(|reference| {
            if options.unnorm {
                reference.unnormalized().to_vec()
            } else {
                reference.normalized().to_vec()
            }
        });
        let detector = options.detector();
        let combined_dir = options.combined_dir();
        fs::create_dir_all(&combined_dir).map_err(|e| Error::Io(e, combined_dir.clone()))?;

        let mut files = vec![];
        for selection in options.combination.methods() {
            log::info!("chip #{}: {} combination", chip, selection);
            let combination = combine(&nods, chip, selection, self.mask(), &detector)?;
            if let Some(reference) = reference.as_deref() {
                let n = reference.len().min(combination.fixed.len());
                let diff = combination
                    .fixed
                    .iter()
                    .zip(reference)
                    .map(|(x, r)| (x - r).abs())
                    .sum::<f64>()
                    / n as f64;
                log::info!(
                    "chip #{}: mean absolute difference to the reference combination: {:e}",
                    chip,
                    diff
                );
            }

            let first = &nods[0];
            let output = combined_dir.join(output_name(first.name(), split, selection));
            if options.plot {
                self.plot(&output, &combination, reference.as_deref())?;
            }
            let header = match first.path().map(header_path) {
                Some(path) if path.exists() => Header::load(path)?,
                _ => Header::new(),
            };
            let header =
                combination_header(header, selection, &combination.bad_pixels, detector.sigma);
            files.push(self.sink.persist(&combination.fixed, &header, &output)?);
        }

        if options.snr {
            let (other_pattern, _) = options.other_nod_pattern();
            let other = NodDirectory::new(options.intermediate_dir(), other_pattern).nods(chip)?;
            let (unnorm_nods, norm_nods) = if options.unnorm {
                (&nods, &other)
            } else {
                (&other, &nods)
            };
            let report = snr_report(chip, unnorm_nods, norm_nods, self.mask(), &detector)?;
            log::info!("\n{}", report);
        }
        Ok(files)
    }
    #[cfg(feature = "plot")]
    fn plot(
        &self,
        output: &Path,
        combination: &Combination,
        reference: Option<&[f64]>,
    ) -> Result<()> {
        let images_dir = self.options.images_dir();
        fs::create_dir_all(&images_dir).map_err(|e| Error::Io(e, images_dir.clone()))?;
        let path = images_dir.join(output.with_extension("svg").file_name().unwrap_or_default());
        let title = format!(
            "Combined {}Spectra, chip #{}: {}",
            if self.options.unnorm { "" } else { "Normalized " },
            combination.fixed.chip,
            combination.fixed.selection.header_value()
        );
        crate::plot::plot_combination(
            &path,
            &title,
            &combination.raw,
            &combination.fixed,
            reference,
        )
    }
    #[cfg(not(feature = "plot"))]
    fn plot(&self, _: &Path, _: &Combination, _: Option<&[f64]>) -> Result<()> {
        log::warn!("plots are not available, enable the \"plot\" feature");
        Ok(())
    }
}
