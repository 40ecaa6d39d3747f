//! Nods selection
//!
//! The nods of a chip are combined using either their optimal extraction,
//! their non-optimal extraction or a mix of both given by the optimal nods grid.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use strum_macros::EnumIter;

use crate::{
    discovery::get_filenames,
    error::{ConfigurationError, Error, Result, ShapeError},
    Band, NodSpectrum, NodStack, QualityMask,
};

/// Nods combination method
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    /// all of the methods below
    All,
    Optimal,
    NonOptimal,
    Mixed,
}
impl Selection {
    /// Expands a selection into the single band selections it stands for
    pub fn methods(self) -> Vec<Selection> {
        match self {
            Selection::All => vec![
                Selection::Optimal,
                Selection::NonOptimal,
                Selection::Mixed,
            ],
            selection => vec![selection],
        }
    }
    /// Header value of the nod selection method
    pub fn header_value(&self) -> &'static str {
        match self {
            Selection::All => "All",
            Selection::Optimal => "Optimal",
            Selection::NonOptimal => "Non-optimal",
            Selection::Mixed => "Mixed",
        }
    }
    /// Extension of the combined spectrum file
    pub fn extension(&self) -> &'static str {
        match self {
            Selection::All => "",
            Selection::Optimal => ".optavg",
            Selection::NonOptimal => ".nonoptavg",
            Selection::Mixed => ".mixavg",
        }
    }
    /// Band used for nod `nod` of `chip`
    pub fn band(&self, chip: usize, nod: usize, mask: Option<&QualityMask>) -> Result<Band> {
        match self {
            Selection::All => Err(ConfigurationError::AllSelection.into()),
            Selection::Optimal => Ok(Band::Optimal),
            Selection::NonOptimal => Ok(Band::NonOptimal),
            Selection::Mixed => {
                let mask = mask.ok_or_else(|| ConfigurationError::MissingMask(self.to_string()))?;
                mask.is_optimal(chip, nod).map(Band::from_optimal)
            }
        }
    }
}
impl FromStr for Selection {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(Selection::All),
            "optimal" => Ok(Selection::Optimal),
            "non-opt" => Ok(Selection::NonOptimal),
            "mix" => Ok(Selection::Mixed),
            _ => Err(ConfigurationError::Selection(s.to_string()).into()),
        }
    }
}
impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "all"),
            Selection::Optimal => write!(f, "optimal"),
            Selection::NonOptimal => write!(f, "non-opt"),
            Selection::Mixed => write!(f, "mix"),
        }
    }
}

/// Provider of the nod spectra of a chip
pub trait NodSource {
    fn nods(&self, chip: usize) -> Result<Vec<NodSpectrum>>;
}

/// Nod spectra files in a directory
///
/// The files of a chip match both the file pattern and `*_{chip}.*`
#[derive(Debug, Clone)]
pub struct NodDirectory {
    path: PathBuf,
    pattern: String,
    n_pixels: Option<usize>,
}
impl NodDirectory {
    pub fn new<P: AsRef<Path>, S: Into<String>>(path: P, pattern: S) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pattern: pattern.into(),
            n_pixels: None,
        }
    }
    /// Sets the number of pixels the nod spectra must have
    pub fn n_pixels(self, n_pixels: usize) -> Self {
        Self {
            n_pixels: Some(n_pixels),
            ..self
        }
    }
    /// Paths to the nod spectra files of a chip
    pub fn filenames(&self, chip: usize) -> Result<Vec<PathBuf>> {
        get_filenames(&self.path, &self.pattern, Some(&chip_pattern(chip)))
    }
}
/// Glob pattern of the files of a chip
pub fn chip_pattern(chip: usize) -> String {
    format!("*_{}.*", chip)
}
impl NodSource for NodDirectory {
    fn nods(&self, chip: usize) -> Result<Vec<NodSpectrum>> {
        let paths = self.filenames(chip)?;
        if paths.is_empty() {
            return Err(ShapeError::NoNods {
                chip,
                location: self.path.join(&self.pattern).display().to_string(),
            }
            .into());
        }
        log::info!(
            "Loading {} nods for chip #{} from {:?}...",
            paths.len(),
            chip,
            self.path
        );
        paths
            .iter()
            .map(|path| NodSpectrum::load(path, self.n_pixels))
            .collect()
    }
}

/// Nod spectra held in memory, indexed by chip from 1
#[derive(Debug, Clone, Default)]
pub struct NodMemory(pub Vec<Vec<NodSpectrum>>);
impl NodSource for NodMemory {
    fn nods(&self, chip: usize) -> Result<Vec<NodSpectrum>> {
        match chip.checked_sub(1).and_then(|idx| self.0.get(idx)) {
            Some(nods) if !nods.is_empty() => Ok(nods.clone()),
            _ => Err(ShapeError::NoNods {
                chip,
                location: "memory".to_string(),
            }
            .into()),
        }
    }
}

/// Selects the band of each nod, the nods are sorted by name
pub fn select_from(
    mut nods: Vec<NodSpectrum>,
    chip: usize,
    selection: Selection,
    mask: Option<&QualityMask>,
) -> Result<Vec<Vec<f64>>> {
    check_selection(chip, selection, mask, nods.len())?;
    if nods.is_empty() {
        return Err(ShapeError::Empty.into());
    }
    nods.sort_by(|a, b| a.name().cmp(b.name()));
    let n_pixels = nods[0].n_pixels();
    nods.iter()
        .enumerate()
        .map(|(nod, spectrum)| {
            if spectrum.n_pixels() != n_pixels {
                return Err(ShapeError::PixelCount {
                    nod,
                    expected: n_pixels,
                    found: spectrum.n_pixels(),
                }
                .into());
            }
            let band = selection.band(chip, nod, mask)?;
            Ok(spectrum.band(band).to_vec())
        })
        .collect()
}
// configuration checks done before loading any file
fn check_selection(
    chip: usize,
    selection: Selection,
    mask: Option<&QualityMask>,
    n_nods: usize,
) -> Result<()> {
    match (selection, mask) {
        (Selection::All, _) => Err(ConfigurationError::AllSelection.into()),
        (Selection::Mixed, None) => {
            Err(ConfigurationError::MissingMask(selection.to_string()).into())
        }
        (Selection::Mixed, Some(mask)) => {
            let row = mask.chip(chip)?;
            if n_nods > 0 && row.len() != n_nods {
                Err(ShapeError::MaskNods {
                    chip,
                    mask: row.len(),
                    nods: n_nods,
                }
                .into())
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

/// Nods selector
///
/// Picks the optimal or the non-optimal extraction of each nod spectrum
/// given by a [NodSource]
pub struct NodSelector<S: NodSource> {
    source: S,
}
impl<S: NodSource> NodSelector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
    pub fn source(&self) -> &S {
        &self.source
    }
    /// Returns the selected band of every nod of a chip
    pub fn select(
        &self,
        chip: usize,
        selection: Selection,
        mask: Option<&QualityMask>,
    ) -> Result<Vec<Vec<f64>>> {
        check_selection(chip, selection, mask, 0)?;
        select_from(self.source.nods(chip)?, chip, selection, mask)
    }
    /// Returns the selected band of every nod of a chip stacked together
    pub fn stack(
        &self,
        chip: usize,
        selection: Selection,
        mask: Option<&QualityMask>,
    ) -> Result<NodStack> {
        NodStack::from_rows(&self.select(chip, selection, mask)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::scratch_dir;
    use std::fs;
    use strum::IntoEnumIterator;

    fn nods(n: usize, n_pixels: usize) -> Vec<NodSpectrum> {
        (0..n)
            .map(|i| {
                NodSpectrum::new(
                    format!("nod{}", i),
                    vec![i as f64; n_pixels],
                    vec![-(i as f64); n_pixels],
                )
            })
            .collect()
    }
    fn selector() -> NodSelector<NodMemory> {
        NodSelector::new(NodMemory(vec![nods(4, 3); 2]))
    }

    #[test]
    fn names() {
        for selection in Selection::iter() {
            let name = selection.to_string();
            assert_eq!(name.parse::<Selection>().unwrap(), selection);
        }
        assert!(matches!(
            "best".parse::<Selection>(),
            Err(Error::Configuration(ConfigurationError::Selection(_)))
        ));
        assert_eq!(Selection::All.methods().len(), 3);
        assert_eq!(Selection::Mixed.methods(), vec![Selection::Mixed]);
    }
    #[test]
    fn optimal_and_non_optimal() {
        let selector = selector();
        let optimal = selector.select(1, Selection::Optimal, None).unwrap();
        assert_eq!(optimal[2], vec![2.; 3]);
        let non_optimal = selector.select(2, Selection::NonOptimal, None).unwrap();
        assert_eq!(non_optimal[3], vec![-3.; 3]);
    }
    #[test]
    fn mixed_all_true_is_optimal() {
        let selector = selector();
        let mask = QualityMask::parse("1111\n1111\n", 4).unwrap();
        assert_eq!(
            selector.select(2, Selection::Mixed, Some(&mask)).unwrap(),
            selector.select(2, Selection::Optimal, None).unwrap()
        );
    }
    #[test]
    fn mixed() {
        let selector = selector();
        let mask = QualityMask::parse("1010\n0110\n", 4).unwrap();
        let mixed = selector.select(2, Selection::Mixed, Some(&mask)).unwrap();
        let first: Vec<f64> = mixed.iter().map(|nod| nod[0]).collect();
        assert_eq!(first, vec![-0., 1., 2., -3.]);
    }
    #[test]
    fn mixed_without_mask() {
        assert!(matches!(
            selector().select(1, Selection::Mixed, None),
            Err(Error::Configuration(ConfigurationError::MissingMask(_)))
        ));
    }
    #[test]
    fn all_is_not_a_band() {
        assert!(matches!(
            selector().select(1, Selection::All, None),
            Err(Error::Configuration(ConfigurationError::AllSelection))
        ));
    }
    #[test]
    fn mask_nods_mismatch() {
        let mask = QualityMask::parse("11111\n11111\n", 5).unwrap();
        assert!(matches!(
            selector().select(1, Selection::Mixed, Some(&mask)),
            Err(Error::Shape(ShapeError::MaskNods {
                chip: 1,
                mask: 5,
                nods: 4
            }))
        ));
    }
    #[test]
    fn chip_outside_mask() {
        let mask = QualityMask::parse("1111\n", 4).unwrap();
        assert!(matches!(
            selector().select(2, Selection::Mixed, Some(&mask)),
            Err(Error::Configuration(ConfigurationError::MaskChip { .. }))
        ));
    }
    #[test]
    fn pixel_count_mismatch() {
        let mut chip = nods(3, 4);
        chip.push(NodSpectrum::new("nod9", vec![0.; 5], vec![0.; 5]));
        assert!(matches!(
            select_from(chip, 1, Selection::Optimal, None),
            Err(Error::Shape(ShapeError::PixelCount {
                nod: 3,
                expected: 4,
                found: 5
            }))
        ));
    }
    #[test]
    fn sorted_by_name() {
        let mut chip = nods(3, 2);
        chip.reverse();
        let selected = select_from(chip, 1, Selection::Optimal, None).unwrap();
        assert_eq!(selected, vec![vec![0.; 2], vec![1.; 2], vec![2.; 2]]);
    }
    #[test]
    fn directory() {
        let dir = scratch_dir("selection");
        for (i, nod) in nods(3, 5).iter().enumerate() {
            nod.save(dir.join(format!("CRIRE.{}_1.ms.norm.npy", i)))
                .unwrap();
            nod.save(dir.join(format!("CRIRE.{}_1.ms.npy", i))).unwrap();
        }
        let source = NodDirectory::new(&dir, "CRIRE*.ms.norm.npy").n_pixels(5);
        let selector = NodSelector::new(source);
        let stack = selector.stack(1, Selection::NonOptimal, None).unwrap();
        assert_eq!((stack.n_nods(), stack.n_pixels()), (3, 5));
        assert_eq!(stack.pixel(0), vec![-0., -1., -2.]);
        assert!(matches!(
            selector.select(2, Selection::Optimal, None),
            Err(Error::Shape(ShapeError::NoNods { chip: 2, .. }))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
