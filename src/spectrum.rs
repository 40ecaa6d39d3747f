//! Nod spectra files
//!
//! Nod spectra are stored in `.npy` files of shape `(2, 1, P)`:
//! the optimal extraction of the spectrum followed by the non-optimal one.
//! The reference combination produced by the reduction pipeline has shape `(3, 1, 1024)`.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use npyz::{Order, WriterBuilder};
use strum_macros::EnumIter;

use crate::{
    error::{Error, Result, ShapeError},
    N_PIXELS,
};

/// Number of extraction bands in a nod spectrum file
pub const BAND_NUM: usize = 2;
/// Shape of the reference combination files
pub const REFERENCE_SCHEMA: [usize; 3] = [3, 1, N_PIXELS];

/// Extraction of a nod spectrum
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// optimal extraction, first band of the file
    Optimal = 0,
    /// non-optimal extraction, second band of the file
    NonOptimal = 1,
}
impl Band {
    /// Returns the band to use given the optimal nods grid flag
    pub fn from_optimal(optimal: bool) -> Self {
        if optimal {
            Band::Optimal
        } else {
            Band::NonOptimal
        }
    }
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Shape of the nod spectrum files with `n_pixels` pixels
pub fn nod_schema(n_pixels: usize) -> [usize; 3] {
    [BAND_NUM, 1, n_pixels]
}

// shape and values of a f64 npy array, in C order
fn read_npy(path: &Path) -> Result<(Vec<u64>, Vec<f64>)> {
    let bytes = fs::read(path).map_err(|e| Error::Io(e, path.to_path_buf()))?;
    let npy = npyz::NpyFile::new(&bytes[..]).map_err(|e| Error::Npy(e, path.to_path_buf()))?;
    let shape = npy.shape().to_vec();
    let order = npy.order();
    let data = npy
        .into_vec::<f64>()
        .map_err(|e| Error::Npy(e, path.to_path_buf()))?;
    if order == Order::Fortran && shape.len() > 1 {
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        let f_strides: Vec<usize> = dims
            .iter()
            .scan(1, |stride, &d| {
                let s = *stride;
                *stride *= d;
                Some(s)
            })
            .collect();
        let n = data.len();
        let c_data = (0..n)
            .map(|c_idx| {
                // C index -> multi-index -> Fortran index
                let (mut rem, mut stride) = (c_idx, n);
                dims.iter().zip(&f_strides).fold(0, |f_idx, (d, f_stride)| {
                    stride /= d;
                    let i = rem / stride;
                    rem %= stride;
                    f_idx + i * f_stride
                })
            })
            .map(|f_idx| data[f_idx])
            .collect();
        Ok((shape, c_data))
    } else {
        Ok((shape, data))
    }
}
fn check_schema(path: &Path, shape: &[u64], expected: &[usize]) -> Result<()> {
    if shape.len() != expected.len() || shape.iter().zip(expected).any(|(&s, &e)| s as usize != e)
    {
        Err(ShapeError::Schema {
            path: path.to_path_buf(),
            expected: expected.to_vec(),
            found: shape.to_vec(),
        }
        .into())
    } else {
        Ok(())
    }
}
fn write_npy(path: &Path, shape: &[u64], data: impl IntoIterator<Item = f64>) -> Result<()> {
    let io_err = |e| Error::Io(e, path.to_path_buf());
    let mut buf = BufWriter::new(File::create(path).map_err(io_err)?);
    let mut writer = npyz::WriteOptions::<f64>::new()
        .default_dtype()
        .shape(shape)
        .writer(&mut buf)
        .begin_nd()
        .map_err(io_err)?;
    writer.extend(data).map_err(io_err)?;
    writer.finish().map_err(io_err)?;
    Ok(())
}
/// Writes a 1D spectrum into a `.npy` file
pub fn save_spectrum<P: AsRef<Path>>(path: P, spectrum: &[f64]) -> Result<()> {
    write_npy(
        path.as_ref(),
        &[spectrum.len() as u64],
        spectrum.iter().copied(),
    )
}
/// Reads a 1D spectrum from a `.npy` file
pub fn load_spectrum<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let (shape, data) = read_npy(path)?;
    if shape.len() != 1 {
        return Err(ShapeError::Schema {
            path: path.to_path_buf(),
            expected: vec![data.len()],
            found: shape,
        }
        .into());
    }
    Ok(data)
}

/// Optimal and non-optimal extractions of a nod
#[derive(Debug, Clone, PartialEq)]
pub struct NodSpectrum {
    name: String,
    path: Option<PathBuf>,
    bands: [Vec<f64>; BAND_NUM],
}
impl NodSpectrum {
    pub fn new<S: Into<String>>(name: S, optimal: Vec<f64>, non_optimal: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            path: None,
            bands: [optimal, non_optimal],
        }
    }
    /// Loads a `(2, 1, P)` nod spectrum file, `P` is checked if `n_pixels` is given
    pub fn load<P: AsRef<Path>>(path: P, n_pixels: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading {:?}...", path);
        let (shape, data) = read_npy(path)?;
        let p = n_pixels.unwrap_or_else(|| shape.last().copied().unwrap_or_default() as usize);
        check_schema(path, &shape, &nod_schema(p))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let (optimal, non_optimal) = data.split_at(p);
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            bands: [optimal.to_vec(), non_optimal.to_vec()],
        })
    }
    /// Writes the nod spectrum into a `(2, 1, P)` `.npy` file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let shape: Vec<u64> = nod_schema(self.n_pixels())
            .iter()
            .map(|&d| d as u64)
            .collect();
        write_npy(
            path.as_ref(),
            &shape,
            self.bands.iter().flat_map(|band| band.iter().copied()),
        )
    }
    /// File name of the nod spectrum
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
    pub fn band(&self, band: Band) -> &[f64] {
        &self.bands[band.index()]
    }
    pub fn n_pixels(&self) -> usize {
        self.bands[Band::Optimal.index()].len()
    }
}

/// Nod combination from the reduction pipeline, used as a reference
#[derive(Debug, Clone)]
pub struct ReferenceCombination {
    rows: Vec<Vec<f64>>,
}
impl ReferenceCombination {
    /// Loads a `(3, 1, 1024)` reference combination file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading {:?}...", path);
        let (shape, data) = read_npy(path)?;
        check_schema(path, &shape, &REFERENCE_SCHEMA)?;
        Ok(Self {
            rows: data.chunks(N_PIXELS).map(|row| row.to_vec()).collect(),
        })
    }
    /// Combination of the normalized spectra
    pub fn normalized(&self) -> &[f64] {
        &self.rows[0]
    }
    /// Combination of the un-normalized spectra
    pub fn unnormalized(&self) -> &[f64] {
        &self.rows[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::scratch_dir;

    #[test]
    fn nod_file() {
        let dir = scratch_dir("spectrum");
        let nod = NodSpectrum::new("nod", vec![1., 2., 3.], vec![4., 5., 6.]);
        let path = dir.join("CRIRE.nod_1.ms.norm.npy");
        nod.save(&path).unwrap();
        let loaded = NodSpectrum::load(&path, Some(3)).unwrap();
        assert_eq!(loaded.name(), "CRIRE.nod_1.ms.norm.npy");
        assert_eq!(loaded.band(Band::Optimal), &[1., 2., 3.]);
        assert_eq!(loaded.band(Band::NonOptimal), &[4., 5., 6.]);
        assert_eq!(loaded.path(), Some(path.as_path()));
        fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn wrong_pixel_count() {
        let dir = scratch_dir("spectrum_pixels");
        let path = dir.join("nod.npy");
        NodSpectrum::new("nod", vec![1.; 4], vec![2.; 4])
            .save(&path)
            .unwrap();
        match NodSpectrum::load(&path, Some(1024)) {
            Err(Error::Shape(ShapeError::Schema {
                expected, found, ..
            })) => {
                assert_eq!(expected, vec![2, 1, 1024]);
                assert_eq!(found, vec![2, 1, 4]);
            }
            other => panic!("unexpected {other:?}"),
        }
        fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn flat_file_is_not_a_nod() {
        let dir = scratch_dir("spectrum_flat");
        let path = dir.join("flat.npy");
        save_spectrum(&path, &[1., 2., 3., 4.]).unwrap();
        assert_eq!(load_spectrum(&path).unwrap(), vec![1., 2., 3., 4.]);
        assert!(matches!(
            NodSpectrum::load(&path, None),
            Err(Error::Shape(ShapeError::Schema { .. }))
        ));
        assert!(matches!(
            ReferenceCombination::load(&path),
            Err(Error::Shape(ShapeError::Schema { .. }))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn reference_rows() {
        let dir = scratch_dir("reference");
        let path = dir.join("CRIRE.norm.sum_1.npy");
        let data: Vec<f64> = (0..3 * N_PIXELS).map(|i| (i / N_PIXELS) as f64).collect();
        write_npy(&path, &[3, 1, N_PIXELS as u64], data).unwrap();
        let reference = ReferenceCombination::load(&path).unwrap();
        assert!(reference.normalized().iter().all(|&x| x == 0.));
        assert!(reference.unnormalized().iter().all(|&x| x == 1.));
        fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn band_from_grid() {
        assert_eq!(Band::from_optimal(true), Band::Optimal);
        assert_eq!(Band::from_optimal(false).index(), 1);
    }
}
