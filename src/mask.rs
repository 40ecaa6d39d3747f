//! Optimal nods grid
//!
//! A text grid with one line per chip and one `0`/`1` character per nod,
//! `1` if the optimal extraction of that nod is to be used for that chip.
//! Lines starting with `#` are comments.
//!
//! ```text
//! # nods 1 to 8
//! 11011111
//! 11111111
//! 10111111
//! 11111110
//! ```

use std::{fmt, fs, path::Path};

use crate::{
    error::{ConfigurationError, Error, ParseError, Result},
    CHIP_NUM,
};

/// Boolean (chip × nod) grid of the nods with a good optimal extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityMask(Vec<Vec<bool>>);
impl QualityMask {
    /// Parses the grid, every line must have `n_nods` flags and there is at most
    /// one line per chip
    pub fn parse(contents: &str, n_nods: usize) -> Result<Self> {
        let mut rows = vec![];
        for (k, line) in contents.lines().enumerate() {
            if line.starts_with('#') {
                continue;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if rows.len() == CHIP_NUM {
                return Err(ParseError::ChipCount {
                    line: k + 1,
                    chips: CHIP_NUM,
                }
                .into());
            }
            let flags = line
                .chars()
                .map(|c| match c {
                    '0' => Ok(false),
                    '1' => Ok(true),
                    value => Err(ParseError::Flag { line: k + 1, value }),
                })
                .collect::<std::result::Result<Vec<bool>, ParseError>>()?;
            if flags.len() != n_nods {
                return Err(ParseError::LineLength {
                    line: k + 1,
                    found: flags.len(),
                    expected: n_nods,
                }
                .into());
            }
            rows.push(flags);
        }
        Ok(Self(rows))
    }
    /// Reads and parses the grid file
    pub fn from_path<P: AsRef<Path>>(path: P, n_nods: usize) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| Error::Io(e, path.to_path_buf()))?;
        log::info!("Loading the optimal nods grid {:?}", path);
        Self::parse(&contents, n_nods)
    }
    /// Number of chips in the grid
    pub fn n_chips(&self) -> usize {
        self.0.len()
    }
    /// Returns the flags of the nods of a chip, chips are numbered from 1
    pub fn chip(&self, chip: usize) -> Result<&[bool]> {
        chip.checked_sub(1)
            .and_then(|idx| self.0.get(idx))
            .map(|row| row.as_slice())
            .ok_or_else(|| {
                ConfigurationError::MaskChip {
                    chip,
                    rows: self.0.len(),
                }
                .into()
            })
    }
    /// Checks if the optimal extraction of a nod is to be used for a chip
    pub fn is_optimal(&self, chip: usize, nod: usize) -> Result<bool> {
        let row = self.chip(chip)?;
        row.get(nod).copied().ok_or_else(|| {
            crate::error::ShapeError::MaskNods {
                chip,
                mask: row.len(),
                nods: nod + 1,
            }
            .into()
        })
    }
    pub fn rows(&self) -> &[Vec<bool>] {
        &self.0
    }
}
impl fmt::Display for QualityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.0 {
            let line: String = row.iter().map(|&b| if b { '1' } else { '0' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
