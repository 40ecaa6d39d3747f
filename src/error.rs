use std::{io, path::PathBuf};

/// Unsupported or inconsistent request, never retried
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("spectral coordinates are not available")]
    SpectralCoordinates,
    #[error(
        "a nod cycle of {0} nods is not implemented, expected {expected}",
        expected = crate::NOD_NUM
    )]
    NodNumber(usize),
    #[error("no optimal nods grid supplied for the {0} combination")]
    MissingMask(String),
    #[error(r#""all" is not a single nod selection, expand it with `Selection::methods`"#)]
    AllSelection,
    #[error("chip #{0} is not supported, expected 1 to {max}", max = crate::CHIP_NUM)]
    Chip(usize),
    #[error("chip #{chip} is missing from the optimal nods grid ({rows} rows)")]
    MaskChip { chip: usize, rows: usize },
    #[error(r#"selection "{0}" is not recognized, expected "all", "optimal", "non-opt" or "mix""#)]
    Selection(String),
    #[error(r#"output verification "{0}" is not recognized"#)]
    OutputVerify(String),
    #[error("consecutive bad pixels found in all nods at pixels {0:?}")]
    ConsecutiveBadPixels(Vec<usize>),
    #[error("header card {key} has a non printable value {value:?}")]
    HeaderValue { key: String, value: String },
}

/// Array dimensions that do not match each other or the instrument schema
#[derive(thiserror::Error, Debug)]
pub enum ShapeError {
    #[error("{path:?} has shape {found:?}, expected {expected:?}")]
    Schema {
        path: PathBuf,
        expected: Vec<usize>,
        found: Vec<u64>,
    },
    #[error("nod #{nod} has {found} pixels, expected {expected}")]
    PixelCount {
        nod: usize,
        expected: usize,
        found: usize,
    },
    #[error("no nod spectrum to stack")]
    Empty,
    #[error("no nod spectrum found for chip #{chip} in {location}")]
    NoNods { chip: usize, location: String },
    #[error(
        "the optimal nods grid has {mask} nods for chip #{chip} but {nods} nod spectra were found"
    )]
    MaskNods {
        chip: usize,
        mask: usize,
        nods: usize,
    },
    #[error("spectrum of {len} pixels is too short for the [{lo},{hi}) continuum window")]
    Window { len: usize, lo: usize, hi: usize },
    #[error("bad pixel (nod #{nod}, pixel #{pixel}) is outside of the {shape:?} nods")]
    Coordinate {
        nod: usize,
        pixel: usize,
        shape: (usize, usize),
    },
    #[error("all the pixels of nod #{0} are flagged, nothing to interpolate from")]
    Unrepairable(usize),
    #[error("bad pixel (nod #{nod}, pixel #{pixel}) is unchanged after repair")]
    Unrepaired { nod: usize, pixel: usize },
}

/// Malformed optimal nods grid
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("line {line}: length is wrong={found}, expected {expected}")]
    LineLength {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("line {line}: {value:?} is not a 0 or 1 flag")]
    Flag { line: usize, value: char },
    #[error("line {line}: more than {chips} chips")]
    ChipCount { line: usize, chips: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration error")]
    Configuration(#[from] ConfigurationError),
    #[error("shape error")]
    Shape(#[from] ShapeError),
    #[error("failed to parse the optimal nods grid")]
    Parse(#[from] ParseError),
    #[error("failed to access {1:?}")]
    Io(#[source] io::Error, PathBuf),
    #[error("failed to read the npy file {1:?}")]
    Npy(#[source] io::Error, PathBuf),
    #[error("invalid file pattern")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to write the header")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "plot")]
    #[error("failed to plot {1:?}: {0}")]
    Plot(String, PathBuf),
}
pub type Result<T> = std::result::Result<T, Error>;
