//! Nod spectra combination
//!
//! Combines the 8 nod spectra of an observation into a single spectrum per chip,
//! replacing the bad pixels of each nod before averaging.
//! The nods are combined using their optimal extraction, their non-optimal
//! extraction or a mix of both given by an optimal nods grid.
//!
//! ```no_run
//! use nod_combination::{CombineOptions, NodCombination, Selection};
//!
//! let options = CombineOptions::new("obs")
//!     .combination(Selection::All)
//!     .optimal_nods("obs/optimal_nods.txt");
//! let files = NodCombination::new(options)?.run()?;
//! # Ok::<(), nod_combination::Error>(())
//! ```

/// Number of nods in an observation cycle
pub const NOD_NUM: usize = 8;
/// Number of detector chips
pub const CHIP_NUM: usize = 4;
/// Number of pixels per chip
pub const N_PIXELS: usize = 1024;

pub mod bad_pixels;
pub mod combine;
pub mod config;
pub mod discovery;
pub mod error;
pub mod header;
pub mod mask;
pub mod nods;
pub mod pipeline;
#[cfg(feature = "plot")]
pub mod plot;
pub mod selection;
pub mod sink;
pub mod snr;
pub mod spectrum;
pub mod stats;

pub use bad_pixels::{clean_nods, BadPixelSet, Detector};
pub use combine::{CombinedSpectrum, Method};
pub use config::CombineOptions;
pub use error::{Error, Result};
pub use header::Header;
pub use mask::QualityMask;
pub use nods::NodStack;
pub use pipeline::NodCombination;
pub use selection::{NodDirectory, NodSelector, NodSource, Selection};
pub use sink::{NpySink, OutputVerify, SpectrumSink};
pub use snr::sampled_snr;
pub use spectrum::{Band, NodSpectrum, ReferenceCombination};
