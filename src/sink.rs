//! Combined spectra persistence

use std::{
    ffi::OsString,
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    error::{ConfigurationError, Error, Result},
    spectrum::save_spectrum,
    CombinedSpectrum, Header,
};

/// Fixing of the header cards with non printable characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    No,
    /// fixes and reports the fix
    Fix,
    /// fixes quietly
    Silent,
}
/// Reporting of the header cards left unfixed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Exception,
    Warn,
    Ignore,
}
/// Header verification before writing
///
/// Parsed from `exception`, `ignore`, `warn`, `fix`, `silentfix`
/// or `fix+<report>`/`silentfix+<report>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputVerify {
    pub fix: Fix,
    pub report: Report,
}
impl Default for OutputVerify {
    fn default() -> Self {
        Self {
            fix: Fix::Fix,
            report: Report::Warn,
        }
    }
}
impl FromStr for OutputVerify {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let report = |r: &str| match r {
            "exception" => Ok(Report::Exception),
            "warn" => Ok(Report::Warn),
            "ignore" => Ok(Report::Ignore),
            _ => Err(ConfigurationError::OutputVerify(s.to_string())),
        };
        let (fix, rep) = match s.split_once('+') {
            Some((fix, rep)) => (fix, Some(rep)),
            None => (s, None),
        };
        let fix = match fix {
            "fix" => Fix::Fix,
            "silentfix" => Fix::Silent,
            _ if rep.is_none() => {
                return Ok(Self {
                    fix: Fix::No,
                    report: report(fix)?,
                })
            }
            _ => return Err(ConfigurationError::OutputVerify(s.to_string()).into()),
        };
        Ok(Self {
            fix,
            report: rep.map_or(Ok(Report::Exception), report)?,
        })
    }
}
impl OutputVerify {
    /// Checks that the header cards are printable ASCII, fixing them if required
    ///
    /// Returns the number of faulty cards
    pub fn verify(&self, header: &mut Header) -> Result<usize> {
        let mut faulty = 0;
        for card in header.cards_mut() {
            if [&card.key, &card.value, &card.comment]
                .into_iter()
                .all(|field| is_printable(field))
            {
                continue;
            }
            faulty += 1;
            match (self.fix, self.report) {
                (Fix::No, Report::Exception) => {
                    return Err(ConfigurationError::HeaderValue {
                        key: card.key.clone(),
                        value: format!("{} / {}", card.value, card.comment),
                    }
                    .into())
                }
                (Fix::No, Report::Warn) => log::warn!(
                    "header card {:?} has non printable characters: {:?} / {:?}",
                    card.key,
                    card.value,
                    card.comment
                ),
                (Fix::No, Report::Ignore) => (),
                (fix, _) => {
                    card.key = printable(&card.key);
                    card.value = printable(&card.value);
                    card.comment = printable(&card.comment);
                    if fix == Fix::Fix {
                        log::warn!("fixed non printable characters in header card {}", card.key);
                    }
                }
            }
        }
        Ok(faulty)
    }
}
fn is_printable_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control()
}
fn is_printable(s: &str) -> bool {
    s.chars().all(is_printable_char)
}
fn printable(s: &str) -> String {
    s.chars()
        .map(|c| if is_printable_char(c) { c } else { '_' })
        .collect()
}

/// Path to the header file written next to a spectrum file
pub fn header_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(".hdr.csv");
    PathBuf::from(name)
}

/// Combined spectra storage
pub trait SpectrumSink {
    /// Writes the spectrum and its header, returns the path to the spectrum file
    fn persist(&self, spectrum: &CombinedSpectrum, header: &Header, path: &Path)
        -> Result<PathBuf>;
}

/// Writes spectra into `.npy` files with a `.hdr.csv` header file alongside
#[derive(Debug, Clone, Default)]
pub struct NpySink {
    overwrite: bool,
    output_verify: OutputVerify,
}
impl NpySink {
    pub fn new() -> Self {
        Default::default()
    }
    /// Replaces existing files
    pub fn overwrite(self, overwrite: bool) -> Self {
        Self { overwrite, ..self }
    }
    pub fn output_verify(self, output_verify: OutputVerify) -> Self {
        Self {
            output_verify,
            ..self
        }
    }
}
impl SpectrumSink for NpySink {
    fn persist(
        &self,
        spectrum: &CombinedSpectrum,
        header: &Header,
        path: &Path,
    ) -> Result<PathBuf> {
        let hdr_path = header_path(path);
        if !self.overwrite {
            if let Some(existing) = [path, hdr_path.as_path()].into_iter().find(|p| p.exists()) {
                return Err(Error::Io(
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "file exists, set overwrite to replace it",
                    ),
                    existing.to_path_buf(),
                ));
            }
        }
        let mut header = header.clone();
        self.output_verify.verify(&mut header)?;
        save_spectrum(path, spectrum)?;
        let file = File::create(&hdr_path).map_err(|e| Error::Io(e, hdr_path.clone()))?;
        header.to_csv(BufWriter::new(file))?;
        log::info!("Saved {}: {:?}", spectrum, path);
        Ok(path.to_path_buf())
    }
}
