use std::path::PathBuf;

use anyhow::Context;
use nod_combination::{CombineOptions, NodCombination, OutputVerify, Selection};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "nod-combination",
    about = "Combine the nod spectra of an observation, replacing the bad pixels"
)]
struct Opt {
    /// Path to the observation directory
    #[structopt(parse(from_os_str), default_value = ".")]
    path: PathBuf,
    /// Optimal nods grid file
    #[structopt(short, long, parse(from_os_str))]
    optimal_nods: Option<PathBuf>,
    /// Use spectral coordinates (not implemented)
    #[structopt(short, long)]
    spectralcoords: bool,
    /// Number of nods in the nod cycle
    #[structopt(short, long, default_value = "8")]
    nod_num: usize,
    /// Nods combination: all, optimal, non-opt or mix
    #[structopt(short, long, default_value = "all")]
    combination: Selection,
    /// Combine the un-normalized nod spectra
    #[structopt(short, long)]
    unnorm: bool,
    /// Report the SNR of all the combinations
    #[structopt(long)]
    snr: bool,
    /// Plot the combined spectra
    #[structopt(short, long)]
    plot: bool,
    /// Header verification: exception, ignore, warn, fix, silentfix, fix+warn, ...
    #[structopt(long, default_value = "fix+warn")]
    output_verify: OutputVerify,
    /// Overwrite the existing combined spectra
    #[structopt(short = "r", long)]
    overwrite: bool,
    /// Bad pixels detection threshold in standard deviations
    #[structopt(long, default_value = "4")]
    sigma: f64,
    /// Stop on consecutive bad pixels in all the nods
    #[structopt(long)]
    stop: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut options = CombineOptions::new(&opt.path)
        .combination(opt.combination)
        .spectral_coords(opt.spectralcoords)
        .nod_num(opt.nod_num)
        .unnorm(opt.unnorm)
        .snr(opt.snr)
        .plot(opt.plot)
        .output_verify(opt.output_verify)
        .overwrite(opt.overwrite)
        .sigma(opt.sigma)
        .stop(opt.stop);
    if let Some(arg) = opt.optimal_nods {
        options = options.optimal_nods(arg);
    }

    let files = NodCombination::new(options)
        .and_then(|combination| combination.run())
        .with_context(|| format!("nods combination failed in {:?}", opt.path))?;

    println!("\nList of created files");
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}
