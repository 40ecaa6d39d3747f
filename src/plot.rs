//! Combined spectra plots

use std::{fmt::Display, path::Path};

use plotters::prelude::*;

use crate::error::{Error, Result};

fn plot_err<'a, E: Display>(path: &'a Path) -> impl Fn(E) -> Error + 'a {
    move |e| Error::Plot(e.to_string(), path.to_path_buf())
}
fn minmax<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> (f64, f64) {
    let (lo, hi) = series
        .into_iter()
        .flat_map(|x| x.iter())
        .filter(|x| x.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if lo > hi {
        (0., 1.)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Plots the combined spectrum with and without bad pixels repair
///
/// The lower panel shows the difference of both to the reference combination if any.
/// Plots are written to an SVG file
pub fn plot_combination(
    path: &Path,
    title: &str,
    combined: &[f64],
    fixed: &[f64],
    reference: Option<&[f64]>,
) -> Result<()> {
    let err = plot_err(path);
    let root = SVGBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(&err)?;
    let root = root.titled(title, ("sans-serif", 20)).map_err(&err)?;
    let panels = root.split_evenly((2, 1));

    let mut colors = colorous::TABLEAU10
        .iter()
        .map(|c| RGBColor(c.r, c.g, c.b))
        .cycle();
    let (c0, c1) = (
        colors.next().unwrap_or(BLACK),
        colors.next().unwrap_or(BLACK),
    );

    let n = combined.len().max(fixed.len());
    let mut series: Vec<(&str, Vec<f64>, RGBColor)> =
        vec![("Combined", combined.to_vec(), c0), ("Fixed", fixed.to_vec(), c1)];
    let mut chart = ChartBuilder::on(&panels[0])
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(0..n, {
            let (lo, hi) = minmax(series.iter().map(|(_, s, _)| s.as_slice()));
            lo..hi
        })
        .map_err(&err)?;
    chart
        .configure_mesh()
        .x_desc("Pixel")
        .y_desc("Flux")
        .draw()
        .map_err(&err)?;
    for (label, values, rgb) in &series {
        let rgb = *rgb;
        chart
            .draw_series(LineSeries::new(values.iter().copied().enumerate(), &rgb))
            .map_err(&err)?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &rgb));
    }
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .position(SeriesLabelPosition::LowerRight)
        .draw()
        .map_err(&err)?;

    if let Some(reference) = reference {
        for (_, values, _) in series.iter_mut() {
            *values = values.iter().zip(reference).map(|(x, r)| x - r).collect();
        }
        let mut chart = ChartBuilder::on(&panels[1])
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .margin(10)
            .build_cartesian_2d(0..n, {
                let (lo, hi) = minmax(series.iter().map(|(_, s, _)| s.as_slice()));
                lo..hi
            })
            .map_err(&err)?;
        chart
            .configure_mesh()
            .x_desc("Pixel")
            .y_desc("Difference to reference")
            .draw()
            .map_err(&err)?;
        for (label, values, rgb) in &series {
            let rgb = *rgb;
            chart
                .draw_series(LineSeries::new(values.iter().copied().enumerate(), &rgb))
                .map_err(&err)?
                .label(*label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &rgb));
        }
    }
    root.present().map_err(&err)?;
    log::info!("Saved {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::scratch_dir;
    use std::fs;

    #[test]
    fn svg() {
        let dir = scratch_dir("plot");
        let path = dir.join("chip1.svg");
        let combined: Vec<f64> = (0..64).map(|x| (x as f64 * 0.1).sin()).collect();
        let mut fixed = combined.clone();
        fixed[10] += 0.5;
        plot_combination(&path, "chip #1", &combined, &fixed, Some(&combined)).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("<svg"));
        fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn flat_range() {
        assert_eq!(minmax([[1., 1.].as_slice()]), (0.5, 1.5));
        assert_eq!(minmax([[f64::NAN].as_slice()]), (0., 1.));
    }
}
