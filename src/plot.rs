//! Chart rendering for aggregated data
//!
//! Built on `plotters`, available behind the `plot` cargo feature.

use plotters::prelude::*;
use std::path::Path;

use crate::agg::AggSeries;
use crate::record::AtmosProperty;
use crate::spectrum::Spectrum;
use crate::stats::{SpatialAgg, Stat};

fn min_value(x: &[f64]) -> f64 {
    x.iter().cloned().fold(f64::INFINITY, f64::min)
}
fn max_value(x: &[f64]) -> f64 {
    x.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

/// Scatter of one statistic on the lat/lng plane
///
/// Marker size and color follow the statistic through a YlOrRd gradient; when
/// the values span more than two orders of magnitude they are log10-scaled
/// before sizing.
pub fn scatter_map<P: AsRef<Path>>(agg: &SpatialAgg, prop: AtmosProperty, stat: Stat, path: P) {
    let grid = agg.grid();
    let points: Vec<(f64, f64, f64)> = agg
        .cells()
        .filter_map(|(&cell, _)| {
            agg.value(cell, prop, stat)
                .filter(|v| v.is_finite() && *v > 0.)
                .map(|v| (grid.lng(cell), grid.lat(cell), v))
        })
        .collect();
    if points.is_empty() {
        return;
    }
    let values: Vec<f64> = points.iter().map(|&(_, _, v)| v).collect();
    let scaled: Vec<f64> = if max_value(&values) - min_value(&values) > 100. {
        values.iter().map(|v| v.log10()).collect()
    } else {
        values.clone()
    };
    let (lo, hi) = (min_value(&scaled), max_value(&scaled));
    let span = if hi > lo { hi - lo } else { 1. };

    let plot = BitMapBackend::new(&path, (1024, 512)).into_drawing_area();
    plot.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&plot)
        .caption(
            format!("{} {}", prop, stat),
            ("sans-serif", 20).into_font(),
        )
        .set_label_area_size(LabelAreaPosition::Left, 40)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(-180f64..180f64, -90f64..90f64)
        .unwrap();
    chart
        .configure_mesh()
        .x_labels(13)
        .y_labels(7)
        .x_desc("Longitude [deg]")
        .y_desc("Latitude [deg]")
        .draw()
        .unwrap();

    chart
        .draw_series(points.iter().zip(scaled.iter()).map(|(&(x, y, _), &s)| {
            let t = (s - lo) / span;
            let color = colorous::YELLOW_ORANGE_RED.eval_continuous(t);
            let rgb = RGBColor(color.r, color.g, color.b);
            Circle::new((x, y), (3. + 9. * t) as i32, rgb.filled())
        }))
        .unwrap();
}

/// Trend lines of one statistic across the dates of a series, one line per cell
pub fn lines<P: AsRef<Path>>(series: &AggSeries, prop: AtmosProperty, stat: Stat, path: P) {
    let Some((&start, _)) = series.iter().next() else {
        return;
    };
    let cells: Vec<_> = series
        .cell_totals()
        .into_iter()
        .map(|(cell, _, _)| cell)
        .collect();
    // per cell: (day offset, value) pairs
    let traces: Vec<(String, Vec<(f64, f64)>)> = cells
        .into_iter()
        .filter_map(|cell| {
            let trace: Vec<(f64, f64)> = series
                .iter()
                .filter_map(|(&date, agg)| {
                    agg.value(cell, prop, stat)
                        .filter(|v| v.is_finite())
                        .map(|v| ((date - start).num_days() as f64, v))
                })
                .collect();
            let grid = series.iter().next()?.1.grid();
            (!trace.is_empty()).then(|| (grid.label(cell), trace))
        })
        .collect();
    if traces.is_empty() {
        return;
    }
    log::info!("number of lines: {}", traces.len());

    let values: Vec<f64> = traces
        .iter()
        .flat_map(|(_, t)| t.iter().map(|&(_, v)| v))
        .collect();
    let xmax = traces
        .iter()
        .flat_map(|(_, t)| t.iter().map(|&(x, _)| x))
        .fold(0f64, f64::max);

    let plot = BitMapBackend::new(&path, (1024, 512)).into_drawing_area();
    plot.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&plot)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(
            -xmax * 1e-2..xmax * (1. + 1e-2),
            min_value(&values)..max_value(&values),
        )
        .unwrap();
    chart
        .configure_mesh()
        .x_desc(format!("Days since {}", start))
        .y_desc(format!("{} {}", prop, stat))
        .draw()
        .unwrap();

    let mut colors = colorous::TABLEAU10.iter().cycle();
    for (label, trace) in traces {
        let color = colors.next().unwrap();
        let rgb = RGBColor(color.r, color.g, color.b);
        chart
            .draw_series(LineSeries::new(trace, &rgb))
            .unwrap()
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &rgb));
    }
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .unwrap();
}

/// Amplitude vs frequency line chart of a spectrum
pub fn spectrum_chart<P: AsRef<Path>>(spectrum: &Spectrum, path: P) {
    if spectrum.is_empty() {
        return;
    }
    let frequency = spectrum.frequency();
    let amplitude = spectrum.amplitude();

    let plot = BitMapBackend::new(&path, (768, 512)).into_drawing_area();
    plot.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&plot)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(
            0f64..max_value(frequency) * (1. + 1e-2),
            0f64..max_value(amplitude) * 1.05,
        )
        .unwrap();
    chart
        .configure_mesh()
        .x_desc("Frequency")
        .y_desc("Amplitude")
        .draw()
        .unwrap();
    chart
        .draw_series(LineSeries::new(spectrum.iter(), &BLUE))
        .unwrap();
}
