//! SVG charts for the prediction view, rendered with Plotters

use crate::types::prediction::PredictionResult;
use anyhow::{ensure, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;

const STAY_COLOR: RGBColor = RGBColor(0, 128, 0);
const CHURN_COLOR: RGBColor = RGBColor(255, 0, 0);
const CUSTOMER_COLOR: RGBColor = RGBColor(65, 105, 225);
const AVERAGE_COLOR: RGBColor = RGBColor(240, 128, 128);

/// Inner radius of the donut as a fraction of the outer radius
const DONUT_HOLE: f64 = 0.4;

/// Render the stay/churn probability donut chart
pub fn probability_pie_svg(result: &PredictionResult) -> Result<String> {
    let slices = [
        ("Stay", result.stay_probability(), STAY_COLOR),
        ("Churn", result.churn_probability, CHURN_COLOR),
    ];

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (480, 400)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled("Churn vs Stay Probability", ("sans-serif", 22))?;

        let (width, height) = root.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);
        let radius = width.min(height) as f64 * 0.38;
        let label_style = TextStyle::from(("sans-serif", 16).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center));

        // Start at twelve o'clock and sweep clockwise
        let mut start = -PI / 2.0;
        for (label, fraction, color) in slices {
            if fraction <= 0.0 {
                continue;
            }
            let sweep = 2.0 * PI * fraction;

            root.draw(&Polygon::new(
                wedge_points(center, radius, start, sweep),
                color.filled(),
            ))?;

            let mid = start + sweep / 2.0;
            let label_radius = radius * (1.0 + DONUT_HOLE) / 2.0;
            let anchor = (
                center.0 + (label_radius * mid.cos()).round() as i32,
                center.1 + (label_radius * mid.sin()).round() as i32,
            );
            root.draw(&Text::new(
                format!("{} {:.1}%", label, fraction * 100.0),
                anchor,
                label_style.clone().color(&WHITE),
            ))?;

            start += sweep;
        }

        root.draw(&Circle::new(
            center,
            (radius * DONUT_HOLE).round() as i32,
            WHITE.filled(),
        ))?;

        root.present()?;
    }

    Ok(svg)
}

/// Polygon approximating a pie wedge
fn wedge_points(center: (i32, i32), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / (2.0 * PI)) * 120.0).ceil().max(2.0) as usize;

    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for step in 0..=steps {
        let angle = start + sweep * step as f64 / steps as f64;
        points.push((
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 + (radius * angle.sin()).round() as i32,
        ));
    }
    points
}

/// Render the horizontal customer-vs-average bar comparison
pub fn feature_comparison_svg(names: &[&str], customer: &[f64], average: &[f64]) -> Result<String> {
    ensure!(
        names.len() == customer.len() && names.len() == average.len(),
        "Chart series lengths differ: {} names, {} customer values, {} averages",
        names.len(),
        customer.len(),
        average.len()
    );

    let (x_min, x_max) = value_range(customer.iter().chain(average).copied());
    let count = names.len();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (900, 560)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Customer vs Average Features", ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(140)
            .build_cartesian_2d(x_min..x_max, (0..count).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(count)
            .y_label_formatter(&|value| match value {
                SegmentValue::CenterOf(i) => names.get(*i).map(|s| s.to_string()).unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("Feature Value")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;

        let customer_style = CUSTOMER_COLOR.mix(0.7).filled();
        chart
            .draw_series(
                Histogram::horizontal(&chart)
                    .style(customer_style)
                    .margin(6)
                    .data(customer.iter().copied().enumerate()),
            )?
            .label("Customer")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], customer_style));

        let average_style = AVERAGE_COLOR.mix(0.5).filled();
        chart
            .draw_series(
                Histogram::horizontal(&chart)
                    .style(average_style)
                    .margin(6)
                    .data(average.iter().copied().enumerate()),
            )?
            .label("Average Customer")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], average_style));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(svg)
}

/// Axis range covering zero and every value, padded by 5%
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let span = hi - lo;
    if span == 0.0 {
        return (0.0, 1.0);
    }
    let pad = span * 0.05;
    (if lo < 0.0 { lo - pad } else { 0.0 }, hi + pad)
}
