use std::path::Path;

use anyhow::{Result, bail};

use super::canvas::{Canvas, Margins, Range};
use crate::color;

const GRID_DIVISIONS: usize = 5;

/// Wide left margin so feature names fit beside their bars.
const IMPORTANCE_MARGINS: Margins = Margins {
    left: 280,
    right: 40,
    top: 60,
    bottom: 80,
};
const FEATURE_NAME_SIZE: f32 = 15.0;

// ---------------------------------------------------------------------------
// Selling price distribution
// ---------------------------------------------------------------------------

/// Histogram of `values` with a kernel-density curve scaled to counts.
pub fn distribution(values: &[f64], path: &Path) -> Result<()> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        bail!("no finite values to plot in {}", path.display());
    }

    let bins = sturges_bins(values.len());
    let hist = Histogram::new(&values, bins);
    let curve = kde_curve(&values, hist.range, 200);
    let scale = values.len() as f64 * hist.bin_width();

    let peak = hist
        .counts
        .iter()
        .map(|&c| c as f64)
        .chain(curve.iter().map(|(_, d)| d * scale))
        .fold(0.0, f64::max);

    let mut canvas = Canvas::new(1000, 600, hist.range, Range::new(0.0, peak * 1.05))?;
    canvas.grid(GRID_DIVISIONS);

    let fill = color::viridis_mid();
    let edge = color::lighten(fill, 0.8);
    for (i, &count) in hist.counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let (lo, hi) = hist.edges(i);
        canvas.fill_rect((lo, 0.0), (hi, count as f64), fill);
        canvas.line((lo, 0.0), (lo, count as f64), edge);
    }

    let scaled: Vec<(f64, f64)> = curve.iter().map(|&(x, d)| (x, d * scale)).collect();
    canvas.polyline(&scaled, color::viridis_ramp(2)[0]);
    canvas.axes(GRID_DIVISIONS, true);
    canvas.title("Distribution of Selling Price");
    canvas.x_label("Selling Price (lakhs)");
    canvas.y_label("Frequency");
    canvas.save(path)
}

/// Equal-width bins over the data range.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub range: Range,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn new(values: &[f64], bins: usize) -> Self {
        let range = Range::of(values.iter().copied());
        let bins = bins.max(1);
        let mut counts = vec![0usize; bins];
        for &v in values {
            let pos = ((v - range.min) / range.span() * bins as f64) as usize;
            counts[pos.min(bins - 1)] += 1;
        }
        Histogram { range, counts }
    }

    pub fn bin_width(&self) -> f64 {
        self.range.span() / self.counts.len() as f64
    }

    pub fn edges(&self, bin: usize) -> (f64, f64) {
        let lo = self.range.min + bin as f64 * self.bin_width();
        (lo, lo + self.bin_width())
    }
}

/// Sturges' rule: `ceil(log2 n) + 1`.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

/// Gaussian KDE with Scott's bandwidth, sampled at `points` positions
/// across `range`. Returns `(x, density)` pairs.
pub fn kde_curve(values: &[f64], range: Range, points: usize) -> Vec<(f64, f64)> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = if values.len() > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    let bandwidth = (var.sqrt() * n.powf(-0.2)).max(1e-6 * range.span().max(1.0));
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    let points = points.max(2);
    (0..points)
        .map(|i| {
            let x = range.min + range.span() * i as f64 / (points - 1) as f64;
            let density = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Feature importance
// ---------------------------------------------------------------------------

/// Horizontal bars for the `top` most important features, largest at the top,
/// each named on the left. `ranked` must be sorted from most to least
/// important.
pub fn feature_importance(ranked: &[(String, f64)], top: usize, path: &Path) -> Result<()> {
    let shown = &ranked[..top.min(ranked.len())];
    if shown.is_empty() {
        bail!("no feature importances to plot in {}", path.display());
    }

    let max = shown.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let n = shown.len() as f64;
    let mut canvas = Canvas::new(1200, 800, Range::new(0.0, max * 1.05), Range::new(0.0, n))?
        .with_margins(IMPORTANCE_MARGINS);
    canvas.grid(GRID_DIVISIONS);

    // darkest bar for the strongest feature
    let colors = color::viridis_ramp(shown.len());
    for (rank, ((name, importance), fill)) in shown.iter().zip(colors).enumerate() {
        let top_edge = n - rank as f64 - 0.1;
        let bottom_edge = n - rank as f64 - 0.9;
        canvas.fill_rect((0.0, bottom_edge), (*importance, top_edge), fill);
        canvas.label_left_of_axis(n - rank as f64 - 0.5, name, FEATURE_NAME_SIZE);
        log::debug!("bar {rank}: {name} = {importance:.4}");
    }

    canvas.axes(GRID_DIVISIONS, false);
    canvas.title(&format!("Top {} Feature Importances - Random Forest", shown.len()));
    canvas.x_label("Importance Score");
    canvas.y_label("Features");
    canvas.save(path)
}

// ---------------------------------------------------------------------------
// Actual vs predicted
// ---------------------------------------------------------------------------

/// Scatter of actual (x) against predicted (y) prices with a dashed
/// identity line from 0 to `max + 1`.
pub fn actual_vs_predicted(actual: &[f64], predicted: &[f64], path: &Path) -> Result<()> {
    if actual.len() != predicted.len() {
        bail!(
            "{} actual values but {} predictions",
            actual.len(),
            predicted.len()
        );
    }
    let limit = actual
        .iter()
        .chain(predicted)
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max)
        + 1.0;

    let axis = Range::new(0.0, limit);
    let mut canvas = Canvas::new(1000, 800, axis, axis)?;
    canvas.grid(GRID_DIVISIONS);

    let point = color::lighten(color::viridis_mid(), 0.4);
    for (&a, &p) in actual.iter().zip(predicted) {
        canvas.dot(a, p, 4, point);
    }

    canvas.dashed_line((0.0, 0.0), (limit, limit), color::IDENTITY_LINE, 10.0, 6.0);
    canvas.axes(GRID_DIVISIONS, true);
    canvas.title("Actual vs Predicted Prices");
    canvas.x_label("Actual Selling Price (lakhs)");
    canvas.y_label("Predicted Price (lakhs)");
    canvas.save(path)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn sturges_rule() {
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(8), 4);
        assert_eq!(sturges_bins(301), 10);
    }

    #[test]
    fn histogram_puts_max_in_last_bin() {
        let hist = Histogram::new(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(hist.counts, vec![1, 1, 1, 2]);
        assert_relative_eq!(hist.bin_width(), 1.0);
        assert_eq!(hist.edges(2), (2.0, 3.0));
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0, 6.0];
        let range = Range::new(-10.0, 20.0);
        let curve = kde_curve(&values, range, 2000);
        let step = range.span() / 1999.0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn charts_are_written() {
        let dir = tempfile::tempdir().unwrap();

        let dist = dir.path().join("dist.png");
        distribution(&[1.0, 2.0, 2.0, 3.5, 8.0], &dist).unwrap();

        let imp = dir.path().join("imp.png");
        let ranked = vec![("a".to_string(), 0.7), ("b".to_string(), 0.3)];
        feature_importance(&ranked, 15, &imp).unwrap();

        let scatter = dir.path().join("scatter.png");
        actual_vs_predicted(&[1.0, 2.0], &[1.5, 1.8], &scatter).unwrap();

        for path in [dist, imp, scatter] {
            let img = image::open(&path).unwrap();
            assert!(img.width() > 0);
        }
    }

    /// Whether any pixel in the window differs from the background.
    fn has_ink(img: &image::RgbImage, x: std::ops::Range<u32>, y: std::ops::Range<u32>) -> bool {
        y.flat_map(|py| x.clone().map(move |px| (px, py)))
            .any(|(px, py)| *img.get_pixel(px, py) != color::BACKGROUND)
    }

    #[test]
    fn importance_bars_are_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imp.png");
        let ranked = vec![
            ("Present_Price".to_string(), 0.6),
            ("Selling_type_Individual".to_string(), 0.4),
        ];
        feature_importance(&ranked, 15, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();

        // between the rotated axis label and the tick marks: only names
        let names_x = 60..IMPORTANCE_MARGINS.left - 10;
        let plot_bottom = img.height() - IMPORTANCE_MARGINS.bottom;
        let mid = IMPORTANCE_MARGINS.top + (plot_bottom - IMPORTANCE_MARGINS.top) / 2;
        // first bar occupies the upper half, second the lower half
        assert!(has_ink(&img, names_x.clone(), IMPORTANCE_MARGINS.top..mid));
        assert!(has_ink(&img, names_x, mid..plot_bottom));
        // title
        assert!(has_ink(&img, 0..img.width(), 0..IMPORTANCE_MARGINS.top));
    }

    #[test]
    fn empty_inputs_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(distribution(&[], &dir.path().join("x.png")).is_err());
        assert!(feature_importance(&[], 15, &dir.path().join("y.png")).is_err());
        assert!(actual_vs_predicted(&[1.0], &[], &dir.path().join("z.png")).is_err());
    }
}
