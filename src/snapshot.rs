use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use crate::color::{self, overlay_style, OverlayStyle, Rgb, BANDS};
use crate::controller::Controller;
use crate::data::model::DisplayDomain;
use crate::data::overlay::OverlaySeries;

const MIN_SIZE: u32 = 64;
const GRID_DIVISIONS: usize = 10;
const FONT: &str = "sans-serif";

/// Looked up once when the first plot is rendered; `FREQ_PICK_FONT` wins.
const FONT_CANDIDATES: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Register a TTF under [`FONT`] for plot text. Returns whether one is available.
fn ensure_font() -> bool {
    *FONT_READY.get_or_init(|| {
        let env = std::env::var("FREQ_PICK_FONT").ok();
        let candidates = env.iter().map(String::as_str).chain(FONT_CANDIDATES);
        for path in candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match register_font(FONT, FontStyle::Normal, bytes) {
                Ok(()) => {
                    log::debug!("Plot font: {path}");
                    return true;
                }
                Err(_) => log::debug!("Not a usable font: {path}"),
            }
        }
        log::warn!("No TrueType font found; PNG snapshots will have no text");
        false
    })
}

// ---------------------------------------------------------------------------
// Plot snapshot – what the picker showed at commit time
// ---------------------------------------------------------------------------

/// Data needed to redraw the picker view headlessly.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSnapshot {
    pub title: Option<String>,
    /// Domain of `magnitudes` and `overlays`.
    pub display_domain: DisplayDomain,
    pub frequencies: Vec<f64>,
    /// Magnitudes in the display domain active at capture time.
    pub magnitudes: Vec<f64>,
    pub overlays: Vec<(OverlaySeries, Vec<f64>)>,
    /// Selected frequencies inside the view.
    pub markers_hz: Vec<f64>,
    pub xlim: Option<(f64, f64)>,
}

impl PlotSnapshot {
    pub fn from_controller(controller: &Controller<'_>) -> Self {
        let frequencies = controller.view_frequencies().to_vec();
        let markers_hz = controller
            .selected_in_view()
            .into_iter()
            .map(|v| frequencies[v])
            .collect();
        PlotSnapshot {
            title: controller.title().map(str::to_string),
            display_domain: controller.display_domain(),
            magnitudes: controller.displayed_magnitudes().to_vec(),
            overlays: controller.displayed_overlays(),
            markers_hz,
            xlim: controller.settings().xlim,
            frequencies,
        }
    }

    fn overlay(&self, series: OverlaySeries) -> Option<&[f64]> {
        self.overlays
            .iter()
            .find(|(s, _)| *s == series)
            .map(|(_, v)| v.as_slice())
    }

    fn x_range(&self) -> (f64, f64) {
        let (lo, hi) = self.xlim.unwrap_or_else(|| {
            (
                self.frequencies.first().copied().unwrap_or(0.0),
                self.frequencies.last().copied().unwrap_or(1.0),
            )
        });
        padded(lo, hi, 0.0)
    }

    fn y_range(&self) -> (f64, f64) {
        let values = self
            .magnitudes
            .iter()
            .chain(self.overlays.iter().flat_map(|(_, v)| v.iter()))
            .copied()
            .filter(|v| v.is_finite());
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo > hi {
            return (0.0, 1.0);
        }
        padded(lo, hi, 0.05)
    }

    /// Rasterise the view: title, axes, overlay bands and lines, spectrum,
    /// labelled selection markers and a legend.
    ///
    /// Text needs a TrueType font on disk; without one the chart is drawn unlabelled.
    pub fn render(&self, width: u32, height: u32) -> Result<RgbImage> {
        let (width, height) = (width.max(MIN_SIZE), height.max(MIN_SIZE));
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            let labelled = ensure_font();
            if let Err(e) = self.draw(&root, labelled) {
                if !labelled {
                    return Err(e);
                }
                log::warn!("Could not draw plot text ({e:#}); rendering without labels");
                self.draw(&root, false)?;
            }
            root.present().map_err(draw_err)?;
        }
        RgbImage::from_raw(width, height, buffer).context("plot buffer has the wrong size")
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, labelled: bool) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&rgb(color::BACKGROUND)).map_err(draw_err)?;

        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();

        let mut builder = ChartBuilder::on(root);
        builder.margin(10);
        if labelled {
            if let Some(title) = &self.title {
                builder.caption(title, (FONT, 20));
            }
            builder.x_label_area_size(40).y_label_area_size(60);
        }
        let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1).map_err(draw_err)?;

        if labelled {
            chart
                .configure_mesh()
                .x_desc("Frequency (Hz)")
                .y_desc(self.display_domain.axis_label())
                .light_line_style(rgb(color::GRID))
                .bold_line_style(rgb(color::GRID))
                .draw()
                .map_err(draw_err)?;
        } else {
            let grid = rgb(color::GRID).stroke_width(1);
            for i in 1..GRID_DIVISIONS {
                let t = i as f64 / GRID_DIVISIONS as f64;
                let (x, y) = (x0 + t * (x1 - x0), y0 + t * (y1 - y0));
                chart
                    .draw_series(LineSeries::new([(x, y0), (x, y1)], grid))
                    .map_err(draw_err)?;
                chart
                    .draw_series(LineSeries::new([(x0, y), (x1, y)], grid))
                    .map_err(draw_err)?;
            }
        }

        // ---- Overlay bands, then lines ----
        for (lower, upper) in BANDS {
            let (Some(lo), Some(hi)) = (self.overlay(lower), self.overlay(upper)) else {
                continue;
            };
            let OverlayStyle::BandLower {
                color, alpha, label, ..
            } = overlay_style(lower)
            else {
                continue;
            };
            let fill = rgb(color).mix(alpha as f64);
            let ring: Vec<(f64, f64)> = self
                .frequencies
                .iter()
                .zip(lo)
                .map(|(&f, &y)| (f, y))
                .chain(self.frequencies.iter().zip(hi).rev().map(|(&f, &y)| (f, y)))
                .collect();
            chart
                .draw_series(std::iter::once(Polygon::new(ring, fill.filled())))
                .map_err(draw_err)?
                .label(label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 16, y + 5)], fill.filled()));
        }
        for (series, values) in &self.overlays {
            if let OverlayStyle::Line { color } = overlay_style(*series) {
                let style = rgb(color).stroke_width(1);
                chart
                    .draw_series(LineSeries::new(points(&self.frequencies, values), style))
                    .map_err(draw_err)?
                    .label(series.name())
                    .legend(move |(x, y)| PathElement::new([(x, y), (x + 16, y)], style));
            }
        }

        // ---- Spectrum ----
        let spectrum = rgb(color::SPECTRUM).stroke_width(1);
        chart
            .draw_series(LineSeries::new(points(&self.frequencies, &self.magnitudes), spectrum))
            .map_err(draw_err)?
            .label("spectrum")
            .legend(move |(x, y)| PathElement::new([(x, y), (x + 16, y)], spectrum));

        // ---- Selection markers ----
        let marker = rgb(color::SELECTION);
        for &hz in self.markers_hz.iter().filter(|hz| (x0..=x1).contains(*hz)) {
            chart
                .draw_series(LineSeries::new([(hz, y0), (hz, y1)], marker.stroke_width(2)))
                .map_err(draw_err)?;
            if labelled {
                chart
                    .draw_series(std::iter::once(Text::new(
                        format!("{hz:.2} Hz"),
                        (hz, y1),
                        (FONT, 14).into_font().color(&marker),
                    )))
                    .map_err(draw_err)?;
            }
        }

        if labelled {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(rgb(color::BACKGROUND).mix(0.85))
                .border_style(rgb(color::GRID))
                .draw()
                .map_err(draw_err)?;
        }
        Ok(())
    }
}

fn rgb([r, g, b]: Rgb) -> RGBColor {
    RGBColor(r, g, b)
}

fn draw_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow!("drawing plot: {e:?}")
}

fn points(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect()
}

fn padded(lo: f64, hi: f64, fraction: f64) -> (f64, f64) {
    if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * fraction;
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PickerConfig;
    use crate::data::model::Spectrum;
    use crate::data::overlay::OverlayContext;

    fn snapshot() -> PlotSnapshot {
        PlotSnapshot {
            title: Some("bench".into()),
            display_domain: DisplayDomain::Linear,
            frequencies: (0..11).map(|i| i as f64).collect(),
            magnitudes: vec![0.0, 1.0, 0.0, 3.0, 0.0, 1.0, 0.0, 2.0, 0.0, 1.0, 0.0],
            overlays: vec![],
            markers_hz: vec![3.0],
            xlim: None,
        }
    }

    fn is_selection_red(px: &image::Rgb<u8>) -> bool {
        px.0 == color::SELECTION
    }

    #[test]
    fn renders_requested_size() {
        let img = snapshot().render(320, 200).unwrap();
        assert_eq!(img.dimensions(), (320, 200));
    }

    #[test]
    fn marker_is_drawn_in_selection_colour() {
        let img = snapshot().render(320, 200).unwrap();
        assert!(img.pixels().any(is_selection_red));
    }

    #[test]
    fn no_markers_means_no_selection_colour() {
        let snap = PlotSnapshot {
            markers_hz: vec![],
            ..snapshot()
        };
        let img = snap.render(320, 200).unwrap();
        assert!(!img.pixels().any(is_selection_red));
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        let snap = PlotSnapshot {
            frequencies: vec![5.0],
            magnitudes: vec![1.0],
            markers_hz: vec![],
            ..snapshot()
        };
        let img = snap.render(10, 10).unwrap();
        assert_eq!(img.width(), MIN_SIZE);

        let empty = PlotSnapshot {
            frequencies: vec![],
            magnitudes: vec![],
            markers_hz: vec![],
            ..snapshot()
        };
        empty.render(100, 100).unwrap();
    }

    #[test]
    fn controller_state_reaches_snapshot() {
        let f: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let m: Vec<f64> = (0..11).map(|i| 1.0 + i as f64).collect();
        let s = Spectrum::new(f, m, DisplayDomain::Linear).unwrap();
        let context = OverlayContext {
            p25: Some(vec![0.5; 11]),
            p75: Some(vec![2.0; 11]),
            ..OverlayContext::default()
        };
        let config = PickerConfig {
            title: Some("Run 7".into()),
            title_append: Some("[2/5]".into()),
            xlim: Some((2.0, 6.0)),
            ..PickerConfig::default()
        };
        let mut c = Controller::new(&s, Some(&context), &config).unwrap();
        c.apply(crate::config::Action::ToggleScale);

        let snap = PlotSnapshot::from_controller(&c);
        assert_eq!(snap.title.as_deref(), Some("Run 7 [2/5]"));
        assert_eq!(snap.display_domain, DisplayDomain::Db);
        assert_eq!(snap.frequencies, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(snap.xlim, Some((2.0, 6.0)));
        assert_eq!(snap.overlays.len(), 2);
        assert!(snap.overlays.iter().all(|(_, v)| v.len() == 4));
    }
}
