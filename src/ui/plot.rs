use eframe::egui::{Align2, Color32, PointerButton, RichText, Stroke, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, Polygon, Text, VLine};

use freq_pick::color::{self, overlay_style, OverlayStyle, Rgb, BANDS};
use freq_pick::controller::{DragEnd, Gesture};
use freq_pick::data::overlay::OverlaySeries;

use crate::state::{modifiers_from, AppState};

fn color32([r, g, b]: Rgb) -> Color32 {
    Color32::from_rgb(r, g, b)
}

// ---------------------------------------------------------------------------
// Picker plot (central panel)
// ---------------------------------------------------------------------------

/// Render the spectrum and translate pointer input into gestures.
///
/// Plain drags pan the plot; drags and clicks with the modifier held select.
pub fn picker_plot(ui: &mut Ui, state: &mut AppState) {
    let modifiers = ui.input(|i| modifiers_from(i.modifiers));
    let selecting = modifiers.contains(state.controller.modifier());

    let mut plot = Plot::new("picker_plot")
        .legend(Legend::default())
        .x_axis_label("Frequency (Hz)")
        .y_axis_label(state.y_axis_label())
        .allow_drag(!selecting)
        .allow_boxed_zoom(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if let Some((fmin, fmax)) = state.controller.settings().xlim {
        plot = plot.include_x(fmin).include_x(fmax);
    }
    if state.reset_bounds {
        plot = plot.reset();
        state.reset_bounds = false;
    }

    let controller = &state.controller;
    let freqs = controller.view_frequencies();
    let mags = controller.displayed_magnitudes();
    let overlays = controller.displayed_overlays();
    let selected = controller.selected_in_view();
    let drag_start = state.drag_start;

    let response = plot.show(ui, |plot_ui| {
        // ---- Overlay bands, then lines ----
        for (lower, upper) in BANDS {
            let (Some(lo), Some(hi)) = (find(&overlays, lower), find(&overlays, upper)) else {
                continue;
            };
            if let OverlayStyle::BandLower {
                color, alpha, label, ..
            } = overlay_style(lower)
            {
                let ring: Vec<[f64; 2]> = freqs
                    .iter()
                    .zip(lo)
                    .map(|(&f, &y)| [f, y])
                    .chain(freqs.iter().zip(hi).rev().map(|(&f, &y)| [f, y]))
                    .collect();
                plot_ui.polygon(
                    Polygon::new(ring)
                        .name(label)
                        .fill_color(color32(color).gamma_multiply(alpha))
                        .stroke(Stroke::NONE),
                );
            }
        }
        for (series, values) in &overlays {
            if let OverlayStyle::Line { color } = overlay_style(*series) {
                plot_ui.line(
                    Line::new(points(freqs, values))
                        .name(series.name())
                        .color(color32(color))
                        .width(1.1),
                );
            }
        }

        // ---- Spectrum ----
        plot_ui.line(
            Line::new(points(freqs, mags))
                .name("spectrum")
                .color(color32(color::SPECTRUM))
                .width(1.0),
        );

        // ---- Selection markers ----
        let y_top = y_max(mags);
        for &v in &selected {
            let hz = freqs[v];
            plot_ui.vline(VLine::new(hz).color(color32(color::SELECTION)).width(1.2));
            plot_ui.text(
                Text::new(
                    PlotPoint::new(hz, y_top),
                    RichText::new(format!("{hz:.2} Hz")).color(color32(color::SELECTION)),
                )
                .anchor(Align2::RIGHT_TOP),
            );
        }

        // ---- Rubber band for the drag in progress ----
        let pointer = plot_ui.pointer_coordinate();
        if let (Some(DragEnd { point: Some([x0, y0]), .. }), Some(p)) = (drag_start, pointer) {
            let rect = vec![[x0, y0], [p.x, y0], [p.x, p.y], [x0, p.y]];
            plot_ui.polygon(
                Polygon::new(rect)
                    .fill_color(Color32::from_rgba_unmultiplied(31, 119, 180, 38))
                    .stroke(Stroke::new(1.0, Color32::from_rgb(31, 119, 180))),
            );
        }

        let r = plot_ui.response();
        PointerInput {
            point: pointer.map(|p| [p.x, p.y]),
            hovered: r.hovered(),
            drag_started: r.drag_started_by(PointerButton::Primary),
            drag_stopped: r.drag_stopped_by(PointerButton::Primary),
            clicked: r.clicked(),
        }
    });

    let input = response.inner;
    let here = DragEnd {
        point: input.point,
        modifiers,
    };

    if input.hovered {
        if let Some([x, _]) = input.point {
            if state.controller.last_pointer_hz() != Some(x) {
                state.dispatch(Gesture::PointerMoved { freq_hz: x });
            }
        }
    }
    if input.drag_started {
        state.drag_start = Some(here);
    }
    if input.drag_stopped {
        if let Some(start) = state.drag_start.take() {
            state.dispatch(Gesture::RegionSelect { start, end: here });
        }
    }
    if input.clicked {
        state.dispatch(Gesture::Click {
            point: input.point,
            modifiers,
        });
    }
}

/// Pointer facts collected inside the plot closure.
struct PointerInput {
    point: Option<[f64; 2]>,
    hovered: bool,
    drag_started: bool,
    drag_stopped: bool,
    clicked: bool,
}

fn points(xs: &[f64], ys: &[f64]) -> Vec<[f64; 2]> {
    xs.iter().zip(ys).map(|(&x, &y)| [x, y]).collect()
}

fn find(overlays: &[(OverlaySeries, Vec<f64>)], series: OverlaySeries) -> Option<&[f64]> {
    overlays
        .iter()
        .find(|(s, _)| *s == series)
        .map(|(_, v)| v.as_slice())
}

fn y_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
