use palette::{Hsl, IntoColor, Srgb};

use crate::data::overlay::OverlaySeries;

/// Plain 8-bit RGB, shared by the egui view and the PNG snapshot.
pub type Rgb = [u8; 3];

pub const SPECTRUM: Rgb = [20, 20, 20];
pub const SELECTION: Rgb = [214, 39, 40];
pub const GRID: Rgb = [225, 225, 225];
pub const BACKGROUND: Rgb = [255, 255, 255];

/// Convert an HSL triple (hue in degrees) to 8-bit sRGB.
fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    [
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

// ---------------------------------------------------------------------------
// Overlay styling
// ---------------------------------------------------------------------------

/// How an overlay series is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayStyle {
    Line { color: Rgb },
    /// Lower edge of a filled band; `upper` names the series closing it.
    BandLower {
        upper: OverlaySeries,
        color: Rgb,
        alpha: f32,
        label: &'static str,
    },
    /// Upper edge of a band, drawn by its lower partner.
    BandUpper,
}

/// Band pairs, outer first so the inner band paints over it.
pub const BANDS: [(OverlaySeries, OverlaySeries); 2] = [
    (OverlaySeries::P10, OverlaySeries::P90),
    (OverlaySeries::P25, OverlaySeries::P75),
];

pub fn overlay_style(series: OverlaySeries) -> OverlayStyle {
    match series {
        OverlaySeries::Mean => OverlayStyle::Line {
            color: hsl_to_rgb(210.0, 0.65, 0.42),
        },
        OverlaySeries::Median => OverlayStyle::Line {
            color: hsl_to_rgb(30.0, 0.9, 0.5),
        },
        OverlaySeries::P10 => OverlayStyle::BandLower {
            upper: OverlaySeries::P90,
            color: hsl_to_rgb(0.0, 0.0, 0.5),
            alpha: 0.12,
            label: "p10-p90",
        },
        OverlaySeries::P25 => OverlayStyle::BandLower {
            upper: OverlaySeries::P75,
            color: hsl_to_rgb(210.0, 0.65, 0.42),
            alpha: 0.18,
            label: "p25-p75",
        },
        OverlaySeries::P75 | OverlaySeries::P90 => OverlayStyle::BandUpper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        let [r, g, b] = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!(r >= 254 && g <= 1 && b <= 1);
        let [r, g, b] = hsl_to_rgb(0.0, 0.0, 0.0);
        assert_eq!((r, g, b), (0, 0, 0));
    }

    #[test]
    fn bands_pair_lower_with_upper() {
        for (lower, upper) in BANDS {
            match overlay_style(lower) {
                OverlayStyle::BandLower { upper: u, .. } => assert_eq!(u, upper),
                other => panic!("{lower} should open a band, got {other:?}"),
            }
            assert_eq!(overlay_style(upper), OverlayStyle::BandUpper);
        }
    }
}
