//! Snap engine: bin spacing, snap window, windowed arg-max and view cropping.
//!
//! Every function here is pure and synchronous. Bad input is rejected, never
//! clamped.

use std::cmp::Ordering;

use crate::error::{PickError, PickResult};

/// Relative / absolute tolerance on spacing deviation before sampling is
/// reported as non-uniform.
const SPACING_REL_TOL: f64 = 1e-3;
const SPACING_ABS_TOL: f64 = 1e-6;

/// Minimum snap window, in native bins.
pub const MIN_SNAP_BINS: f64 = 3.0;

// ---------------------------------------------------------------------------
// Bin spacing
// ---------------------------------------------------------------------------

/// Median bin spacing plus the non-uniform sampling advisory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSpacing {
    pub df_hz: f64,
    /// Largest deviation from the median exceeded `max(1e-6, 1e-3 * median)`.
    pub non_uniform: bool,
}

/// Median of consecutive frequency differences.
///
/// Non-uniform sampling is logged and flagged but still yields the median.
pub fn compute_bin_spacing(frequencies: &[f64]) -> PickResult<BinSpacing> {
    if frequencies.len() < 2 {
        return Err(PickError::InvalidSpectrum(
            "cannot compute bin spacing from fewer than 2 samples of f_hz".into(),
        ));
    }
    let diffs: Vec<f64> = frequencies.windows(2).map(|w| w[1] - w[0]).collect();
    let df_hz = median(&diffs);
    if !(df_hz > 0.0) {
        return Err(PickError::InvalidSpectrum(format!(
            "computed bin spacing must be positive, got {df_hz}"
        )));
    }

    let max_dev = diffs
        .iter()
        .map(|d| (d - df_hz).abs())
        .fold(0.0_f64, f64::max);
    let non_uniform = max_dev > SPACING_ABS_TOL.max(SPACING_REL_TOL * df_hz);
    if non_uniform {
        log::warn!(
            "f_hz spacing is non-uniform (max deviation {max_dev:.3e} Hz); using median {df_hz} Hz"
        );
    }
    Ok(BinSpacing { df_hz, non_uniform })
}

/// Median of a non-empty slice; even counts average the two middle values.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

// ---------------------------------------------------------------------------
// Snap window
// ---------------------------------------------------------------------------

/// Hybrid snap window: the user tolerance, widened to at least three bins.
pub fn effective_snap_window(user_tolerance: f64, bin_spacing: f64) -> PickResult<f64> {
    if !(user_tolerance > 0.0) || !user_tolerance.is_finite() {
        return Err(PickError::InvalidParameter(format!(
            "user_snap_hz must be positive, got {user_tolerance}"
        )));
    }
    Ok(user_tolerance.max(MIN_SNAP_BINS * bin_spacing))
}

// ---------------------------------------------------------------------------
// Windowed arg-max
// ---------------------------------------------------------------------------

/// Index of the loudest sample within `[target - window, target + window]`.
///
/// Falls back to the sample nearest `target` when the interval is empty. Ties
/// go to the lowest index in both cases.
pub fn snap_to_peak(
    frequencies: &[f64],
    magnitudes: &[f64],
    target: f64,
    window: f64,
) -> PickResult<usize> {
    if !(window > 0.0) {
        return Err(PickError::InvalidParameter(format!(
            "window_hz must be positive, got {window}"
        )));
    }
    if !target.is_finite() {
        return Err(PickError::InvalidParameter(format!(
            "target_hz must be finite, got {target}"
        )));
    }
    if frequencies.is_empty() || frequencies.len() != magnitudes.len() {
        return Err(PickError::InvalidSpectrum(format!(
            "f_hz and mag must be non-empty and equally long (f_hz: {}, mag: {})",
            frequencies.len(),
            magnitudes.len()
        )));
    }

    let low = target - window;
    let high = target + window;
    let lo = frequencies.partition_point(|&f| f < low);
    let hi = frequencies.partition_point(|&f| f <= high);

    if lo >= hi {
        return Ok(first_min_by(frequencies, |f| (f - target).abs()));
    }
    Ok(lo + first_max(&magnitudes[lo..hi]))
}

/// Position of the first maximum.
pub(crate) fn first_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if v.total_cmp(&values[best]) == Ordering::Greater {
            best = i;
        }
    }
    best
}

fn first_min_by(values: &[f64], key: impl Fn(f64) -> f64) -> usize {
    let mut best = 0;
    let mut best_key = key(values[0]);
    for (i, &v) in values.iter().enumerate().skip(1) {
        let k = key(v);
        if k < best_key {
            best = i;
            best_key = k;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// View cropping
// ---------------------------------------------------------------------------

/// Restrict the series to samples in `[fmin, fmax)`.
///
/// Returns the cropped slices and the absolute index of the first retained
/// sample. View-local index `v` maps to absolute `v + offset`.
pub fn crop_to_window<'a>(
    frequencies: &'a [f64],
    magnitudes: &'a [f64],
    (fmin, fmax): (f64, f64),
) -> PickResult<(&'a [f64], &'a [f64], usize)> {
    if !(fmin < fmax) {
        return Err(PickError::InvalidParameter(format!(
            "xlim must be (min, max) with min < max, got ({fmin}, {fmax})"
        )));
    }
    if frequencies.len() != magnitudes.len() {
        return Err(PickError::InvalidSpectrum(format!(
            "f_hz and mag must be equally long (f_hz: {}, mag: {})",
            frequencies.len(),
            magnitudes.len()
        )));
    }
    let lo = frequencies.partition_point(|&f| f < fmin);
    let hi = frequencies.partition_point(|&f| f < fmax);
    if lo >= hi {
        return Err(PickError::EmptyWindow { fmin, fmax });
    }
    Ok((&frequencies[lo..hi], &magnitudes[lo..hi], lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn spacing_is_median_of_differences() {
        let s = compute_bin_spacing(&[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.df_hz, 1.0);
        assert!(!s.non_uniform);
    }

    #[test]
    fn spacing_flags_non_uniform_sampling() {
        // diffs: 1, 1, 3, 1 → median 1
        let s = compute_bin_spacing(&[0.0, 1.0, 2.0, 5.0, 6.0]).unwrap();
        assert_eq!(s.df_hz, 1.0);
        assert!(s.non_uniform);
    }

    #[test]
    fn spacing_averages_middle_pair_for_even_counts() {
        // diffs: 1, 2, 3, 4 → median 2.5
        let s = compute_bin_spacing(&[0.0, 1.0, 3.0, 6.0, 10.0]).unwrap();
        assert_eq!(s.df_hz, 2.5);
    }

    #[test]
    fn spacing_needs_two_samples() {
        let err = compute_bin_spacing(&[1.0]).unwrap_err();
        assert!(matches!(err, PickError::InvalidSpectrum(_)));
    }

    #[test]
    fn snap_window_spans_three_bins() {
        assert_eq!(effective_snap_window(0.5, 1.0).unwrap(), 3.0);
        assert_eq!(effective_snap_window(10.0, 1.0).unwrap(), 10.0);
        assert!(matches!(
            effective_snap_window(0.0, 1.0),
            Err(PickError::InvalidParameter(_))
        ));
        assert!(effective_snap_window(-1.0, 1.0).is_err());
    }

    #[test]
    fn snaps_to_loudest_in_window() {
        let f = ramp(10);
        let m = [0.0, 1.0, 2.0, 5.0, 1.0, 0.0, 1.0, 6.0, 2.0, 1.0];
        assert_eq!(snap_to_peak(&f, &m, 2.2, 3.0).unwrap(), 3);
        assert_eq!(snap_to_peak(&f, &m, 7.2, 3.0).unwrap(), 7);
    }

    #[test]
    fn snap_window_bounds_are_inclusive() {
        let f = ramp(6);
        let m = [0.0, 0.0, 9.0, 0.0, 0.0, 0.0];
        // window [3, 5] excludes index 2; [2, 4] includes it
        assert_eq!(snap_to_peak(&f, &m, 4.0, 1.0).unwrap(), 3);
        assert_eq!(snap_to_peak(&f, &m, 3.0, 1.0).unwrap(), 2);
    }

    #[test]
    fn snap_ties_pick_lowest_index() {
        let f = ramp(5);
        let m = [1.0, 4.0, 4.0, 4.0, 1.0];
        assert_eq!(snap_to_peak(&f, &m, 2.0, 2.0).unwrap(), 1);
    }

    #[test]
    fn snap_falls_back_to_nearest_bin() {
        let f = [0.0, 10.0, 20.0];
        let m = [5.0, 1.0, 1.0];
        assert_eq!(snap_to_peak(&f, &m, 14.0, 1.0).unwrap(), 1);
        assert_eq!(snap_to_peak(&f, &m, 1000.0, 1.0).unwrap(), 2);
        assert_eq!(snap_to_peak(&f, &m, -50.0, 1.0).unwrap(), 0);
        // equidistant → lower index
        assert_eq!(snap_to_peak(&f, &m, 15.0, 1.0).unwrap(), 1);
    }

    #[test]
    fn snap_rejects_bad_window() {
        let f = ramp(3);
        let m = [0.0; 3];
        assert!(matches!(
            snap_to_peak(&f, &m, 1.0, 0.0),
            Err(PickError::InvalidParameter(_))
        ));
        assert!(snap_to_peak(&f, &m, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn crop_keeps_half_open_window() {
        let f = ramp(10);
        let m: Vec<f64> = f.iter().map(|v| v * 10.0).collect();
        let (cf, cm, offset) = crop_to_window(&f, &m, (2.5, 6.0)).unwrap();
        assert_eq!(cf, &[3.0, 4.0, 5.0]);
        assert_eq!(cm, &[30.0, 40.0, 50.0]);
        assert_eq!(offset, 3);
        for k in offset..offset + cf.len() {
            let local = k - offset;
            assert_eq!(f[offset + local], cf[local]);
            assert_eq!(offset + local, k);
        }
    }

    #[test]
    fn crop_rejects_degenerate_and_empty_windows() {
        let f = ramp(10);
        let m = vec![0.0; 10];
        assert!(matches!(
            crop_to_window(&f, &m, (5.0, 5.0)),
            Err(PickError::InvalidParameter(_))
        ));
        assert!(matches!(
            crop_to_window(&f, &m, (20.0, 30.0)),
            Err(PickError::EmptyWindow { .. })
        ));
        assert!(matches!(
            crop_to_window(&f, &m, (3.2, 3.8)),
            Err(PickError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn crop_rejects_mismatched_lengths() {
        let err = crop_to_window(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0], (0.0, 4.0)).unwrap_err();
        assert!(matches!(err, PickError::InvalidSpectrum(_)));
        assert!(err.to_string().contains("mag: 2"));
    }
}
