//! Per-vertex colors for both plot modes.
//!
//! Curves use a fixed red/green ramp over the value itself. Surfaces use a
//! three band blue → cyan → yellow → orange ramp over the height normalized
//! by the grid's own min and max.
//!
//! ```text
//!  t:   0.0          0.33          0.66           1.0
//!       |---- low ----|---- mid ----|---- high ----|
//!       width 0.33     width 0.33    width 0.34
//! ```

use crate::{
    config::PlotBounds,
    interp::find_t,
    sampler::ValueRange,
    types::{Real, Rgb, Value},
};

/// Upper edge of the low band.
pub const LOW_BAND_END: Value = 0.33;
/// Upper edge of the mid band.
pub const MID_BAND_END: Value = 0.66;

/// Curve color for a clamped value.
///
/// `t = (value + half_width) / (2 * half_width)` is saturated into `[0, 1]`
/// since values range over the clamp bounds, which are wider than the domain.
pub fn curve_color(value: Value, bounds: &PlotBounds) -> Rgb {
    let t = find_t(-bounds.half_width, bounds.half_width, value).clamp(0., 1.);
    rgb(0.2 + 0.8 * t, 0.2 + 0.8 * (1. - t), 0.2)
}

/// Surface color for a clamped value, given the grid's observed range.
pub fn surface_color(value: Value, range: &ValueRange) -> Rgb {
    height_color(range.normalize(value))
}

/// Three band ramp over a normalized height `t`.
///
/// Each band interpolates over its own local `t`.
pub fn height_color(t: Value) -> Rgb {
    let t = t.clamp(0., 1.);
    if t < LOW_BAND_END {
        let lt = t / LOW_BAND_END;
        rgb(0.4 * lt, 0.4 + 0.6 * lt, 0.9)
    } else if t < MID_BAND_END {
        let lt = (t - LOW_BAND_END) / 0.33;
        rgb(0.4 + 0.5 * lt, 0.9, 0.9 - 0.6 * lt)
    } else {
        let lt = (t - MID_BAND_END) / 0.34;
        rgb(0.9, 0.9 - 0.6 * lt, 0.3 - 0.2 * lt)
    }
}

fn rgb(r: Value, g: Value, b: Value) -> Rgb {
    [r, g, b].map(|c| c.clamp(0., 1.) as Real)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rgb(actual: Rgb, expected: [f32; 3]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn curve_ramp_endpoints() {
        let bounds = PlotBounds::default();
        assert_rgb(curve_color(-6., &bounds), [0.2, 1.0, 0.2]);
        assert_rgb(curve_color(0., &bounds), [0.6, 0.6, 0.2]);
        assert_rgb(curve_color(6., &bounds), [1.0, 0.2, 0.2]);
    }

    #[test]
    fn curve_ramp_saturates_beyond_the_domain() {
        let bounds = PlotBounds::default();
        assert_eq!(curve_color(10., &bounds), curve_color(6., &bounds));
        assert_eq!(curve_color(-10., &bounds), curve_color(-6., &bounds));
    }

    #[test]
    fn band_starts() {
        assert_rgb(height_color(0.), [0.0, 0.4, 0.9]);
        assert_rgb(height_color(0.33), [0.4, 0.9, 0.9]);
        assert_rgb(height_color(0.66), [0.9, 0.9, 0.3]);
        assert_rgb(height_color(1.), [0.9, 0.3, 0.1]);
    }

    #[test]
    fn band_interiors_use_local_t() {
        // halfway through each band
        assert_rgb(height_color(0.165), [0.2, 0.7, 0.9]);
        assert_rgb(height_color(0.495), [0.65, 0.9, 0.6]);
        assert_rgb(height_color(0.83), [0.9, 0.6, 0.2]);
    }

    #[test]
    fn high_band_joins_mid_band() {
        let below = height_color(0.66 - 1e-9);
        let at = height_color(0.66);
        for (a, b) in below.iter().zip(at) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn flat_surface_is_mid_colored() {
        let range = ValueRange { min: 0., max: 0. };
        assert_eq!(surface_color(0., &range), height_color(0.5));
    }

    #[test]
    fn channels_stay_in_unit_range() {
        let bounds = PlotBounds::default();
        for i in 0..=200 {
            let v = -10. + i as Value * 0.1;
            let t = i as Value / 200.;
            for c in curve_color(v, &bounds).into_iter().chain(height_color(t)) {
                assert!((0. ..=1.).contains(&c));
            }
        }
    }
}
