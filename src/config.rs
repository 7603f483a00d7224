use crate::types::{Mode, Value};

/// Fixed constants shared by every stage of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotBounds {
    /// Sampling covers `[-half_width, half_width]` on every free axis.
    pub half_width: Value,
    /// Evaluated values are saturated into `[clamp_min, clamp_max]`.
    pub clamp_min: Value,
    pub clamp_max: Value,
    /// Resolution range a UI should offer.
    pub resolution_min: usize,
    pub resolution_max: usize,
    /// Smallest resolution the pipeline will ever sample with.
    pub resolution_floor: usize,
}

impl Default for PlotBounds {
    fn default() -> Self {
        Self {
            half_width: 6.,
            clamp_min: -10.,
            clamp_max: 10.,
            resolution_min: 30,
            resolution_max: 150,
            resolution_floor: 2,
        }
    }
}

impl PlotBounds {
    /// Clamps a user-facing resolution into `[resolution_min, resolution_max]`.
    pub fn clamp_ui_resolution(&self, resolution: usize) -> usize {
        resolution.clamp(self.resolution_min, self.resolution_max)
    }

    /// Resolution actually sampled: anything below the floor becomes the floor.
    pub fn effective_resolution(&self, resolution: usize) -> usize {
        resolution.max(self.resolution_floor)
    }

    /// Saturates `value` into the clamp bounds. Callers must filter non-finite values first.
    pub fn saturate(&self, value: Value) -> Value {
        value.clamp(self.clamp_min, self.clamp_max)
    }
}

/// Everything a pipeline run depends on.
///
/// Two equal configurations always produce identical geometry, so this is
/// also the memoization key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Configuration {
    pub expression: String,
    pub resolution: usize,
    pub mode: Mode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            expression: "sin(x)".to_string(),
            resolution: 100,
            mode: Mode::Curve,
        }
    }
}

impl Configuration {
    pub fn new(expression: impl Into<String>, resolution: usize, mode: Mode) -> Self {
        Self {
            expression: expression.into(),
            resolution,
            mode,
        }
    }

    pub fn curve(expression: impl Into<String>, resolution: usize) -> Self {
        Self::new(expression, resolution, Mode::Curve)
    }

    pub fn surface(expression: impl Into<String>, resolution: usize) -> Self {
        Self::new(expression, resolution, Mode::Surface)
    }

    pub fn with_expression(&self, expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..self.clone()
        }
    }

    pub fn with_resolution(&self, resolution: usize) -> Self {
        Self {
            resolution,
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_floored_at_two() {
        let bounds = PlotBounds::default();
        assert_eq!(bounds.effective_resolution(0), 2);
        assert_eq!(bounds.effective_resolution(1), 2);
        assert_eq!(bounds.effective_resolution(7), 7);
    }

    #[test]
    fn ui_resolution_is_clamped() {
        let bounds = PlotBounds::default();
        assert_eq!(bounds.clamp_ui_resolution(5), 30);
        assert_eq!(bounds.clamp_ui_resolution(80), 80);
        assert_eq!(bounds.clamp_ui_resolution(1000), 150);
    }

    #[test]
    fn saturate_clamps_both_ends() {
        let bounds = PlotBounds::default();
        assert_eq!(bounds.saturate(36.), 10.);
        assert_eq!(bounds.saturate(-11.5), -10.);
        assert_eq!(bounds.saturate(4.), 4.);
    }

    #[test]
    fn with_builders_leave_original_untouched() {
        let base = Configuration::curve("x", 40);
        let changed = base.with_mode(Mode::Surface).with_resolution(60);
        assert_eq!(base, Configuration::curve("x", 40));
        assert_eq!(changed, Configuration::surface("x", 60));
    }
}
