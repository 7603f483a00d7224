use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, trace};

use crate::{
    config::PlotBounds,
    domain::{Coordinate, Domain},
    error::EvaluationError,
    evaluator::{CompiledFunction, Evaluator},
    interp::find_t,
    types::{Mode, Value},
};

/// One evaluated coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub coordinate: Coordinate,
    /// Whatever the evaluator returned, including non-finite values.
    pub raw: Result<Value, EvaluationError>,
    /// `raw` saturated into the clamp bounds, or `0` when `raw` is unusable.
    pub value: Value,
}

impl Sample {
    pub fn new(coordinate: Coordinate, raw: Result<Value, EvaluationError>, bounds: &PlotBounds) -> Self {
        let value = sanitize(&raw, bounds);
        Self {
            coordinate,
            raw,
            value,
        }
    }

    /// True when the evaluator failed or produced NaN or an infinity.
    pub fn is_substituted(&self) -> bool {
        !matches!(self.raw, Ok(v) if v.is_finite())
    }
}

/// Maps an evaluator result to the value the rest of the pipeline sees.
pub fn sanitize(raw: &Result<Value, EvaluationError>, bounds: &PlotBounds) -> Value {
    match raw {
        Ok(v) if v.is_finite() => bounds.saturate(*v),
        _ => 0.,
    }
}

/// Observed `[min, max]` of the clamped values across a surface grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    pub min: Value,
    pub max: Value,
}

impl ValueRange {
    /// Folds `values` into a range; `None` when there are none.
    pub fn of(values: impl IntoIterator<Item = Value>) -> Option<Self> {
        values.into_iter().fold(None, |range, v| {
            Some(match range {
                None => ValueRange { min: v, max: v },
                Some(r) => ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            })
        })
    }

    /// Position of `v` inside the range, or `0.5` for a flat range.
    pub fn normalize(&self, v: Value) -> Value {
        if self.max == self.min {
            0.5
        } else {
            find_t(self.min, self.max, v)
        }
    }
}

/// Result of the function sampler.
#[derive(Clone, Debug, PartialEq)]
pub struct Samples {
    pub domain: Domain,
    /// One sample per coordinate, in [`Domain::coordinates`] order.
    pub samples: Vec<Sample>,
    /// Only tracked for surfaces.
    pub range: Option<ValueRange>,
}

impl Samples {
    /// Number of samples whose value was replaced by `0`.
    pub fn substituted(&self) -> usize {
        self.samples.iter().filter(|s| s.is_substituted()).count()
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.samples.iter().map(|s| s.value)
    }
}

/// Evaluates `expression` at every coordinate of `domain`.
///
/// Never fails: evaluation errors and non-finite results become `0` for that
/// sample only. The expression is compiled once; if that fails, every sample
/// carries the compile error.
///
/// Surface rows are evaluated on the rayon pool and collected in row order,
/// so the output is identical to a sequential run.
pub fn sample(
    domain: &Domain,
    expression: &str,
    evaluator: &dyn Evaluator,
    bounds: &PlotBounds,
) -> Samples {
    let function = evaluator.compile(expression);
    if let Err(err) = &function {
        debug!(expression, %err, "expression does not compile, plotting zeros");
    }
    let eval_at = |coordinate: Coordinate| {
        let raw = match &function {
            Ok(f) => evaluate(f, coordinate),
            Err(err) => Err(err.clone()),
        };
        Sample::new(coordinate, raw, bounds)
    };

    let samples: Vec<Sample> = match domain.mode {
        Mode::Curve => domain.coordinates().map(eval_at).collect(),
        Mode::Surface => {
            let n = domain.resolution();
            let rows: Vec<Vec<Sample>> = (0..n)
                .into_par_iter()
                .map(|row| {
                    (0..n)
                        .map(|col| eval_at(domain.grid_point(row, col)))
                        .collect()
                })
                .collect();
            rows.into_iter().flatten().collect()
        }
    };

    let range = match domain.mode {
        Mode::Curve => None,
        Mode::Surface => ValueRange::of(samples.iter().map(|s| s.value)),
    };

    let result = Samples {
        domain: domain.clone(),
        samples,
        range,
    };
    debug!(
        expression,
        mode = ?domain.mode,
        count = result.samples.len(),
        substituted = result.substituted(),
        "sampled function"
    );
    result
}

fn evaluate(function: &CompiledFunction<'_>, coordinate: Coordinate) -> Result<Value, EvaluationError> {
    let raw = function(&coordinate.bindings());
    if let Err(err) = &raw {
        trace!(?coordinate, %err, "sample failed");
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprEvaluator;

    fn run(expression: &str, mode: Mode, resolution: usize) -> Samples {
        let bounds = PlotBounds::default();
        let domain = Domain::new(mode, resolution, &bounds);
        sample(&domain, expression, &ExprEvaluator, &bounds)
    }

    #[test]
    fn parabola_is_clamped() {
        let samples = run("x^2", Mode::Curve, 5);
        let raw: Vec<Value> = samples
            .samples
            .iter()
            .map(|s| s.raw.clone().unwrap())
            .collect();
        assert_eq!(raw, vec![36., 9., 0., 9., 36.]);
        assert_eq!(samples.values().collect::<Vec<_>>(), vec![10., 9., 0., 9., 10.]);
        assert_eq!(samples.range, None);
    }

    #[test]
    fn pole_becomes_zero_without_touching_neighbours() {
        let samples = run("1/x", Mode::Curve, 5);
        let values: Vec<Value> = samples.values().collect();
        assert_eq!(values[2], 0.);
        assert!(samples.samples[2].is_substituted());
        assert_eq!(values[1], -1. / 3.);
        assert_eq!(values[3], 1. / 3.);
        assert_eq!(samples.substituted(), 1);
    }

    #[test]
    fn runtime_failure_is_local() {
        // `y` is unbound in curve mode, but only the x > 0 branch touches it.
        let samples = run("x > 0 ? y : x", Mode::Curve, 5);
        let values: Vec<Value> = samples.values().collect();
        assert_eq!(values, vec![-6., -3., 0., 0., 0.]);
        assert_eq!(samples.substituted(), 2);
    }

    #[test]
    fn uncompilable_expression_gives_all_zeros() {
        let samples = run("sin(x", Mode::Surface, 4);
        assert_eq!(samples.samples.len(), 16);
        assert!(samples.values().all(|v| v == 0.));
        assert_eq!(samples.range, Some(ValueRange { min: 0., max: 0. }));
    }

    #[test]
    fn surface_tracks_min_and_max() {
        // axis = [-6, -2, 2, 6]
        let samples = run("x*y/4", Mode::Surface, 4);
        let range = samples.range.unwrap();
        assert_eq!(range.min, -9.);
        assert_eq!(range.max, 9.);
    }

    #[test]
    fn surface_value_at_four_four() {
        // resolution 7 puts 4 on the axis: [-6, -4, -2, 0, 2, 4, 6]
        let samples = run("x*y/4", Mode::Surface, 7);
        let at = samples
            .samples
            .iter()
            .find(|s| s.coordinate == Coordinate::XY(4., 4.))
            .unwrap();
        assert_eq!(at.raw, Ok(4.));
        assert_eq!(at.value, 4.);
    }

    #[test]
    fn flat_range_normalizes_to_midpoint() {
        let range = ValueRange { min: 3., max: 3. };
        assert_eq!(range.normalize(3.), 0.5);
        let range = ValueRange { min: -10., max: 10. };
        assert_eq!(range.normalize(0.), 0.5);
        assert_eq!(range.normalize(10.), 1.);
    }

    #[test]
    fn every_value_is_within_clamp_bounds() {
        for expression in ["tan(x*y)", "exp(x+y)", "-exp(x)*y", "log(x)"] {
            let samples = run(expression, Mode::Surface, 31);
            assert!(samples.values().all(|v| (-10. ..=10.).contains(&v)));
        }
    }
}
