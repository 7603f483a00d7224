use tracing::{debug, warn};

use crate::{
    color::{curve_color, surface_color},
    config::{Configuration, PlotBounds},
    domain::Domain,
    error::{PlotError, Result},
    evaluator::{Bindings, Evaluator},
    mesh::Geometry,
    sampler::{Samples, ValueRange, sample},
    types::{Mode, Real, Value},
};

/// Runs the whole pipeline with the default [`PlotBounds`].
///
/// ```text
/// Configuration
///   → Domain::new        coordinates
///   → sample             raw values → clamped values (+ min/max for surfaces)
///   → curve_color / surface_color
///   → Geometry::line_strip / Geometry::grid
/// ```
///
/// Pure and deterministic: equal configurations give equal geometry.
pub fn build_geometry(config: &Configuration, evaluator: &dyn Evaluator) -> Geometry {
    build_geometry_with(config, evaluator, &PlotBounds::default())
}

pub fn build_geometry_with(
    config: &Configuration,
    evaluator: &dyn Evaluator,
    bounds: &PlotBounds,
) -> Geometry {
    let domain = Domain::new(config.mode, config.resolution, bounds);
    if domain.resolution() != config.resolution {
        debug!(
            requested = config.resolution,
            used = domain.resolution(),
            "resolution raised to the minimum"
        );
    }
    let samples = sample(&domain, &config.expression, evaluator, bounds);
    assemble(&samples, bounds)
}

/// Colors the samples and hands them to the geometry builder.
pub fn assemble(samples: &Samples, bounds: &PlotBounds) -> Geometry {
    match samples.domain.mode {
        Mode::Curve => {
            let positions = samples
                .samples
                .iter()
                .map(|s| [s.coordinate.x() as Real, s.value as Real, 0.])
                .collect();
            let colors = samples
                .values()
                .map(|v| curve_color(v, bounds))
                .collect();
            Geometry::line_strip(positions, colors)
        }
        Mode::Surface => {
            // Surfaces always carry a range.
            let range = samples
                .range
                .unwrap_or(ValueRange { min: 0., max: 0. });
            let positions = samples
                .samples
                .iter()
                .map(|s| {
                    let y = s.coordinate.y().unwrap_or_default();
                    [s.coordinate.x() as Real, y as Real, s.value as Real]
                })
                .collect();
            let colors = samples
                .values()
                .map(|v| surface_color(v, &range))
                .collect();
            Geometry::grid(samples.domain.resolution(), positions, colors)
        }
    }
}

/// Evaluates `expression` once at `x = 1, y = 1`.
///
/// This is the gate a new expression must pass before it replaces the active
/// one. Only evaluator errors reject; a non-finite result is accepted and
/// sanitized later like any other sample.
pub fn trial_evaluate(expression: &str, evaluator: &dyn Evaluator) -> Result<Value> {
    if expression.trim().is_empty() {
        return Err(PlotError::EmptyExpression);
    }
    evaluator
        .evaluate(expression, &Bindings::surface(1., 1.))
        .map_err(|err| {
            warn!(expression, %err, "rejected expression");
            PlotError::from(err)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::EvaluationError, expr::ExprEvaluator, mesh::Topology};

    #[test]
    fn curve_geometry_follows_the_samples() {
        let geometry = build_geometry(&Configuration::curve("x^2", 5), &ExprEvaluator);
        assert_eq!(geometry.mode, Mode::Curve);
        assert_eq!(geometry.topology, Topology::LineStrip);
        let positions = geometry.positions();
        assert_eq!(
            positions,
            vec![
                [-6., 10., 0.],
                [-3., 9., 0.],
                [0., 0., 0.],
                [3., 9., 0.],
                [6., 10., 0.],
            ]
        );
    }

    #[test]
    fn surface_geometry_has_n_squared_vertices() {
        let geometry = build_geometry(&Configuration::surface("sin(x)*cos(y)", 12), &ExprEvaluator);
        assert_eq!(geometry.len(), 144);
        assert_eq!(geometry.normals().unwrap().len(), 144);
        assert_eq!(geometry.positions()[0], [-6., -6., ((-6f64).sin() * (-6f64).cos()) as f32]);
    }

    #[test]
    fn assembled_grids_are_always_complete() {
        for resolution in [0, 1, 2, 3, 17, 150] {
            let config = Configuration::surface("x - y", resolution);
            let geometry = build_geometry(&config, &ExprEvaluator);
            let Topology::Grid { size, tris, normals } = &geometry.topology else {
                panic!("surface must be a grid");
            };
            assert_eq!(geometry.len(), size * size);
            assert_eq!(normals.len(), geometry.len());
            assert!(tris.iter().flatten().all(|&i| (i as usize) < geometry.len()));
        }
    }

    #[test]
    fn flat_surface_uses_the_mid_color() {
        let geometry = build_geometry(&Configuration::surface("3", 4), &ExprEvaluator);
        let expected = crate::color::height_color(0.5);
        assert!(geometry.vertices.iter().all(|v| v.color == expected));
    }

    #[test]
    fn trial_rejects_unterminated_call() {
        let err = trial_evaluate("sin(x", &ExprEvaluator).unwrap_err();
        assert!(matches!(
            err,
            PlotError::ExpressionSyntax(EvaluationError::Parse { .. })
        ));
    }

    #[test]
    fn trial_rejects_unknown_names_and_blank_input() {
        assert!(trial_evaluate("x * z", &ExprEvaluator).is_err());
        assert_eq!(trial_evaluate("  ", &ExprEvaluator), Err(PlotError::EmptyExpression));
    }

    #[test]
    fn trial_accepts_non_finite_results() {
        assert!(trial_evaluate("1/(x-1)", &ExprEvaluator).unwrap().is_infinite());
    }
}
