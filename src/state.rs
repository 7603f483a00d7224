use std::sync::Arc;

use tracing::debug;

use crate::{
    config::{Configuration, PlotBounds},
    error::Result,
    evaluator::Evaluator,
    mesh::Geometry,
    pipeline::{build_geometry_with, trial_evaluate},
    types::Mode,
};

/// Returns `config` with `expression` swapped in, if the expression passes
/// the trial evaluation. `config` itself is never touched.
pub fn try_commit(
    config: &Configuration,
    expression: &str,
    evaluator: &dyn Evaluator,
) -> Result<Configuration> {
    trial_evaluate(expression, evaluator)?;
    Ok(config.with_expression(expression))
}

/// The last committed configuration and the geometry derived from it.
///
/// Synchronous: every successful change recomputes before returning. Bevy
/// apps use [`FunctionPlot`](crate::plugin::FunctionPlot) instead, which
/// recomputes in the background.
pub struct PlotState {
    config: Configuration,
    geometry: Arc<Geometry>,
    bounds: PlotBounds,
}

impl PlotState {
    /// Commits `config` and computes its geometry.
    ///
    /// Fails, like [`commit_expression`](PlotState::commit_expression), if the
    /// expression does not pass the trial evaluation.
    pub fn new(config: Configuration, evaluator: &dyn Evaluator) -> Result<Self> {
        Self::with_bounds(config, PlotBounds::default(), evaluator)
    }

    pub fn with_bounds(
        config: Configuration,
        bounds: PlotBounds,
        evaluator: &dyn Evaluator,
    ) -> Result<Self> {
        trial_evaluate(&config.expression, evaluator)?;
        let geometry = Arc::new(build_geometry_with(&config, evaluator, &bounds));
        Ok(Self {
            config,
            geometry,
            bounds,
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    pub fn bounds(&self) -> &PlotBounds {
        &self.bounds
    }

    /// Replaces the expression if it passes the trial evaluation.
    ///
    /// On error the configuration and geometry are left exactly as they were.
    pub fn commit_expression(&mut self, expression: &str, evaluator: &dyn Evaluator) -> Result<()> {
        let config = try_commit(&self.config, expression, evaluator)?;
        self.replace(config, evaluator);
        Ok(())
    }

    /// Changes the resolution. Values below 2 are sampled as 2.
    pub fn set_resolution(&mut self, resolution: usize, evaluator: &dyn Evaluator) {
        let config = self.config.with_resolution(resolution);
        self.replace(config, evaluator);
    }

    pub fn set_mode(&mut self, mode: Mode, evaluator: &dyn Evaluator) {
        let config = self.config.with_mode(mode);
        self.replace(config, evaluator);
    }

    /// Recomputes the geometry for the current configuration, e.g. after
    /// switching evaluators.
    pub fn refresh(&mut self, evaluator: &dyn Evaluator) {
        self.geometry = Arc::new(build_geometry_with(&self.config, evaluator, &self.bounds));
    }

    fn replace(&mut self, config: Configuration, evaluator: &dyn Evaluator) {
        if config == self.config {
            return;
        }
        debug!(?config, "recomputing plot");
        self.geometry = Arc::new(build_geometry_with(&config, evaluator, &self.bounds));
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::PlotError, expr::ExprEvaluator};

    #[test]
    fn rejected_commit_changes_nothing() {
        let mut state = PlotState::new(Configuration::curve("x^2", 5), &ExprEvaluator).unwrap();
        let before = Arc::clone(state.geometry());

        let err = state.commit_expression("sin(x", &ExprEvaluator).unwrap_err();
        assert!(matches!(err, PlotError::ExpressionSyntax(_)));
        assert_eq!(state.config(), &Configuration::curve("x^2", 5));
        assert!(Arc::ptr_eq(state.geometry(), &before));
    }

    #[test]
    fn accepted_commit_replaces_geometry() {
        let mut state = PlotState::new(Configuration::curve("x^2", 5), &ExprEvaluator).unwrap();
        state.commit_expression("x", &ExprEvaluator).unwrap();
        assert_eq!(state.config().expression, "x");
        let ys: Vec<f32> = state.geometry().positions().iter().map(|p| p[1]).collect();
        assert_eq!(ys, vec![-6., -3., 0., 3., 6.]);
    }

    #[test]
    fn mode_and_resolution_changes_recompute() {
        let mut state = PlotState::new(Configuration::curve("x*y/4", 5), &ExprEvaluator).unwrap();
        // y is unbound for curves, so the curve is flat
        assert!(state.geometry().positions().iter().all(|p| p[1] == 0.));

        state.set_mode(Mode::Surface, &ExprEvaluator);
        assert_eq!(state.geometry().len(), 25);

        state.set_resolution(1, &ExprEvaluator);
        assert_eq!(state.config().resolution, 1);
        assert_eq!(state.geometry().len(), 4);
    }

    #[test]
    fn refresh_uses_the_given_evaluator() {
        struct Constant;
        impl Evaluator for Constant {
            fn evaluate(
                &self,
                _: &str,
                _: &crate::evaluator::Bindings,
            ) -> core::result::Result<f64, crate::error::EvaluationError> {
                Ok(2.)
            }
        }

        let mut state = PlotState::new(Configuration::curve("x", 3), &ExprEvaluator).unwrap();
        state.refresh(&Constant);
        assert!(state.geometry().positions().iter().all(|p| p[1] == 2.));
    }

    #[test]
    fn invalid_initial_expression_is_rejected() {
        assert!(PlotState::new(Configuration::curve("foo(x)", 5), &ExprEvaluator).is_err());
    }

    #[test]
    fn try_commit_leaves_input_alone() {
        let config = Configuration::surface("x", 30);
        let next = try_commit(&config, "x + y", &ExprEvaluator).unwrap();
        assert_eq!(config.expression, "x");
        assert_eq!(next, Configuration::surface("x + y", 30));
    }
}
