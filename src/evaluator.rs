use std::borrow::Cow;
use std::f64::consts::{E, PI};

use crate::{error::EvaluationError, types::Value};

/// Variable values visible to an expression during one evaluation.
///
/// Lookups scan from the most recently bound name, so a later binding shadows
/// an earlier one with the same name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    vars: Vec<(Cow<'static, str>, Value)>,
}

impl Bindings {
    /// Empty bindings, without the `pi` and `e` constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings holding only the `pi` and `e` constants.
    pub fn with_constants() -> Self {
        Self::new().with("pi", PI).with("e", E)
    }

    /// `{pi, e, x}`: used for every curve sample.
    pub fn curve(x: Value) -> Self {
        Self::with_constants().with("x", x)
    }

    /// `{pi, e, x, y}`: used for every surface sample.
    pub fn surface(x: Value, y: Value) -> Self {
        Self::with_constants().with("x", x).with("y", y)
    }

    pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: Value) {
        self.vars.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// An expression prepared for repeated evaluation against different bindings.
pub type CompiledFunction<'a> =
    dyn Fn(&Bindings) -> Result<Value, EvaluationError> + Send + Sync + 'a;

/// The capability the pipeline uses to turn text into numbers.
///
/// Implementations must be pure: the same expression and bindings always give
/// the same result. Non-finite results are allowed and are sanitized by the
/// sampler.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<Value, EvaluationError>;

    /// Prepares `expression` once so a batch of samples can skip re-parsing.
    ///
    /// The default defers every call to [`evaluate`](Evaluator::evaluate), so
    /// it never fails up front.
    fn compile<'a>(
        &'a self,
        expression: &'a str,
    ) -> Result<Box<CompiledFunction<'a>>, EvaluationError> {
        Ok(Box::new(move |bindings: &Bindings| {
            self.evaluate(expression, bindings)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl Evaluator for Doubler {
        fn evaluate(&self, _: &str, bindings: &Bindings) -> Result<Value, EvaluationError> {
            bindings
                .get("x")
                .map(|x| 2. * x)
                .ok_or_else(|| EvaluationError::UnknownIdentifier("x".into()))
        }
    }

    #[test]
    fn later_bindings_shadow_earlier_ones() {
        let bindings = Bindings::with_constants().with("pi", 3.);
        assert_eq!(bindings.get("pi"), Some(3.));
        assert_eq!(bindings.get("e"), Some(E));
        assert_eq!(bindings.get("x"), None);
    }

    #[test]
    fn surface_bindings_carry_both_axes() {
        let bindings = Bindings::surface(1.5, -2.);
        assert_eq!(bindings.get("x"), Some(1.5));
        assert_eq!(bindings.get("y"), Some(-2.));
        assert_eq!(bindings.get("pi"), Some(PI));
    }

    #[test]
    fn default_compile_defers_to_evaluate() {
        let evaluator = Doubler;
        let f = evaluator.compile("ignored").unwrap();
        assert_eq!(f(&Bindings::curve(4.)).unwrap(), 8.);
        assert!(f(&Bindings::new()).is_err());
    }
}
