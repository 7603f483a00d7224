use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, PlotError>;

/// Failure reported by an [`Evaluator`](crate::evaluator::Evaluator).
#[derive(Debug, Clone, PartialEq, Display)]
pub enum EvaluationError {
    /// The expression text could not be parsed. `offset` is a char index.
    #[display("parse error at {offset}: {message}")]
    Parse { message: String, offset: usize },
    #[display("unknown identifier `{_0}`")]
    UnknownIdentifier(String),
    #[display("unknown function `{_0}`")]
    UnknownFunction(String),
    #[display("`{function}` expects {expected} argument(s), found {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },
}

impl EvaluationError {
    pub fn parse(message: impl Into<String>, offset: usize) -> Self {
        Self::Parse {
            message: message.into(),
            offset,
        }
    }
}

impl std::error::Error for EvaluationError {}

/// Errors surfaced to the caller of the plotting pipeline.
///
/// Per-sample evaluation failures never show up here; the sampler replaces
/// them with `0` instead.
#[derive(Debug, Clone, PartialEq, Display, From)]
pub enum PlotError {
    /// The trial evaluation of a new expression failed; nothing was committed.
    #[display("syntax error: {_0}")]
    ExpressionSyntax(EvaluationError),
    #[display("expression is empty")]
    #[from(ignore)]
    EmptyExpression,
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::ExpressionSyntax(err) => Some(err),
            PlotError::EmptyExpression => None,
        }
    }
}
