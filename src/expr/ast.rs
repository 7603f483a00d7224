/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// A free variable or constant, resolved against the bindings at evaluation time.
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
    },
    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

/// Functions callable from an expression. Resolved while parsing, so unknown
/// names and wrong argument counts are syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Log2,
    Log10,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Round,
    Sign,
    Atan2,
    Min,
    Max,
    Pow,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Builtin::Sin,
            "cos" => Builtin::Cos,
            "tan" => Builtin::Tan,
            "asin" => Builtin::Asin,
            "acos" => Builtin::Acos,
            "atan" => Builtin::Atan,
            "sinh" => Builtin::Sinh,
            "cosh" => Builtin::Cosh,
            "tanh" => Builtin::Tanh,
            "exp" => Builtin::Exp,
            "log" | "ln" => Builtin::Log,
            "log2" => Builtin::Log2,
            "log10" => Builtin::Log10,
            "sqrt" => Builtin::Sqrt,
            "abs" => Builtin::Abs,
            "floor" => Builtin::Floor,
            "ceil" => Builtin::Ceil,
            "round" => Builtin::Round,
            "sign" => Builtin::Sign,
            "atan2" => Builtin::Atan2,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "pow" => Builtin::Pow,
            _ => return None,
        })
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Atan2 | Builtin::Min | Builtin::Max | Builtin::Pow => 2,
            _ => 1,
        }
    }

    pub fn apply(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Builtin::Sin, [a]) => a.sin(),
            (Builtin::Cos, [a]) => a.cos(),
            (Builtin::Tan, [a]) => a.tan(),
            (Builtin::Asin, [a]) => a.asin(),
            (Builtin::Acos, [a]) => a.acos(),
            (Builtin::Atan, [a]) => a.atan(),
            (Builtin::Sinh, [a]) => a.sinh(),
            (Builtin::Cosh, [a]) => a.cosh(),
            (Builtin::Tanh, [a]) => a.tanh(),
            (Builtin::Exp, [a]) => a.exp(),
            (Builtin::Log, [a]) => a.ln(),
            (Builtin::Log2, [a]) => a.log2(),
            (Builtin::Log10, [a]) => a.log10(),
            (Builtin::Sqrt, [a]) => a.sqrt(),
            (Builtin::Abs, [a]) => a.abs(),
            (Builtin::Floor, [a]) => a.floor(),
            (Builtin::Ceil, [a]) => a.ceil(),
            (Builtin::Round, [a]) => a.round(),
            (Builtin::Sign, [a]) => {
                if a.is_nan() || *a == 0. {
                    *a
                } else {
                    a.signum()
                }
            }
            (Builtin::Atan2, [y, x]) => y.atan2(*x),
            (Builtin::Min, [a, b]) => a.min(*b),
            (Builtin::Max, [a, b]) => a.max(*b),
            (Builtin::Pow, [a, b]) => a.powf(*b),
            // Arity is checked by the parser.
            _ => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ln_is_an_alias_for_log() {
        assert_eq!(Builtin::from_name("ln"), Some(Builtin::Log));
        assert_eq!(Builtin::from_name("nope"), None);
    }

    #[test]
    fn sign_keeps_zero() {
        assert_eq!(Builtin::Sign.apply(&[0.]), 0.);
        assert_eq!(Builtin::Sign.apply(&[-3.]), -1.);
    }

    #[test]
    fn atan2_takes_y_then_x() {
        let v = Builtin::Atan2.apply(&[1., 0.]);
        assert!((v - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
