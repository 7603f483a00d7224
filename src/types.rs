use nalgebra::Vector3;

/// Scalar produced by the evaluator and carried through sampling.
pub type Value = f64;

/// Vertex component type handed to the renderer.
pub type Real = f32;

/// A 3D vector with [`Real`] components.
pub type Vector = Vector3<Real>;

/// Linear RGB triple, each channel in `[0, 1]`.
pub type Rgb = [Real; 3];

/// Whether a function is plotted as `y = f(x)` or `z = f(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One free variable, rendered as a polyline.
    #[default]
    Curve,
    /// Two free variables, rendered as a tessellated height field.
    Surface,
}

impl Mode {
    /// Returns the other mode.
    pub fn toggled(self) -> Self {
        match self {
            Mode::Curve => Mode::Surface,
            Mode::Surface => Mode::Curve,
        }
    }
}
