use crate::{
    config::PlotBounds,
    evaluator::Bindings,
    interp::linspace,
    types::{Mode, Value},
};

/// One input location handed to the evaluator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Coordinate {
    X(Value),
    XY(Value, Value),
}

impl Coordinate {
    pub fn x(&self) -> Value {
        match *self {
            Coordinate::X(x) | Coordinate::XY(x, _) => x,
        }
    }

    pub fn y(&self) -> Option<Value> {
        match *self {
            Coordinate::X(_) => None,
            Coordinate::XY(_, y) => Some(y),
        }
    }

    /// `{x}` or `{x, y}`, plus `pi` and `e`.
    pub fn bindings(&self) -> Bindings {
        match *self {
            Coordinate::X(x) => Bindings::curve(x),
            Coordinate::XY(x, y) => Bindings::surface(x, y),
        }
    }
}

/// The ordered input coordinates for one pipeline run.
///
/// Both axes share the same `axis` spacing. Surface coordinates are row-major:
/// row `r` holds `y = axis[r]` and column `c` holds `x = axis[c]`, so
/// coordinate `i` sits at row `i / n`, column `i % n`.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    pub mode: Mode,
    pub axis: Vec<Value>,
}

impl Domain {
    /// Samples `[-half_width, half_width]` with `resolution` points per axis.
    ///
    /// Resolutions below the floor (2) are raised to it.
    pub fn new(mode: Mode, resolution: usize, bounds: &PlotBounds) -> Self {
        let n = bounds.effective_resolution(resolution);
        Self {
            mode,
            axis: linspace(-bounds.half_width, bounds.half_width, n),
        }
    }

    /// Points per axis.
    pub fn resolution(&self) -> usize {
        self.axis.len()
    }

    /// Total number of coordinates: `n` for curves, `n * n` for surfaces.
    pub fn len(&self) -> usize {
        match self.mode {
            Mode::Curve => self.axis.len(),
            Mode::Surface => self.axis.len() * self.axis.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    /// Coordinate at row `row`, column `col` of a surface grid.
    #[inline]
    pub fn grid_point(&self, row: usize, col: usize) -> Coordinate {
        Coordinate::XY(self.axis[col], self.axis[row])
    }

    /// Every coordinate in sampling order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        let n = self.axis.len();
        (0..self.len()).map(move |i| match self.mode {
            Mode::Curve => Coordinate::X(self.axis[i]),
            Mode::Surface => self.grid_point(i / n, i % n),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_spans_the_domain() {
        let domain = Domain::new(Mode::Curve, 5, &PlotBounds::default());
        let xs: Vec<Value> = domain.coordinates().map(|c| c.x()).collect();
        assert_eq!(xs, vec![-6., -3., 0., 3., 6.]);
        assert!(domain.coordinates().all(|c| c.y().is_none()));
    }

    #[test]
    fn degenerate_resolution_becomes_a_segment() {
        for resolution in [0, 1] {
            let domain = Domain::new(Mode::Curve, resolution, &PlotBounds::default());
            let xs: Vec<Value> = domain.coordinates().map(|c| c.x()).collect();
            assert_eq!(xs, vec![-6., 6.]);
        }
    }

    #[test]
    fn surface_is_row_major() {
        let domain = Domain::new(Mode::Surface, 3, &PlotBounds::default());
        let points: Vec<Coordinate> = domain.coordinates().collect();
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], Coordinate::XY(-6., -6.));
        assert_eq!(points[1], Coordinate::XY(0., -6.));
        assert_eq!(points[3], Coordinate::XY(-6., 0.));
        assert_eq!(points[8], Coordinate::XY(6., 6.));
    }

    #[test]
    fn surface_corners_hit_the_bounds() {
        for n in [2, 7, 30, 150] {
            let domain = Domain::new(Mode::Surface, n, &PlotBounds::default());
            assert_eq!(domain.len(), n * n);
            let points: Vec<Coordinate> = domain.coordinates().collect();
            assert_eq!(points[0], Coordinate::XY(-6., -6.));
            assert_eq!(points[n * n - 1], Coordinate::XY(6., 6.));
            assert!(points.iter().all(|p| {
                let y = p.y().unwrap_or(f64::NAN);
                (-6. ..=6.).contains(&p.x()) && (-6. ..=6.).contains(&y)
            }));
        }
    }
}
