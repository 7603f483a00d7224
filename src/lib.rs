pub mod cache;
pub mod color;
pub mod config;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod interp;
pub mod mesh;
pub mod pipeline;
pub mod plugin;
pub mod request;
pub mod sampler;
pub mod state;
pub mod types;

pub use config::{Configuration, PlotBounds};
pub use evaluator::{Bindings, Evaluator};
pub use expr::ExprEvaluator;
pub use mesh::Geometry;
pub use pipeline::build_geometry;
pub use plugin::{FunctionPlot, FunctionPlotPlugin};
pub use types::Mode;
