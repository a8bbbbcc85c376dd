//! The tensor-calculus layer: coordinate systems, the metric and its
//! inverse, Christoffel symbols, and the scalar/vector/rank-2 fields with
//! their covariant and Lie derivatives. Everything is a plain value object
//! constructed per request; nothing is cached across requests.

pub mod christoffel;
pub mod coords;
pub mod fields;
pub mod metric;

pub use christoffel::ChristoffelSymbol;
pub use coords::Coordinates;
pub use fields::{ScalarField, TensorField, Variance, VectorField};
pub use metric::MetricTensor;
