//! The `grtc_core` crate is the symbolic tensor-calculus engine behind the
//! GRTC calculator: it turns a coordinate system and a metric into
//! Christoffel symbols, covariant and Lie derivatives of scalar/vector/
//! rank-2 tensor fields, Killing-field verdicts, and typeset equations.
//!
//! Key components:
//! - **symbolic**: exact-rational expression trees, parsing, differentiation,
//!   the canonical simplification policy, and LaTeX rendering.
//! - **tensor**: metric + inverse, Christoffel symbols, and the field types
//!   with variance-tagged derivative formulas.
//! - **equations**: the formatting seam to the (external) presentation layer.
//!
//! The engine is single-threaded and request-scoped: every entry point
//! rebuilds its value objects from raw input, so no state survives a request
//! and no failure can leak into the next one.

pub mod equations;
pub mod error;
pub mod symbolic;
pub mod tensor;

pub use error::{Result, TensorError};
