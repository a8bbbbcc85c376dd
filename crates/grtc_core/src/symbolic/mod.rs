//! The symbolic expression substrate: exact-rational expression trees,
//! parsing, structural differentiation, the canonical simplification policy,
//! and LaTeX rendering.

pub mod diff;
pub mod expr;
pub mod latex;
pub mod parse;
pub mod simplify;

pub use diff::diff;
pub use expr::{Expr, Func};
pub use latex::{latex, latex_matrix, latex_symbol, latex_vector};
pub use parse::parse;
pub use simplify::{simplify, simplify_guarded, DEFAULT_NODE_BUDGET};
