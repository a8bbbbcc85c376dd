use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

/// Elementary functions understood by the substrate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Sqrt,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Sqrt => "sqrt",
        }
    }

    pub fn from_name(name: &str) -> Option<Func> {
        match name {
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "sinh" => Some(Func::Sinh),
            "cosh" => Some(Func::Cosh),
            "tanh" => Some(Func::Tanh),
            "exp" => Some(Func::Exp),
            "ln" | "log" => Some(Func::Ln),
            "sqrt" => Some(Func::Sqrt),
            _ => None,
        }
    }
}

/// A symbolic expression over exact rationals and named symbols.
///
/// Sums and products are n-ary so the simplifier can flatten, sort, and
/// collect terms into one canonical form. There are no dedicated `Sub`/`Div`
/// nodes: subtraction is addition of a `(-1)`-scaled term and division is a
/// `Pow(_, -1)` factor, which keeps every rewrite rule single-cased.
///
/// The derived `Ord` (variant order, then structural order) is the canonical
/// term ordering used by the simplifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Expr {
    Num(BigRational),
    Sym(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Num(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn rational(num: i64, den: i64) -> Expr {
        Expr::Num(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    pub fn sym(name: impl Into<String>) -> Expr {
        Expr::Sym(name.into())
    }

    /// Splits a comma-separated list into symbol expressions, e.g. `"t, r, theta"`.
    pub fn symbols(list: &str) -> Vec<Expr> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Expr::sym)
            .collect()
    }

    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }

    pub fn pow(self, exponent: Expr) -> Expr {
        Expr::Pow(self.boxed(), exponent.boxed())
    }

    pub fn sin(self) -> Expr {
        Expr::Func(Func::Sin, self.boxed())
    }

    pub fn cos(self) -> Expr {
        Expr::Func(Func::Cos, self.boxed())
    }

    pub fn tan(self) -> Expr {
        Expr::Func(Func::Tan, self.boxed())
    }

    pub fn exp(self) -> Expr {
        Expr::Func(Func::Exp, self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Func(Func::Ln, self.boxed())
    }

    pub fn sqrt(self) -> Expr {
        Expr::Func(Func::Sqrt, self.boxed())
    }

    pub fn as_number(&self) -> Option<&BigRational> {
        match self {
            Expr::Num(r) => Some(r),
            _ => None,
        }
    }

    /// True when `symbol` occurs anywhere in the expression tree.
    pub fn depends_on(&self, symbol: &str) -> bool {
        match self {
            Expr::Num(_) => false,
            Expr::Sym(name) => name == symbol,
            Expr::Add(terms) | Expr::Mul(terms) => terms.iter().any(|t| t.depends_on(symbol)),
            Expr::Pow(base, exponent) => base.depends_on(symbol) || exponent.depends_on(symbol),
            Expr::Func(_, arg) => arg.depends_on(symbol),
        }
    }

    /// Number of nodes in the tree; the unit of the simplification budget.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Num(_) | Expr::Sym(_) => 1,
            Expr::Add(terms) | Expr::Mul(terms) => {
                1 + terms.iter().map(Expr::node_count).sum::<usize>()
            }
            Expr::Pow(base, exponent) => 1 + base.node_count() + exponent.node_count(),
            Expr::Func(_, arg) => 1 + arg.node_count(),
        }
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Expr::int(0)
    }

    fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(r) if r.is_zero())
    }
}

impl One for Expr {
    fn one() -> Self {
        Expr::int(1)
    }

    fn is_one(&self) -> bool {
        matches!(self, Expr::Num(r) if r.is_one())
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, rhs])
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Add(vec![self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(vec![self, rhs])
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::Mul(vec![self, rhs.pow(Expr::int(-1))])
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Mul(vec![Expr::int(-1), self])
    }
}

impl AddAssign for Expr {
    fn add_assign(&mut self, rhs: Expr) {
        *self = std::mem::replace(self, Expr::zero()) + rhs;
    }
}

impl SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Expr) {
        *self = std::mem::replace(self, Expr::zero()) - rhs;
    }
}

impl MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Expr) {
        *self = std::mem::replace(self, Expr::zero()) * rhs;
    }
}

impl DivAssign for Expr {
    fn div_assign(&mut self, rhs: Expr) {
        *self = std::mem::replace(self, Expr::zero()) / rhs;
    }
}

fn fmt_operand(expr: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match expr {
        Expr::Add(_) => write!(f, "({expr})"),
        Expr::Num(r) if r.is_negative() || !r.is_integer() => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(r) => write!(f, "{r}"),
            Expr::Sym(name) => write!(f, "{name}"),
            Expr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
            Expr::Mul(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    fmt_operand(factor, f)?;
                }
                Ok(())
            }
            Expr::Pow(base, exponent) => {
                fmt_operand(base, f)?;
                write!(f, "^")?;
                match exponent.as_ref() {
                    Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => write!(f, "({exponent})"),
                    Expr::Num(r) if r.is_negative() || !r.is_integer() => {
                        write!(f, "({exponent})")
                    }
                    _ => write!(f, "{exponent}"),
                }
            }
            Expr::Func(func, arg) => write!(f, "{}({arg})", func.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_splits_and_trims() {
        let syms = Expr::symbols("t, r, theta , phi");
        assert_eq!(
            syms,
            vec![
                Expr::sym("t"),
                Expr::sym("r"),
                Expr::sym("theta"),
                Expr::sym("phi")
            ]
        );
    }

    #[test]
    fn operators_build_canonical_node_shapes() {
        let x = Expr::sym("x");
        let y = Expr::sym("y");
        assert_eq!(
            x.clone() - y.clone(),
            Expr::Add(vec![
                x.clone(),
                Expr::Mul(vec![Expr::int(-1), y.clone()])
            ])
        );
        assert_eq!(
            x.clone() / y.clone(),
            Expr::Mul(vec![x.clone(), y.clone().pow(Expr::int(-1))])
        );
        assert!(Expr::zero().is_zero());
        assert!(Expr::one().is_one());
    }

    #[test]
    fn depends_on_walks_the_whole_tree() {
        let e = (Expr::sym("r") * Expr::sym("theta").sin()).pow(Expr::int(2));
        assert!(e.depends_on("theta"));
        assert!(e.depends_on("r"));
        assert!(!e.depends_on("phi"));
    }

    #[test]
    fn display_is_readable() {
        let e = Expr::sym("r").pow(Expr::int(2)) * Expr::sym("theta").sin();
        assert_eq!(format!("{e}"), "r^2*sin(theta)");
    }
}
