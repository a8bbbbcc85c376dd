use crate::symbolic::expr::{Expr, Func};

/// Partial derivative of `expr` with respect to the symbol `var`.
///
/// Purely structural; the result is not normalized, so callers run it through
/// the simplification policy before handing it out.
pub fn diff(expr: &Expr, var: &str) -> Expr {
    match expr {
        Expr::Num(_) => Expr::int(0),
        Expr::Sym(name) => {
            if name == var {
                Expr::int(1)
            } else {
                Expr::int(0)
            }
        }
        Expr::Add(terms) => Expr::Add(terms.iter().map(|t| diff(t, var)).collect()),
        Expr::Mul(factors) => {
            // n-ary product rule: sum over each factor differentiated in place.
            let mut terms = Vec::with_capacity(factors.len());
            for i in 0..factors.len() {
                let mut product = Vec::with_capacity(factors.len());
                for (j, factor) in factors.iter().enumerate() {
                    if i == j {
                        product.push(diff(factor, var));
                    } else {
                        product.push(factor.clone());
                    }
                }
                terms.push(Expr::Mul(product));
            }
            Expr::Add(terms)
        }
        Expr::Pow(base, exponent) => {
            let u = base.as_ref();
            let v = exponent.as_ref();
            if !v.depends_on(var) {
                // d(u^c) = c * u^(c-1) * u'
                v.clone()
                    * u.clone().pow(v.clone() - Expr::int(1))
                    * diff(u, var)
            } else {
                // d(u^v) = u^v * (v' ln u + v u'/u)
                u.clone().pow(v.clone())
                    * (diff(v, var) * u.clone().ln() + v.clone() * diff(u, var) / u.clone())
            }
        }
        Expr::Func(func, arg) => {
            let u = arg.as_ref();
            let inner = diff(u, var);
            let outer = match func {
                Func::Sin => u.clone().cos(),
                Func::Cos => -u.clone().sin(),
                Func::Tan => Expr::int(1) + u.clone().tan().pow(Expr::int(2)),
                Func::Sinh => Expr::Func(Func::Cosh, u.clone().boxed()),
                Func::Cosh => Expr::Func(Func::Sinh, u.clone().boxed()),
                Func::Tanh => {
                    Expr::int(1) - Expr::Func(Func::Tanh, u.clone().boxed()).pow(Expr::int(2))
                }
                Func::Exp => u.clone().exp(),
                Func::Ln => Expr::int(1) / u.clone(),
                Func::Sqrt => Expr::int(1) / (Expr::int(2) * u.clone().sqrt()),
            };
            outer * inner
        }
    }
}
