//! LaTeX rendering for canonical expressions. Pure formatting: nothing here
//! re-simplifies or mutates, it only typesets what the tensor layer computed.

use nalgebra::DMatrix;
use num_rational::BigRational;
use num_traits::{One, Signed};

use crate::symbolic::expr::{Expr, Func};

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi",
    "omega",
];

/// Typesets a symbol name, mapping greek names to their commands.
pub fn latex_symbol(name: &str) -> String {
    if GREEK.contains(&name) {
        format!("\\{name}")
    } else {
        name.to_string()
    }
}

/// Typesets one expression.
pub fn latex(expr: &Expr) -> String {
    match expr {
        Expr::Num(r) => latex_rational(r),
        Expr::Sym(name) => latex_symbol(name),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                let rendered = latex(term);
                if i == 0 {
                    out.push_str(&rendered);
                } else if let Some(stripped) = rendered.strip_prefix('-') {
                    out.push_str(" - ");
                    out.push_str(stripped);
                } else {
                    out.push_str(" + ");
                    out.push_str(&rendered);
                }
            }
            out
        }
        Expr::Mul(factors) => latex_product(factors),
        Expr::Pow(..) => latex_product(std::slice::from_ref(expr)),
        Expr::Func(func, arg) => latex_func(*func, arg, None),
    }
}

fn latex_rational(r: &BigRational) -> String {
    let sign = if r.is_negative() { "-" } else { "" };
    let magnitude = r.abs();
    if magnitude.is_integer() {
        format!("{sign}{}", magnitude.numer())
    } else {
        format!("{sign}\\frac{{{}}}{{{}}}", magnitude.numer(), magnitude.denom())
    }
}

/// Renders a product as `\frac{..}{..}` when negative powers are present,
/// so rational tensor components read as fractions rather than as
/// negative exponents.
fn latex_product(factors: &[Expr]) -> String {
    let mut sign = "";
    let mut numer: Vec<String> = Vec::new();
    let mut denom: Vec<String> = Vec::new();

    for factor in factors {
        match factor {
            Expr::Num(r) => {
                let mut r = r.clone();
                if r.is_negative() {
                    sign = if sign.is_empty() { "-" } else { "" };
                    r = -r;
                }
                if !r.numer().is_one() {
                    numer.push(r.numer().to_string());
                }
                if !r.is_integer() {
                    denom.push(r.denom().to_string());
                }
            }
            Expr::Pow(base, exponent) => match negative_exponent(exponent) {
                Some(flipped) => denom.push(latex_power(base, &flipped)),
                None => numer.push(latex_power(base, exponent)),
            },
            other => numer.push(latex_operand(other)),
        }
    }

    let numer = if numer.is_empty() {
        "1".to_string()
    } else {
        numer.join(" ")
    };
    if denom.is_empty() {
        format!("{sign}{numer}")
    } else {
        format!("{sign}\\frac{{{numer}}}{{{}}}", denom.join(" "))
    }
}

/// For a negative exponent, the positive counterpart; otherwise `None`.
fn negative_exponent(exponent: &Expr) -> Option<Expr> {
    match exponent {
        Expr::Num(r) if r.is_negative() => Some(Expr::Num(-r.clone())),
        Expr::Mul(factors) => match factors.first() {
            Some(Expr::Num(r)) if r.is_negative() => {
                let mut flipped = factors.clone();
                flipped[0] = Expr::Num(-r.clone());
                Some(Expr::Mul(flipped))
            }
            _ => None,
        },
        _ => None,
    }
}

fn latex_power(base: &Expr, exponent: &Expr) -> String {
    if exponent.is_one() {
        return latex_operand(base);
    }
    if let Expr::Func(func, arg) = base {
        return latex_func(*func, arg, Some(exponent));
    }
    format!("{}^{{{}}}", latex_operand(base), latex(exponent))
}

fn latex_func(func: Func, arg: &Expr, exponent: Option<&Expr>) -> String {
    let power = match exponent {
        Some(e) => format!("^{{{}}}", latex(e)),
        None => String::new(),
    };
    match func {
        Func::Exp if power.is_empty() => format!("e^{{{}}}", latex(arg)),
        Func::Exp => format!("\\left(e^{{{}}}\\right){power}", latex(arg)),
        Func::Sqrt => format!("\\sqrt{{{}}}{power}", latex(arg)),
        Func::Ln => format!("\\ln{power}\\left({}\\right)", latex(arg)),
        other => format!("\\{}{power}\\left({}\\right)", other.name(), latex(arg)),
    }
}

/// Wraps compound subexpressions in `\left( \right)`.
fn latex_operand(expr: &Expr) -> String {
    match expr {
        Expr::Add(_) => format!("\\left({}\\right)", latex(expr)),
        Expr::Mul(_) => format!("\\left({}\\right)", latex(expr)),
        Expr::Num(r) if r.is_negative() || !r.is_integer() => {
            format!("\\left({}\\right)", latex(expr))
        }
        _ => latex(expr),
    }
}

/// Typesets a length-N component array.
pub fn latex_vector(components: &[Expr]) -> String {
    let body: Vec<String> = components.iter().map(latex).collect();
    format!("\\left[{}\\right]", body.join(", \\; "))
}

/// Typesets an N×N component matrix.
pub fn latex_matrix(matrix: &DMatrix<Expr>) -> String {
    let mut rows: Vec<String> = Vec::with_capacity(matrix.nrows());
    for i in 0..matrix.nrows() {
        let cells: Vec<String> = (0..matrix.ncols()).map(|j| latex(&matrix[(i, j)])).collect();
        rows.push(cells.join(" & "));
    }
    format!(
        "\\left[\\begin{{matrix}}{}\\end{{matrix}}\\right]",
        rows.join(" \\\\ ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::simplify::simplify;

    #[test]
    fn greek_symbols_and_powers() {
        let expr = simplify(&(Expr::sym("r").pow(Expr::int(2)) * Expr::sym("theta").sin().pow(Expr::int(2))));
        assert_eq!(latex(&expr), "r^{2} \\sin^{2}\\left(\\theta\\right)");
    }

    #[test]
    fn negative_powers_become_fractions() {
        let expr = simplify(&(Expr::sym("M") / Expr::sym("r").pow(Expr::int(2))));
        assert_eq!(latex(&expr), "\\frac{M}{r^{2}}");
    }

    #[test]
    fn powers_of_exp_keep_their_exponent() {
        let x = Expr::sym("x");
        let expr = simplify(&x.clone().exp().pow(Expr::int(2)));
        assert_eq!(latex(&expr), "\\left(e^{x}\\right)^{2}");
        assert_eq!(latex(&simplify(&x.clone().exp())), "e^{x}");
    }

    #[test]
    fn signs_fold_into_sums() {
        let expr = simplify(&(Expr::sym("x") - Expr::sym("y")));
        assert_eq!(latex(&expr), "x - y");
    }

    #[test]
    fn rational_coefficients() {
        let expr = simplify(&(Expr::rational(-1, 2) * Expr::sym("r")));
        assert_eq!(latex(&expr), "-\\frac{r}{2}");
    }

    #[test]
    fn vectors_and_matrices() {
        let v = vec![Expr::int(0), Expr::sym("r")];
        assert_eq!(latex_vector(&v), "\\left[0, \\; r\\right]");
        let m = DMatrix::from_row_slice(2, 2, &[
            Expr::int(1),
            Expr::int(0),
            Expr::int(0),
            Expr::sym("r").pow(Expr::int(2)),
        ]);
        assert_eq!(
            latex_matrix(&m),
            "\\left[\\begin{matrix}1 & 0 \\\\ 0 & r^{2}\\end{matrix}\\right]"
        );
    }
}
