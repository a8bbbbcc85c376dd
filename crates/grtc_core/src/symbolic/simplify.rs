//! The simplification policy: every tensor component the crate hands out goes
//! through [`simplify`] (or its budgeted variant) exactly once, so equality
//! checks downstream compare canonical forms.
//!
//! The normal form: n-ary sums and products are flattened and sorted under the
//! structural `Ord` of `Expr`; numeric subterms are folded exactly; like terms
//! merge by rational coefficient; powers on a shared base merge by exponent;
//! `c*sin^2(u) + c*cos^2(u)` collapses to `c`. The pass runs to a fixpoint,
//! which makes the policy idempotent.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};

use crate::error::{Result, TensorError};
use crate::symbolic::expr::{Expr, Func};

/// Node budget applied by the tensor layer; large enough for 4D curvature
/// work, small enough to fail a runaway expression instead of hanging.
pub const DEFAULT_NODE_BUDGET: usize = 250_000;

const MAX_PASSES: usize = 10;

/// Canonicalizes an expression. Idempotent and value-preserving.
pub fn simplify(expr: &Expr) -> Expr {
    let mut current = canonical(expr);
    for _ in 1..MAX_PASSES {
        let next = canonical(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// [`simplify`] with the work budget of the concurrency model: refuses inputs
/// (or outputs) whose node count exceeds `budget` rather than grinding on an
/// expression that will never render.
pub fn simplify_guarded(expr: &Expr, budget: usize) -> Result<Expr> {
    let nodes = expr.node_count();
    if nodes > budget {
        return Err(TensorError::ExpressionTooLarge { nodes });
    }
    let out = simplify(expr);
    let nodes = out.node_count();
    if nodes > budget {
        return Err(TensorError::ExpressionTooLarge { nodes });
    }
    Ok(out)
}

fn canonical(expr: &Expr) -> Expr {
    match expr {
        Expr::Num(_) | Expr::Sym(_) => expr.clone(),
        Expr::Add(terms) => canonical_add(terms),
        Expr::Mul(factors) => canonical_mul(factors),
        Expr::Pow(base, exponent) => canonical_pow(canonical(base), canonical(exponent)),
        Expr::Func(func, arg) => canonical_func(*func, canonical(arg)),
    }
}

fn canonical_add(terms: &[Expr]) -> Expr {
    let mut constant = BigRational::zero();
    let mut by_term: BTreeMap<Expr, BigRational> = BTreeMap::new();

    let mut queue: Vec<Expr> = terms.iter().map(canonical).collect();
    while let Some(term) = queue.pop() {
        match term {
            Expr::Add(inner) => queue.extend(inner),
            Expr::Num(r) => constant += r,
            other => {
                let (coeff, rest) = split_coefficient(other);
                *by_term.entry(rest).or_insert_with(BigRational::zero) += coeff;
            }
        }
    }

    collect_pythagorean(&mut by_term, &mut constant);

    let mut out: Vec<Expr> = Vec::with_capacity(by_term.len() + 1);
    if !constant.is_zero() {
        out.push(Expr::Num(constant));
    }
    for (rest, coeff) in by_term {
        if coeff.is_zero() {
            continue;
        }
        out.push(attach_coefficient(coeff, rest));
    }
    out.sort();
    match out.len() {
        0 => Expr::int(0),
        1 => out.pop().unwrap(),
        _ => Expr::Add(out),
    }
}

/// Splits a canonical term into (rational coefficient, coefficient-free rest).
fn split_coefficient(term: Expr) -> (BigRational, Expr) {
    match term {
        Expr::Mul(factors) => {
            let mut coeff = BigRational::one();
            let mut rest: Vec<Expr> = Vec::with_capacity(factors.len());
            for factor in factors {
                match factor {
                    Expr::Num(r) => coeff *= r,
                    other => rest.push(other),
                }
            }
            match rest.len() {
                0 => (coeff, Expr::int(1)),
                1 => (coeff, rest.pop().unwrap()),
                _ => (coeff, Expr::Mul(rest)),
            }
        }
        other => (BigRational::one(), other),
    }
}

fn attach_coefficient(coeff: BigRational, rest: Expr) -> Expr {
    if rest.is_one() {
        return Expr::Num(coeff);
    }
    if coeff.is_one() {
        return rest;
    }
    match rest {
        Expr::Mul(mut factors) => {
            factors.insert(0, Expr::Num(coeff));
            Expr::Mul(factors)
        }
        other => Expr::Mul(vec![Expr::Num(coeff), other]),
    }
}

/// Merges `c*sin^2(u)` with `c*cos^2(u)` into `c` times the shared residue.
fn collect_pythagorean(by_term: &mut BTreeMap<Expr, BigRational>, constant: &mut BigRational) {
    loop {
        let mut found: Option<(Expr, Expr, Expr)> = None;
        'scan: for key in by_term.keys() {
            for (factor, residue) in factor_decompositions(key) {
                if let Expr::Pow(base, exponent) = &factor {
                    if **exponent == Expr::int(2) {
                        if let Expr::Func(Func::Sin, arg) = base.as_ref() {
                            let partner = replace_factor(
                                key,
                                &factor,
                                Expr::Func(Func::Cos, arg.clone()).pow(Expr::int(2)),
                            );
                            if by_term.contains_key(&partner) && partner != *key {
                                found = Some((key.clone(), partner, residue));
                                break 'scan;
                            }
                        }
                    }
                }
            }
        }
        let Some((sin_key, cos_key, residue)) = found else {
            break;
        };
        let a = by_term.remove(&sin_key).unwrap_or_else(BigRational::zero);
        let b = by_term.remove(&cos_key).unwrap_or_else(BigRational::zero);
        if a == b {
            if residue.is_one() {
                *constant += a;
            } else {
                *by_term.entry(residue).or_insert_with(BigRational::zero) += a;
            }
        } else {
            // Coefficients differ: put both back untouched.
            by_term.insert(sin_key, a);
            by_term.insert(cos_key, b);
            break;
        }
    }
}

/// Every (factor, residue-without-it) view of a term.
fn factor_decompositions(term: &Expr) -> Vec<(Expr, Expr)> {
    match term {
        Expr::Mul(factors) => factors
            .iter()
            .enumerate()
            .map(|(i, factor)| {
                let mut rest: Vec<Expr> =
                    factors.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, e)| e.clone()).collect();
                let residue = match rest.len() {
                    0 => Expr::int(1),
                    1 => rest.pop().unwrap(),
                    _ => Expr::Mul(rest),
                };
                (factor.clone(), residue)
            })
            .collect(),
        other => vec![(other.clone(), Expr::int(1))],
    }
}

fn replace_factor(term: &Expr, from: &Expr, to: Expr) -> Expr {
    match term {
        Expr::Mul(factors) => {
            let mut out = factors.clone();
            if let Some(slot) = out.iter_mut().find(|e| *e == from) {
                *slot = to;
            }
            out.sort();
            Expr::Mul(out)
        }
        other if other == from => to,
        other => other.clone(),
    }
}

fn canonical_mul(factors: &[Expr]) -> Expr {
    let mut coeff = BigRational::one();
    let mut by_base: BTreeMap<Expr, Vec<Expr>> = BTreeMap::new();

    let mut queue: Vec<Expr> = factors.iter().map(canonical).collect();
    while let Some(factor) = queue.pop() {
        match factor {
            Expr::Mul(inner) => queue.extend(inner),
            Expr::Num(r) => {
                if r.is_zero() {
                    return Expr::int(0);
                }
                coeff *= r;
            }
            Expr::Pow(base, exponent) => {
                by_base.entry(*base).or_default().push(*exponent);
            }
            other => {
                by_base.entry(other).or_default().push(Expr::int(1));
            }
        }
    }

    let mut out: Vec<Expr> = Vec::with_capacity(by_base.len() + 1);
    for (base, exponents) in by_base {
        let exponent = if exponents.len() == 1 {
            exponents.into_iter().next().unwrap()
        } else {
            canonical(&Expr::Add(exponents))
        };
        let merged = canonical_pow(base, exponent);
        match merged {
            Expr::Num(r) => {
                if r.is_zero() {
                    return Expr::int(0);
                }
                coeff *= r;
            }
            other if other.is_one() => {}
            other => out.push(other),
        }
    }

    out.sort();
    if !coeff.is_one() || out.is_empty() {
        out.insert(0, Expr::Num(coeff));
    }
    match out.len() {
        1 => out.pop().unwrap(),
        _ => Expr::Mul(out),
    }
}

fn canonical_pow(base: Expr, exponent: Expr) -> Expr {
    if exponent.is_zero() {
        return Expr::int(1);
    }
    if exponent.is_one() {
        return base;
    }
    if base.is_one() {
        return Expr::int(1);
    }
    let int_exponent = exponent
        .as_number()
        .filter(|r| r.is_integer())
        .and_then(|r| r.numer().to_i32());

    if let Some(n) = int_exponent {
        if let Expr::Num(r) = &base {
            // 0^negative stays symbolic; the singular-metric check owns that case.
            if !(r.is_zero() && n < 0) {
                return Expr::Num(r.clone().pow(n));
            }
        }
        if base.is_zero() && n > 0 {
            return Expr::int(0);
        }
        // (x^a)^n = x^(a*n); valid for integer outer exponents.
        if let Expr::Pow(inner_base, inner_exponent) = base {
            let merged = canonical(&(Expr::Num(BigRational::from_integer(BigInt::from(n)))
                * (*inner_exponent)));
            return canonical_pow(*inner_base, merged);
        }
        // (x*y)^n distributes for integer n.
        if let Expr::Mul(factors) = base {
            let distributed: Vec<Expr> = factors
                .into_iter()
                .map(|f| f.pow(Expr::int(n as i64)))
                .collect();
            return canonical_mul(&distributed);
        }
    }
    if base.is_zero() {
        // Non-integer positive exponent.
        if matches!(&exponent, Expr::Num(r) if r.is_positive()) {
            return Expr::int(0);
        }
    }
    Expr::Pow(base.boxed(), exponent.boxed())
}

fn canonical_func(func: Func, arg: Expr) -> Expr {
    if arg.is_zero() {
        return match func {
            Func::Sin | Func::Tan | Func::Sinh | Func::Tanh | Func::Sqrt => Expr::int(0),
            Func::Cos | Func::Cosh | Func::Exp => Expr::int(1),
            Func::Ln => Expr::Func(func, arg.boxed()),
        };
    }
    if arg.is_one() {
        match func {
            Func::Ln => return Expr::int(0),
            Func::Sqrt => return Expr::int(1),
            _ => {}
        }
    }
    // Parity: sin(-u) = -sin(u), cos(-u) = cos(u), and likewise for the
    // hyperbolic pair, so signs never hide inside a function argument.
    if let Some(positive) = strip_negation(&arg) {
        return match func {
            Func::Sin | Func::Tan | Func::Sinh | Func::Tanh => {
                canonical_mul(&[Expr::int(-1), Expr::Func(func, positive.boxed())])
            }
            Func::Cos | Func::Cosh => Expr::Func(func, positive.boxed()),
            Func::Exp | Func::Ln | Func::Sqrt => Expr::Func(func, arg.boxed()),
        };
    }
    Expr::Func(func, arg.boxed())
}

/// For arguments with a negative rational coefficient, returns the negated
/// (positive-coefficient) form.
fn strip_negation(arg: &Expr) -> Option<Expr> {
    match arg {
        Expr::Num(r) if r.is_negative() => Some(Expr::Num(-r.clone())),
        Expr::Mul(factors) => match factors.first() {
            Some(Expr::Num(r)) if r.is_negative() => {
                let mut flipped = factors.clone();
                flipped[0] = Expr::Num(-r.clone());
                Some(canonical_mul(&flipped))
            }
            _ => None,
        },
        _ => None,
    }
}
