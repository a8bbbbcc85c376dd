//! Scalar, vector, and rank-2 tensor fields over a coordinate system.
//!
//! The covariant- and Lie-derivative formulas share one structure across
//! ranks: a partial-derivative term plus one signed correction per index,
//! the sign chosen by that index's variance. The generic routines here are
//! written once over flat component storage and variance slots; the per-rank
//! field types wrap them.

pub mod scalar;
pub mod tensor;
pub mod vector;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TensorError};
use crate::symbolic::simplify::DEFAULT_NODE_BUDGET;
use crate::symbolic::{diff, simplify_guarded, Expr};
use crate::tensor::christoffel::ChristoffelSymbol;
use crate::tensor::coords::Coordinates;

pub use scalar::ScalarField;
pub use tensor::TensorField;
pub use vector::VectorField;

/// Whether an index is contravariant (upper) or covariant (lower). An
/// explicit two-state tag so variance transitions are visible and testable;
/// textual input uses the `'u'`/`'d'` shorthand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variance {
    Upper,
    Lower,
}

impl Variance {
    /// Parses the textual `'u'`/`'d'` tags.
    pub fn from_tag(tag: char) -> Result<Variance> {
        match tag {
            'u' => Ok(Variance::Upper),
            'd' => Ok(Variance::Lower),
            other => Err(TensorError::Parse(format!(
                "unknown variance tag `{other}`; expected `u` or `d`"
            ))),
        }
    }

    pub fn tag(self) -> char {
        match self {
            Variance::Upper => 'u',
            Variance::Lower => 'd',
        }
    }
}

/// Decodes flat offset -> per-slot indices for a `dim^rank` array.
fn decode(mut flat: usize, rank: usize, dim: usize) -> Vec<usize> {
    let mut idx = vec![0; rank];
    for slot in (0..rank).rev() {
        idx[slot] = flat % dim;
        flat /= dim;
    }
    idx
}

fn encode(idx: &[usize], dim: usize) -> usize {
    idx.iter().fold(0, |acc, &i| acc * dim + i)
}

/// ∇_index applied to a rank-`slots.len()` component array:
/// out[A] = ∂_index T[A]
///        + Σ_b Γ^{A_p}_{index,b} T[A: p→b]   for each upper slot p
///        − Σ_b Γ^{b}_{index,A_p} T[A: p→b]   for each lower slot p.
pub(crate) fn covariant_derivative_generic(
    coords: &Coordinates,
    christoffel: &ChristoffelSymbol,
    components: &[Expr],
    slots: &[Variance],
    index: usize,
) -> Result<Vec<Expr>> {
    coords.check_index(index)?;
    let dim = coords.dim();
    let rank = slots.len();
    debug_assert_eq!(components.len(), dim.pow(rank as u32));

    let mut out = Vec::with_capacity(components.len());
    for flat in 0..components.len() {
        let idx = decode(flat, rank, dim);
        let mut terms = vec![diff(&components[flat], coords.name(index)?)];
        for (p, variance) in slots.iter().enumerate() {
            for b in 0..dim {
                let mut swapped = idx.clone();
                swapped[p] = b;
                let component = components[encode(&swapped, dim)].clone();
                let correction = match variance {
                    Variance::Upper => {
                        christoffel.get(idx[p], index, b).clone() * component
                    }
                    Variance::Lower => {
                        -(christoffel.get(b, index, idx[p]).clone() * component)
                    }
                };
                terms.push(correction);
            }
        }
        out.push(simplify_guarded(&Expr::Add(terms), DEFAULT_NODE_BUDGET)?);
    }
    Ok(out)
}

/// L_X applied to a rank-`slots.len()` component array:
/// out[A] = Σ_c X^c ∂_c T[A]
///        − Σ_c T[A: p→c] ∂_c X^{A_p}   for each upper slot p
///        + Σ_c T[A: p→c] ∂_{A_p} X^c   for each lower slot p.
/// `X` is contravariant.
pub(crate) fn lie_derivative_generic(
    coords: &Coordinates,
    components: &[Expr],
    slots: &[Variance],
    x: &[Expr],
) -> Result<Vec<Expr>> {
    coords.check_len(x.len())?;
    let dim = coords.dim();
    let rank = slots.len();
    debug_assert_eq!(components.len(), dim.pow(rank as u32));

    let mut out = Vec::with_capacity(components.len());
    for flat in 0..components.len() {
        let idx = decode(flat, rank, dim);
        let mut terms = Vec::new();
        for c in 0..dim {
            terms.push(x[c].clone() * diff(&components[flat], coords.name(c)?));
        }
        for (p, variance) in slots.iter().enumerate() {
            for c in 0..dim {
                let mut swapped = idx.clone();
                swapped[p] = c;
                let component = components[encode(&swapped, dim)].clone();
                let correction = match variance {
                    Variance::Upper => -(component * diff(&x[idx[p]], coords.name(c)?)),
                    Variance::Lower => component * diff(&x[c], coords.name(idx[p])?),
                };
                terms.push(correction);
            }
        }
        out.push(simplify_guarded(&Expr::Add(terms), DEFAULT_NODE_BUDGET)?);
    }
    Ok(out)
}

/// Contracts slot `p` of a component array with `matrix` (the metric to
/// lower, the inverse metric to raise): out[A] = Σ_c M[A_p, c] T[A: p→c].
pub(crate) fn contract_slot(
    matrix: &DMatrix<Expr>,
    components: &[Expr],
    rank: usize,
    dim: usize,
    p: usize,
) -> Result<Vec<Expr>> {
    let mut out = Vec::with_capacity(components.len());
    for flat in 0..components.len() {
        let idx = decode(flat, rank, dim);
        let mut terms = Vec::with_capacity(dim);
        for c in 0..dim {
            let mut swapped = idx.clone();
            swapped[p] = c;
            terms.push(matrix[(idx[p], c)].clone() * components[encode(&swapped, dim)].clone());
        }
        out.push(simplify_guarded(&Expr::Add(terms), DEFAULT_NODE_BUDGET)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_tags_round_trip() {
        assert_eq!(Variance::from_tag('u').unwrap(), Variance::Upper);
        assert_eq!(Variance::from_tag('d').unwrap(), Variance::Lower);
        assert_eq!(Variance::Upper.tag(), 'u');
        assert!(matches!(
            Variance::from_tag('x'),
            Err(TensorError::Parse(_))
        ));
    }

    #[test]
    fn flat_index_codec_round_trips() {
        let dim = 4;
        for flat in 0..dim * dim {
            let idx = decode(flat, 2, dim);
            assert_eq!(encode(&idx, dim), flat);
        }
        assert_eq!(decode(7, 2, 4), vec![1, 3]);
    }
}
