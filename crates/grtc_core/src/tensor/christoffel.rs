use num_traits::Zero;

use crate::error::Result;
use crate::symbolic::simplify::DEFAULT_NODE_BUDGET;
use crate::symbolic::{diff, simplify_guarded, Expr};
use crate::tensor::metric::MetricTensor;

/// The Levi-Civita connection coefficients
/// Γ^a_{bc} = ½ g^{ad} (∂_b g_{dc} + ∂_c g_{db} − ∂_d g_{bc}),
/// computed once per metric and immutable afterwards.
///
/// Stored flat as `symbols[(a*dim + b)*dim + c]`. The lower-index symmetry
/// Γ^a_{bc} = Γ^a_{cb} is used to halve the computation; the full array is
/// still exposed.
#[derive(Clone, Debug, PartialEq)]
pub struct ChristoffelSymbol {
    dim: usize,
    symbols: Vec<Expr>,
}

impl ChristoffelSymbol {
    pub fn new(metric: &MetricTensor) -> Result<Self> {
        let dim = metric.dim();
        let coords = metric.coordinates();
        let inverse = metric.inverse()?;

        let mut symbols = vec![Expr::int(0); dim * dim * dim];
        for a in 0..dim {
            for b in 0..dim {
                for c in b..dim {
                    let mut terms = Vec::with_capacity(dim);
                    for d in 0..dim {
                        if inverse[(a, d)].is_zero() {
                            continue;
                        }
                        let term = Expr::rational(1, 2)
                            * inverse[(a, d)].clone()
                            * (diff(metric.component(d, c), coords.name(b)?)
                                + diff(metric.component(d, b), coords.name(c)?)
                                - diff(metric.component(b, c), coords.name(d)?));
                        terms.push(term);
                    }
                    let gamma = simplify_guarded(&Expr::Add(terms), DEFAULT_NODE_BUDGET)?;
                    symbols[(a * dim + b) * dim + c] = gamma.clone();
                    symbols[(a * dim + c) * dim + b] = gamma;
                }
            }
        }
        Ok(ChristoffelSymbol { dim, symbols })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Γ^a_{bc}. Indices are valid by construction for the callers in this
    /// crate; out-of-range access panics like any slice index.
    pub fn get(&self, a: usize, b: usize, c: usize) -> &Expr {
        &self.symbols[(a * self.dim + b) * self.dim + c]
    }

    /// The full flat rank-3 array, `[(a*dim + b)*dim + c]` layout.
    pub fn components(&self) -> &[Expr] {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::simplify;
    use crate::tensor::coords::Coordinates;

    fn spherical() -> MetricTensor {
        let coords = Coordinates::parse("r, theta, phi").unwrap();
        let r = Expr::sym("r");
        let theta = Expr::sym("theta");
        MetricTensor::diagonal(
            coords,
            vec![
                Expr::int(1),
                r.clone().pow(Expr::int(2)),
                r.clone().pow(Expr::int(2)) * theta.sin().pow(Expr::int(2)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn spherical_christoffel_golden_values() {
        let gamma = ChristoffelSymbol::new(&spherical()).unwrap();
        let r = Expr::sym("r");
        let theta = Expr::sym("theta");

        // Γ^r_{θθ} = -r
        assert_eq!(*gamma.get(0, 1, 1), simplify(&-r.clone()));
        // Γ^r_{φφ} = -r sin²θ
        assert_eq!(
            *gamma.get(0, 2, 2),
            simplify(&-(r.clone() * theta.clone().sin().pow(Expr::int(2))))
        );
        // Γ^θ_{rθ} = 1/r
        assert_eq!(*gamma.get(1, 0, 1), simplify(&(Expr::int(1) / r.clone())));
        // Γ^θ_{φφ} = -sinθ cosθ
        assert_eq!(
            *gamma.get(1, 2, 2),
            simplify(&-(theta.clone().sin() * theta.clone().cos()))
        );
        // Γ^φ_{θφ} = cosθ/sinθ
        assert_eq!(
            *gamma.get(2, 1, 2),
            simplify(&(theta.clone().cos() / theta.clone().sin()))
        );
        // Symmetry in the lower pair.
        assert_eq!(gamma.get(2, 1, 2), gamma.get(2, 2, 1));
    }

    #[test]
    fn flat_cartesian_metric_has_no_connection() {
        let coords = Coordinates::parse("x, y, z").unwrap();
        let g = MetricTensor::diagonal(
            coords,
            vec![Expr::int(1), Expr::int(1), Expr::int(1)],
        )
        .unwrap();
        let gamma = ChristoffelSymbol::new(&g).unwrap();
        assert!(gamma.components().iter().all(|c| c.is_zero()));
    }
}
