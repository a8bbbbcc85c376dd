use crate::error::Result;
use crate::symbolic::simplify::DEFAULT_NODE_BUDGET;
use crate::symbolic::{diff, simplify_guarded, Expr};
use crate::tensor::coords::Coordinates;
use crate::tensor::fields::lie_derivative_generic;

/// A rank-0 field: one symbolic expression over the coordinate system. No
/// variance, no connection — its covariant derivative is the plain partial.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    coords: Coordinates,
    field: Expr,
}

impl ScalarField {
    pub fn new(coords: Coordinates, field: Expr) -> Self {
        ScalarField { coords, field }
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coords
    }

    /// The simplified field expression.
    pub fn field(&self) -> Result<Expr> {
        simplify_guarded(&self.field, DEFAULT_NODE_BUDGET)
    }

    /// ∇_index φ = ∂φ/∂x^index.
    pub fn covariant_derivative(&self, index: usize) -> Result<Expr> {
        self.coords.check_index(index)?;
        simplify_guarded(
            &diff(&self.field, self.coords.name(index)?),
            DEFAULT_NODE_BUDGET,
        )
    }

    /// L_X φ = Σ_c X^c ∂_c φ, for a contravariant `x`.
    pub fn lie_derivative(&self, x: &[Expr]) -> Result<Expr> {
        let mut out =
            lie_derivative_generic(&self.coords, std::slice::from_ref(&self.field), &[], x)?;
        Ok(out.pop().expect("rank-0 result has one component"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TensorError;
    use crate::symbolic::simplify;

    fn field() -> ScalarField {
        let coords = Coordinates::parse("t, x, y").unwrap();
        // φ = x² + t y
        let phi = Expr::sym("x").pow(Expr::int(2)) + Expr::sym("t") * Expr::sym("y");
        ScalarField::new(coords, phi)
    }

    #[test]
    fn covariant_derivative_is_the_partial_for_every_index() {
        let phi = field();
        assert_eq!(
            phi.covariant_derivative(0).unwrap(),
            simplify(&Expr::sym("y"))
        );
        assert_eq!(
            phi.covariant_derivative(1).unwrap(),
            simplify(&(Expr::int(2) * Expr::sym("x")))
        );
        assert_eq!(
            phi.covariant_derivative(2).unwrap(),
            simplify(&Expr::sym("t"))
        );
    }

    #[test]
    fn covariant_derivative_checks_the_index() {
        assert!(matches!(
            field().covariant_derivative(3),
            Err(TensorError::IndexOutOfRange { index: 3, dim: 3 })
        ));
    }

    #[test]
    fn lie_derivative_contracts_against_x() {
        let phi = field();
        // X = (1, 0, x) gives L_X φ = ∂_t φ + x ∂_y φ = y + t x
        let x = vec![Expr::int(1), Expr::int(0), Expr::sym("x")];
        assert_eq!(
            phi.lie_derivative(&x).unwrap(),
            simplify(&(Expr::sym("y") + Expr::sym("t") * Expr::sym("x")))
        );
    }

    #[test]
    fn lie_derivative_rejects_short_vectors() {
        assert!(matches!(
            field().lie_derivative(&[Expr::int(1)]),
            Err(TensorError::DimensionMismatch {
                expected: 3,
                found: 1
            })
        ));
    }
}
