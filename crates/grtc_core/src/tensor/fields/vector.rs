use num_traits::Zero;

use crate::error::Result;
use crate::symbolic::simplify::DEFAULT_NODE_BUDGET;
use crate::symbolic::{simplify_guarded, Expr};
use crate::tensor::christoffel::ChristoffelSymbol;
use crate::tensor::coords::Coordinates;
use crate::tensor::fields::tensor::TensorField;
use crate::tensor::fields::{
    contract_slot, covariant_derivative_generic, lie_derivative_generic, Variance,
};
use crate::tensor::metric::MetricTensor;

/// A rank-1 field: N components plus a variance tag that selects the sign
/// and contraction pattern of the derivative formulas.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorField {
    metric: MetricTensor,
    components: Vec<Expr>,
    variance: Variance,
}

impl VectorField {
    pub fn new(metric: MetricTensor, components: Vec<Expr>, variance: Variance) -> Result<Self> {
        metric.coordinates().check_len(components.len())?;
        Ok(VectorField {
            metric,
            components,
            variance,
        })
    }

    pub fn coordinates(&self) -> &Coordinates {
        self.metric.coordinates()
    }

    pub fn variance(&self) -> Variance {
        self.variance
    }

    /// The simplified component array.
    pub fn components(&self) -> Result<Vec<Expr>> {
        self.components
            .iter()
            .map(|c| simplify_guarded(c, DEFAULT_NODE_BUDGET))
            .collect()
    }

    /// ∇_index V: component a is ∂V^a/∂x^index + Σ_b Γ^a_{index,b} V^b for an
    /// upper field, ∂V_a/∂x^index − Σ_b Γ^b_{index,a} V_b for a lower one.
    pub fn covariant_derivative(&self, index: usize) -> Result<Vec<Expr>> {
        let christoffel = ChristoffelSymbol::new(&self.metric)?;
        covariant_derivative_generic(
            self.coordinates(),
            &christoffel,
            &self.components,
            &[self.variance],
            index,
        )
    }

    /// L_X V for a contravariant `x`.
    pub fn lie_derivative(&self, x: &[Expr]) -> Result<Vec<Expr>> {
        lie_derivative_generic(self.coordinates(), &self.components, &[self.variance], x)
    }

    /// True iff the Lie derivative of the metric along the contravariant
    /// `candidate` is the zero tensor: the flow of `candidate` preserves g.
    pub fn is_killing_field(&self, candidate: &[Expr]) -> Result<bool> {
        self.coordinates().check_len(candidate.len())?;
        let g = TensorField::new(
            self.metric.clone(),
            self.metric.components()?,
            (Variance::Lower, Variance::Lower),
        )?;
        let lie = g.lie_derivative(candidate)?;
        Ok(lie.iter().all(|c| c.is_zero()))
    }

    /// Raises or lowers the given component array with the (inverse) metric,
    /// retagging this field's variance to `new_variance`. Requesting the
    /// variance the field already has is a no-op apart from simplification.
    pub fn change_variance(
        &mut self,
        components: &[Expr],
        new_variance: Variance,
    ) -> Result<Vec<Expr>> {
        self.coordinates().check_len(components.len())?;
        if new_variance == self.variance {
            return components
                .iter()
                .map(|c| simplify_guarded(c, DEFAULT_NODE_BUDGET))
                .collect();
        }
        let matrix = match new_variance {
            Variance::Upper => self.metric.inverse()?,
            Variance::Lower => self.metric.components()?,
        };
        let raised = contract_slot(&matrix, components, 1, self.coordinates().dim(), 0)?;
        self.variance = new_variance;
        Ok(raised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::simplify;

    fn spherical_metric() -> MetricTensor {
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
    fn covariant_derivative_of_radial_field() {
        // V = (r, 0, 0) upper; ∇_θ V has components (0, 1/r · r, 0) = (0, 1, 0):
        // ∂_θ V^a + Γ^a_{θb} V^b with Γ^θ_{θr} = 1/r.
        let g = spherical_metric();
        let v = VectorField::new(
            g,
            vec![Expr::sym("r"), Expr::int(0), Expr::int(0)],
            Variance::Upper,
        )
        .unwrap();
        let cd = v.covariant_derivative(1).unwrap();
        assert_eq!(cd[0], Expr::int(0));
        assert_eq!(cd[1], Expr::int(1));
        assert_eq!(cd[2], Expr::int(0));
    }

    #[test]
    fn lower_variance_flips_the_correction_sign() {
        // Same components tagged lower: ∇_θ V_a = ∂_θ V_a − Γ^b_{θa} V_b.
        // a = θ picks Γ^r_{θθ} V_r = (−r)(r), so ∇_θ V_θ = r².
        let g = spherical_metric();
        let v = VectorField::new(
            g,
            vec![Expr::sym("r"), Expr::int(0), Expr::int(0)],
            Variance::Lower,
        )
        .unwrap();
        let cd = v.covariant_derivative(1).unwrap();
        assert_eq!(cd[0], Expr::int(0));
        assert_eq!(cd[1], simplify(&Expr::sym("r").pow(Expr::int(2))));
        assert_eq!(cd[2], Expr::int(0));
    }

    #[test]
    fn change_variance_retags_and_round_trips() {
        let g = spherical_metric();
        let original = vec![Expr::int(0), Expr::int(1), Expr::int(0)];
        let mut v = VectorField::new(g, original.clone(), Variance::Upper).unwrap();

        let lowered = v.change_variance(&original, Variance::Lower).unwrap();
        assert_eq!(v.variance(), Variance::Lower);
        assert_eq!(lowered[1], simplify(&Expr::sym("r").pow(Expr::int(2))));

        let raised = v.change_variance(&lowered, Variance::Upper).unwrap();
        assert_eq!(v.variance(), Variance::Upper);
        assert_eq!(raised, original);
    }

    #[test]
    fn change_variance_to_same_tag_is_a_simplify_only_noop() {
        let g = spherical_metric();
        let comps = vec![
            Expr::sym("r") + Expr::sym("r"),
            Expr::int(0),
            Expr::int(0),
        ];
        let mut v = VectorField::new(g, comps.clone(), Variance::Upper).unwrap();
        let out = v.change_variance(&comps, Variance::Upper).unwrap();
        assert_eq!(out[0], simplify(&(Expr::int(2) * Expr::sym("r"))));
        assert_eq!(v.variance(), Variance::Upper);
    }
}
