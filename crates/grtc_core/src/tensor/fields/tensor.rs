use nalgebra::DMatrix;

use crate::error::{Result, TensorError};
use crate::symbolic::simplify::DEFAULT_NODE_BUDGET;
use crate::symbolic::{simplify_guarded, Expr};
use crate::tensor::christoffel::ChristoffelSymbol;
use crate::tensor::coords::Coordinates;
use crate::tensor::fields::{
    contract_slot, covariant_derivative_generic, lie_derivative_generic, Variance,
};
use crate::tensor::metric::MetricTensor;

/// A rank-2 field: N×N components and a variance tag per index, covering the
/// three signatures uu, ud/du, and dd. The dd case carries the metric itself
/// through the Killing-field test; the others exist for direct tensor work.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorField {
    metric: MetricTensor,
    components: DMatrix<Expr>,
    variance: (Variance, Variance),
}

impl TensorField {
    pub fn new(
        metric: MetricTensor,
        components: DMatrix<Expr>,
        variance: (Variance, Variance),
    ) -> Result<Self> {
        let dim = metric.dim();
        if components.nrows() != dim || components.ncols() != dim {
            return Err(TensorError::DimensionMismatch {
                expected: dim,
                found: components.nrows().max(components.ncols()),
            });
        }
        Ok(TensorField {
            metric,
            components,
            variance,
        })
    }

    pub fn coordinates(&self) -> &Coordinates {
        self.metric.coordinates()
    }

    pub fn variance(&self) -> (Variance, Variance) {
        self.variance
    }

    /// The simplified component matrix.
    pub fn components(&self) -> Result<DMatrix<Expr>> {
        let dim = self.metric.dim();
        let mut out = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                out.push(simplify_guarded(
                    &self.components[(i, j)],
                    DEFAULT_NODE_BUDGET,
                )?);
            }
        }
        Ok(DMatrix::from_row_iterator(dim, dim, out))
    }

    /// ∇_index T: the partial plus one Christoffel correction per index,
    /// added for an upper index and subtracted for a lower one.
    pub fn covariant_derivative(&self, index: usize) -> Result<DMatrix<Expr>> {
        let christoffel = ChristoffelSymbol::new(&self.metric)?;
        let flat = covariant_derivative_generic(
            self.coordinates(),
            &christoffel,
            &self.flat_components(),
            &[self.variance.0, self.variance.1],
            index,
        )?;
        Ok(self.matrix_from_flat(flat))
    }

    /// L_X T for a contravariant `x`: each upper index contributes a
    /// −T·∂X term, each lower index a +T·∂X term.
    pub fn lie_derivative(&self, x: &[Expr]) -> Result<DMatrix<Expr>> {
        let flat = lie_derivative_generic(
            self.coordinates(),
            &self.flat_components(),
            &[self.variance.0, self.variance.1],
            x,
        )?;
        Ok(self.matrix_from_flat(flat))
    }

    /// Raises/lowers the stored components slot by slot with the (inverse)
    /// metric, retagging this field's variance. Slots already at the target
    /// variance are untouched.
    pub fn change_variance(&mut self, new_variance: (Variance, Variance)) -> Result<DMatrix<Expr>> {
        let dim = self.metric.dim();
        let mut flat = self.flat_components().to_vec();
        let targets = [new_variance.0, new_variance.1];
        let current = [self.variance.0, self.variance.1];
        for (slot, (&from, &to)) in current.iter().zip(targets.iter()).enumerate() {
            if from == to {
                continue;
            }
            let matrix = match to {
                Variance::Upper => self.metric.inverse()?,
                Variance::Lower => self.metric.components()?,
            };
            flat = contract_slot(&matrix, &flat, 2, dim, slot)?;
        }
        self.variance = new_variance;
        Ok(self.matrix_from_flat(flat))
    }

    /// Row-major flattening; matches the generic routines' index codec.
    fn flat_components(&self) -> Vec<Expr> {
        let dim = self.metric.dim();
        let mut flat = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                flat.push(self.components[(i, j)].clone());
            }
        }
        flat
    }

    fn matrix_from_flat(&self, flat: Vec<Expr>) -> DMatrix<Expr> {
        let dim = self.metric.dim();
        DMatrix::from_row_iterator(dim, dim, flat)
    }
}
