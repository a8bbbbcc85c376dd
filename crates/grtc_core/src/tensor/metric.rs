use nalgebra::DMatrix;
use num_traits::Zero;

use crate::error::{Result, TensorError};
use crate::symbolic::simplify::DEFAULT_NODE_BUDGET;
use crate::symbolic::{simplify_guarded, Expr};
use crate::tensor::coords::Coordinates;

/// The user-supplied metric g_{ab} over a coordinate system. Immutable after
/// construction; the inverse is derived on demand.
///
/// The components are taken as given (the caller promises symmetry); only
/// the shape is validated here.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricTensor {
    coords: Coordinates,
    components: DMatrix<Expr>,
}

impl MetricTensor {
    pub fn new(coords: Coordinates, components: DMatrix<Expr>) -> Result<Self> {
        let dim = coords.dim();
        if components.nrows() != dim || components.ncols() != dim {
            return Err(TensorError::DimensionMismatch {
                expected: dim,
                found: components.nrows().max(components.ncols()),
            });
        }
        Ok(MetricTensor { coords, components })
    }

    pub fn from_rows(coords: Coordinates, rows: Vec<Vec<Expr>>) -> Result<Self> {
        let dim = coords.dim();
        coords.check_len(rows.len())?;
        for row in &rows {
            coords.check_len(row.len())?;
        }
        let flat: Vec<Expr> = rows.into_iter().flatten().collect();
        MetricTensor::new(coords, DMatrix::from_row_iterator(dim, dim, flat))
    }

    /// A diagonal metric from its N diagonal entries.
    pub fn diagonal(coords: Coordinates, entries: Vec<Expr>) -> Result<Self> {
        coords.check_len(entries.len())?;
        let dim = coords.dim();
        let components = DMatrix::from_fn(dim, dim, |i, j| {
            if i == j {
                entries[i].clone()
            } else {
                Expr::int(0)
            }
        });
        MetricTensor::new(coords, components)
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coords
    }

    pub fn dim(&self) -> usize {
        self.coords.dim()
    }

    /// Raw stored component, no simplification. Internal consumers that
    /// simplify their own results use this to avoid paying the policy twice.
    pub(crate) fn component(&self, i: usize, j: usize) -> &Expr {
        &self.components[(i, j)]
    }

    /// The simplified metric matrix.
    pub fn components(&self) -> Result<DMatrix<Expr>> {
        let dim = self.dim();
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

    /// det(g) by Laplace expansion, simplified.
    pub fn determinant(&self) -> Result<Expr> {
        simplify_guarded(&laplace_det(&self.components), DEFAULT_NODE_BUDGET)
    }

    /// The inverse metric g^{ab} = adj(g)^T_{ab} / det(g). Fails with
    /// [`TensorError::SingularMetric`] when the determinant simplifies to
    /// zero.
    pub fn inverse(&self) -> Result<DMatrix<Expr>> {
        let det = self.determinant()?;
        if det.is_zero() {
            return Err(TensorError::SingularMetric);
        }
        let dim = self.dim();
        let mut out = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                // Transposed cofactor: entry (i, j) of the inverse comes from
                // the (j, i) minor.
                let sign = if (i + j) % 2 == 0 { 1 } else { -1 };
                let cofactor = Expr::int(sign) * laplace_det(&minor(&self.components, j, i));
                out.push(simplify_guarded(
                    &(cofactor / det.clone()),
                    DEFAULT_NODE_BUDGET,
                )?);
            }
        }
        Ok(DMatrix::from_row_iterator(dim, dim, out))
    }
}

/// Determinant of a symbolic matrix by expansion along the first row.
/// Exponential in N, which is fine at the N = 3..4 this engine serves.
fn laplace_det(matrix: &DMatrix<Expr>) -> Expr {
    let n = matrix.nrows();
    if n == 1 {
        return matrix[(0, 0)].clone();
    }
    let mut terms = Vec::with_capacity(n);
    for j in 0..n {
        if matrix[(0, j)].is_zero() {
            continue;
        }
        let sign = if j % 2 == 0 { 1 } else { -1 };
        terms.push(Expr::int(sign) * matrix[(0, j)].clone() * laplace_det(&minor(matrix, 0, j)));
    }
    match terms.len() {
        0 => Expr::int(0),
        _ => Expr::Add(terms),
    }
}

fn minor(matrix: &DMatrix<Expr>, row: usize, col: usize) -> DMatrix<Expr> {
    let n = matrix.nrows();
    DMatrix::from_fn(n - 1, n - 1, |i, j| {
        let i = if i < row { i } else { i + 1 };
        let j = if j < col { j } else { j + 1 };
        matrix[(i, j)].clone()
    })
}
