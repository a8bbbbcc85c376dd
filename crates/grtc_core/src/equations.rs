//! Equation production: the seam between the tensor engine and the external
//! presentation layer. Each function parses raw component strings, runs one
//! computation, and wraps the already-canonical result in a display template.
//! Nothing here re-simplifies or mutates a field.

use anyhow::{anyhow, Context, Result};
use nalgebra::DMatrix;

use crate::symbolic::{latex, latex_matrix, latex_symbol, latex_vector, parse, Expr};
use crate::tensor::{Coordinates, MetricTensor, ScalarField, TensorField, Variance, VectorField};

/// Parses a length-N list of raw component strings.
fn parse_components(coords: &Coordinates, raw: &[&str]) -> Result<Vec<Expr>> {
    coords.check_len(raw.len())?;
    raw.iter()
        .enumerate()
        .map(|(i, src)| parse(src).with_context(|| format!("component {i}: `{src}`")))
        .collect()
}

/// Parses an N×N grid of raw metric entries into a metric tensor.
fn parse_metric(coords: &Coordinates, rows: &[&[&str]]) -> Result<MetricTensor> {
    coords.check_len(rows.len())?;
    let mut parsed = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        coords.check_len(row.len())?;
        let mut out = Vec::with_capacity(row.len());
        for (j, src) in row.iter().enumerate() {
            out.push(parse(src).with_context(|| format!("metric entry ({i},{j}): `{src}`"))?);
        }
        parsed.push(out);
    }
    Ok(MetricTensor::from_rows(coords.clone(), parsed)?)
}

/// Parses an N×N grid of raw tensor components.
fn parse_matrix(coords: &Coordinates, rows: &[&[&str]]) -> Result<DMatrix<Expr>> {
    coords.check_len(rows.len())?;
    let dim = coords.dim();
    let mut flat = Vec::with_capacity(dim * dim);
    for (i, row) in rows.iter().enumerate() {
        coords.check_len(row.len())?;
        for (j, src) in row.iter().enumerate() {
            flat.push(parse(src).with_context(|| format!("entry ({i},{j}): `{src}`"))?);
        }
    }
    Ok(DMatrix::from_row_iterator(dim, dim, flat))
}

fn coordinate_index(coords: &Coordinates, index_symbol: &str) -> Result<usize> {
    coords
        .index_of(index_symbol)
        .ok_or_else(|| anyhow!("`{index_symbol}` is not a coordinate of this system"))
}

/// The free-index letters used in the display templates: greek for 4D
/// systems, latin for lower dimensions.
fn index_letters(dim: usize) -> (&'static str, &'static str) {
    if dim == 4 {
        ("\\alpha", "\\beta")
    } else {
        ("a", "b")
    }
}

fn vector_label(variance: Variance, letter: &str) -> String {
    match variance {
        Variance::Upper => format!("V^{{{letter}}}"),
        Variance::Lower => format!("V_{{{letter}}}"),
    }
}

fn tensor_label(variance: (Variance, Variance), first: &str, second: &str) -> String {
    match variance {
        (Variance::Upper, Variance::Upper) => format!("T^{{{first}{second}}}"),
        (Variance::Upper, Variance::Lower) => format!("T^{{{first}}}{{}}_{{{second}}}"),
        (Variance::Lower, Variance::Upper) => format!("T_{{{first}}}{{}}^{{{second}}}"),
        (Variance::Lower, Variance::Lower) => format!("T_{{{first}{second}}}"),
    }
}

/// `$$\nabla_{i}\phi = …$$` for a scalar field.
pub fn scalar_covariant_equation(
    coords: &Coordinates,
    field: &str,
    index_symbol: &str,
) -> Result<String> {
    let index = coordinate_index(coords, index_symbol)?;
    let scalar = ScalarField::new(coords.clone(), parse(field)?);
    let result = scalar.covariant_derivative(index)?;
    Ok(format!(
        "$$\\nabla_{{{}}}\\phi = {}$$",
        latex_symbol(index_symbol),
        latex(&result)
    ))
}

/// `$$\mathcal{L}_X\phi = …$$` for a scalar field.
pub fn scalar_lie_equation(coords: &Coordinates, field: &str, x: &[&str]) -> Result<String> {
    let scalar = ScalarField::new(coords.clone(), parse(field)?);
    let x = parse_components(coords, x)?;
    let result = scalar.lie_derivative(&x)?;
    Ok(format!("$$\\mathcal{{L}}_X\\phi = {}$$", latex(&result)))
}

/// `$$\nabla_{i}V^{\alpha} = …$$` (or `V_{\alpha}`) for a vector field.
pub fn vector_covariant_equation(
    coords: &Coordinates,
    metric_rows: &[&[&str]],
    components: &[&str],
    variance: Variance,
    index_symbol: &str,
) -> Result<String> {
    let index = coordinate_index(coords, index_symbol)?;
    let metric = parse_metric(coords, metric_rows)?;
    let field = VectorField::new(metric, parse_components(coords, components)?, variance)?;
    let result = field.covariant_derivative(index)?;
    let (letter, _) = index_letters(coords.dim());
    Ok(format!(
        "$$\\nabla_{{{}}}{} = {}$$",
        latex_symbol(index_symbol),
        vector_label(variance, letter),
        latex_vector(&result)
    ))
}

/// `$$\mathcal{L}_XV^{\alpha} = …$$` (or `V_{\alpha}`) for a vector field.
pub fn vector_lie_equation(
    coords: &Coordinates,
    metric_rows: &[&[&str]],
    components: &[&str],
    variance: Variance,
    x: &[&str],
) -> Result<String> {
    let metric = parse_metric(coords, metric_rows)?;
    let field = VectorField::new(metric, parse_components(coords, components)?, variance)?;
    let x = parse_components(coords, x)?;
    let result = field.lie_derivative(&x)?;
    let (letter, _) = index_letters(coords.dim());
    Ok(format!(
        "$$\\mathcal{{L}}_X{} = {}$$",
        vector_label(variance, letter),
        latex_vector(&result)
    ))
}

/// The Killing-field verdict for a vector field. A lower-index candidate is
/// raised with the inverse metric before testing, since the Lie derivative of
/// the metric is taken along a contravariant generator.
pub fn killing_field_equation(
    coords: &Coordinates,
    metric_rows: &[&[&str]],
    components: &[&str],
    variance: Variance,
) -> Result<String> {
    let metric = parse_metric(coords, metric_rows)?;
    let parsed = parse_components(coords, components)?;
    let mut field = VectorField::new(metric, parsed.clone(), variance)?;
    let candidate = match variance {
        Variance::Upper => parsed.clone(),
        Variance::Lower => field.change_variance(&parsed, Variance::Upper)?,
    };
    let is_killing = field.is_killing_field(&candidate)?;
    let (letter, _) = index_letters(coords.dim());
    let label = vector_label(variance, letter);
    let verdict = if is_killing {
        "is a killing field"
    } else {
        "is not a killing field"
    };
    Ok(format!(
        "$${label}={}~\\text{{{verdict}}}$$",
        latex_vector(&parsed)
    ))
}

/// `$$\nabla_{i}T^{\alpha\beta} = …$$` (per signature) for a rank-2 field.
pub fn tensor_covariant_equation(
    coords: &Coordinates,
    metric_rows: &[&[&str]],
    components: &[&[&str]],
    variance: (Variance, Variance),
    index_symbol: &str,
) -> Result<String> {
    let index = coordinate_index(coords, index_symbol)?;
    let metric = parse_metric(coords, metric_rows)?;
    let field = TensorField::new(metric, parse_matrix(coords, components)?, variance)?;
    let result = field.covariant_derivative(index)?;
    let (first, second) = index_letters(coords.dim());
    Ok(format!(
        "$$\\nabla_{{{}}}{} = {}$$",
        latex_symbol(index_symbol),
        tensor_label(variance, first, second),
        latex_matrix(&result)
    ))
}

/// `$$\mathcal{L}_XT^{\alpha\beta} = …$$` (per signature) for a rank-2 field.
pub fn tensor_lie_equation(
    coords: &Coordinates,
    metric_rows: &[&[&str]],
    components: &[&[&str]],
    variance: (Variance, Variance),
    x: &[&str],
) -> Result<String> {
    let metric = parse_metric(coords, metric_rows)?;
    let field = TensorField::new(metric, parse_matrix(coords, components)?, variance)?;
    let x = parse_components(coords, x)?;
    let result = field.lie_derivative(&x)?;
    let (first, second) = index_letters(coords.dim());
    Ok(format!(
        "$$\\mathcal{{L}}_X{} = {}$$",
        tensor_label(variance, first, second),
        latex_matrix(&result)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TensorError;

    fn spherical3() -> (Coordinates, Vec<Vec<&'static str>>) {
        let coords = Coordinates::parse("r, theta, phi").unwrap();
        let rows = vec![
            vec!["1", "0", "0"],
            vec!["0", "r**2", "0"],
            vec!["0", "0", "r**2*sin(theta)**2"],
        ];
        (coords, rows)
    }

    fn as_slices<'a>(rows: &'a [Vec<&'a str>]) -> Vec<&'a [&'a str]> {
        rows.iter().map(Vec::as_slice).collect()
    }

    #[test]
    fn scalar_equation_uses_the_index_symbol() {
        let coords = Coordinates::parse("t, x, y, z").unwrap();
        let eqn = scalar_covariant_equation(&coords, "x**2 + t*y", "x").unwrap();
        assert_eq!(eqn, "$$\\nabla_{x}\\phi = 2 x$$");
    }

    #[test]
    fn vector_equation_picks_greek_indices_in_4d() {
        let coords = Coordinates::parse("t, x, y, z").unwrap();
        let flat = vec![
            vec!["-1", "0", "0", "0"],
            vec!["0", "1", "0", "0"],
            vec!["0", "0", "1", "0"],
            vec!["0", "0", "0", "1"],
        ];
        let eqn = vector_covariant_equation(
            &coords,
            &as_slices(&flat),
            &["t", "0", "0", "0"],
            Variance::Upper,
            "t",
        )
        .unwrap();
        assert_eq!(
            eqn,
            "$$\\nabla_{t}V^{\\alpha} = \\left[1, \\; 0, \\; 0, \\; 0\\right]$$"
        );
    }

    #[test]
    fn killing_verdict_for_azimuthal_symmetry() {
        let (coords, rows) = spherical3();
        let eqn = killing_field_equation(
            &coords,
            &as_slices(&rows),
            &["0", "0", "1"],
            Variance::Upper,
        )
        .unwrap();
        assert!(eqn.ends_with("~\\text{is a killing field}$$"), "{eqn}");

        let eqn = killing_field_equation(
            &coords,
            &as_slices(&rows),
            &["1", "0", "0"],
            Variance::Upper,
        )
        .unwrap();
        assert!(eqn.ends_with("~\\text{is not a killing field}$$"), "{eqn}");
    }

    #[test]
    fn parse_failures_keep_their_kind() {
        let (coords, rows) = spherical3();
        let err = vector_covariant_equation(
            &coords,
            &as_slices(&rows),
            &["0", "0", "oops("],
            Variance::Upper,
            "r",
        )
        .unwrap_err();
        assert!(err.chain().any(|cause| {
            cause
                .downcast_ref::<TensorError>()
                .map_or(false, |e| matches!(e, TensorError::Parse(_)))
        }));
    }

    #[test]
    fn unknown_index_symbol_is_rejected() {
        let (coords, rows) = spherical3();
        let err = vector_covariant_equation(
            &coords,
            &as_slices(&rows),
            &["0", "0", "1"],
            Variance::Upper,
            "w",
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a coordinate"));
    }
}
