use crate::error::{Result, TensorError};
use crate::symbolic::Expr;

/// An ordered coordinate system: N distinct symbols, fixed for the lifetime
/// of everything derived from it. Passed explicitly to each tensor object so
/// no field reaches into a shared object graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coordinates {
    names: Vec<String>,
}

impl Coordinates {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(TensorError::DimensionMismatch {
                expected: 1,
                found: 0,
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(TensorError::DuplicateCoordinate(name.clone()));
            }
        }
        Ok(Coordinates { names })
    }

    /// Builds a coordinate system from a comma-separated list, e.g.
    /// `"t, r, theta, phi"`.
    pub fn parse(list: &str) -> Result<Self> {
        Coordinates::new(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        )
    }

    pub fn dim(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Result<&str> {
        self.check_index(index)?;
        Ok(&self.names[index])
    }

    pub fn symbol(&self, index: usize) -> Result<Expr> {
        Ok(Expr::sym(self.name(index)?))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.dim() {
            return Err(TensorError::IndexOutOfRange {
                index,
                dim: self.dim(),
            });
        }
        Ok(())
    }

    /// Fails fast when a supplied component array is not length N.
    pub fn check_len(&self, found: usize) -> Result<()> {
        if found != self.dim() {
            return Err(TensorError::DimensionMismatch {
                expected: self.dim(),
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_spherical_coordinates() {
        let coords = Coordinates::parse("t, r, theta, phi").unwrap();
        assert_eq!(coords.dim(), 4);
        assert_eq!(coords.name(2).unwrap(), "theta");
        assert_eq!(coords.index_of("phi"), Some(3));
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert!(matches!(
            Coordinates::parse("t, x, t"),
            Err(TensorError::DuplicateCoordinate(name)) if name == "t"
        ));
        assert!(matches!(
            Coordinates::parse(""),
            Err(TensorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn index_bounds_fail_fast() {
        let coords = Coordinates::parse("x, y, z").unwrap();
        assert!(matches!(
            coords.name(3),
            Err(TensorError::IndexOutOfRange { index: 3, dim: 3 })
        ));
    }
}
