use thiserror::Error;

/// The initial simplex: `N + 1` finite vertices in `N` dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplex<const N: usize> {
    vertices: Vec<[f64; N]>,
}

/// Errors that can occur when constructing a [`Simplex`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SimplexError {
    #[error("a simplex needs at least one dimension")]
    Dimension,

    #[error("expected {expected} vertices, found {found}")]
    VertexCount { expected: usize, found: usize },

    #[error("vertex coordinates must be finite")]
    NonFinite,
}

impl<const N: usize> Simplex<N> {
    /// Creates a simplex from explicit vertices.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly `N + 1` finite vertices are given.
    pub fn from_vertices(vertices: Vec<[f64; N]>) -> Result<Self, SimplexError> {
        if N == 0 {
            return Err(SimplexError::Dimension);
        }
        if vertices.len() != N + 1 {
            return Err(SimplexError::VertexCount {
                expected: N + 1,
                found: vertices.len(),
            });
        }
        if vertices.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SimplexError::NonFinite);
        }

        Ok(Self { vertices })
    }

    /// Creates a simplex of `center + offset` for each offset.
    ///
    /// For an IQ search, offsets of `[[-0.02, 0.02], [0.02, 0.02], [0.0, -0.02]]`
    /// give a small triangle around the current estimate.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly `N + 1` offsets are given and every
    /// resulting coordinate is finite.
    pub fn from_offsets(center: [f64; N], offsets: &[[f64; N]]) -> Result<Self, SimplexError> {
        let vertices = offsets
            .iter()
            .map(|offset| std::array::from_fn(|k| center[k] + offset[k]))
            .collect();
        Self::from_vertices(vertices)
    }

    /// Creates a simplex of `center` plus one vertex stepped along each axis.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is non-finite.
    pub fn axis_aligned(center: [f64; N], step: [f64; N]) -> Result<Self, SimplexError> {
        let mut vertices = Vec::with_capacity(N + 1);
        vertices.push(center);
        for axis in 0..N {
            let mut vertex = center;
            vertex[axis] += step[axis];
            vertices.push(vertex);
        }
        Self::from_vertices(vertices)
    }

    /// Returns the vertices in measurement order.
    #[must_use]
    pub fn vertices(&self) -> &[[f64; N]] {
        &self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_added_to_center() {
        let simplex = Simplex::from_offsets(
            [0.1, -0.1],
            &[[-0.02, 0.02], [0.02, 0.02], [0.0, -0.02]],
        )
        .unwrap();

        let v = simplex.vertices();
        assert_eq!(v.len(), 3);
        assert!((v[0][0] - 0.08).abs() < 1e-15 && (v[0][1] + 0.08).abs() < 1e-15);
        assert!((v[2][0] - 0.1).abs() < 1e-15 && (v[2][1] + 0.12).abs() < 1e-15);
    }

    #[test]
    fn axis_aligned_steps_each_axis_once() {
        let simplex = Simplex::axis_aligned([1.0, 2.0, 3.0], [0.5, 0.25, 0.125]).unwrap();

        assert_eq!(
            simplex.vertices(),
            [
                [1.0, 2.0, 3.0],
                [1.5, 2.0, 3.0],
                [1.0, 2.25, 3.0],
                [1.0, 2.0, 3.125]
            ]
        );
    }

    #[test]
    fn rejects_wrong_vertex_count() {
        let err = Simplex::<2>::from_vertices(vec![[0.0, 0.0], [1.0, 0.0]]);
        assert_eq!(
            err,
            Err(SimplexError::VertexCount {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn rejects_non_finite_vertices() {
        let err = Simplex::<2>::from_vertices(vec![[0.0, 0.0], [1.0, f64::NAN], [0.0, 1.0]]);
        assert_eq!(err, Err(SimplexError::NonFinite));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            Simplex::<0>::from_vertices(vec![[]]),
            Err(SimplexError::Dimension)
        );
    }
}
