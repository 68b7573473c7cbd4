use ndarray::Array2;
use rand::Rng;
use std::f64::consts::PI;

use crate::error::{NnError, Result};

/// Dense row-major matrix used for every parameter, activation and gradient.
pub type Matrix = Array2<f64>;

/// Fails with `ShapeMismatch` unless `m` has exactly `expected` shape.
pub fn ensure_shape(m: &Matrix, expected: (usize, usize), context: &str) -> Result<()> {
    let found = m.dim();
    if found != expected {
        return Err(NnError::ShapeMismatch {
            context: context.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
pub fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // Both samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// He initialization: `N(0, 1) * sqrt(2 / fan_in)`.
///
/// Keeps the activation variance of a ReLU stack roughly constant at
/// initialization. Values are drawn row by row, so the same generator state
/// always yields the same matrix.
pub fn he<R: Rng>(rows: usize, cols: usize, fan_in: usize, rng: &mut R) -> Matrix {
    let std_dev = (2.0 / fan_in as f64).sqrt();
    Array2::from_shape_simple_fn((rows, cols), || sample_standard_normal(rng) * std_dev)
}

/// Builds a matrix from nested rows. All rows must have the same length.
pub fn from_rows(rows: &[Vec<f64>]) -> Result<Matrix> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, |r| r.len());
    let mut data = Vec::with_capacity(n_rows * n_cols);
    for row in rows {
        if row.len() != n_cols {
            return Err(NnError::ShapeMismatch {
                context: "from_rows".to_string(),
                expected: (1, n_cols),
                found: (1, row.len()),
            });
        }
        data.extend_from_slice(row);
    }
    Array2::from_shape_vec((n_rows, n_cols), data).map_err(|e| NnError::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn he_is_reproducible_for_a_seed() {
        let a = he(3, 4, 3, &mut ChaCha8Rng::seed_from_u64(7));
        let b = he(3, 4, 3, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!(a.dim(), (3, 4));
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { .. }));
    }

    #[test]
    fn ensure_shape_reports_both_shapes() {
        let m = Matrix::zeros((2, 3));
        assert!(ensure_shape(&m, (2, 3), "ok").is_ok());
        match ensure_shape(&m, (3, 2), "check") {
            Err(NnError::ShapeMismatch { expected, found, .. }) => {
                assert_eq!(expected, (3, 2));
                assert_eq!(found, (2, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
