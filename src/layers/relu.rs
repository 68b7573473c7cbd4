use serde::{Deserialize, Serialize};

use crate::diagnostics::Trace;
use crate::error::{NnError, Result};
use crate::math::matrix::{self, Matrix};

/// Elementwise `max(x, 0)`. No parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relu {
    pub name: String,
    #[serde(skip)]
    cache_in: Option<Matrix>,
}

impl Relu {
    pub fn new(name: &str) -> Relu {
        Relu { name: name.to_string(), cache_in: None }
    }

    pub fn forward(&mut self, input: &Matrix, train: bool, _trace: &mut Trace<'_>) -> Result<Matrix> {
        self.cache_in = if train { Some(input.clone()) } else { None };
        // NaN stays NaN, like `numpy.maximum`.
        Ok(input.mapv(|x| if x < 0.0 { 0.0 } else { x }))
    }

    /// The gradient passes wherever the cached input was `>= 0`, so the
    /// sub-gradient at exactly zero is 1. A NaN input passes nothing.
    pub fn backward(&mut self, grad_out: &Matrix, _trace: &mut Trace<'_>) -> Result<Matrix> {
        let cache_in = self
            .cache_in
            .as_ref()
            .ok_or_else(|| NnError::StaleGradientState { layer: self.name.clone() })?;
        matrix::ensure_shape(grad_out, cache_in.dim(), &format!("{} backward", self.name))?;

        let mut grad_in = grad_out.clone();
        grad_in.zip_mut_with(cache_in, |g, &x| {
            if x.is_nan() || x < 0.0 {
                *g = 0.0;
            }
        });
        Ok(grad_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn forward_clamps_negatives() {
        let mut relu = Relu::new("R");
        let out = relu.forward(&array![[-1.0, 0.0, 2.5]], false, &mut Trace::off()).unwrap();
        assert_eq!(out, array![[0.0, 0.0, 2.5]]);
    }

    #[test]
    fn backward_passes_gradient_at_zero() {
        let mut relu = Relu::new("R");
        relu.forward(&array![[-1.0, 0.0, 2.5]], true, &mut Trace::off()).unwrap();
        let grad = relu.backward(&array![[3.0, 4.0, 5.0]], &mut Trace::off()).unwrap();
        assert_eq!(grad, array![[0.0, 4.0, 5.0]]);
    }

    #[test]
    fn nan_input_stays_nan_and_blocks_gradient() {
        let mut relu = Relu::new("R");
        let out = relu.forward(&array![[f64::NAN, -0.0, 1.0]], true, &mut Trace::off()).unwrap();
        assert!(out[[0, 0]].is_nan());
        assert_eq!(out[[0, 1]], 0.0);
        assert_eq!(out[[0, 2]], 1.0);

        let grad = relu.backward(&array![[1.0, 1.0, 1.0]], &mut Trace::off()).unwrap();
        assert_eq!(grad, array![[0.0, 1.0, 1.0]]);
    }

    #[test]
    fn backward_without_forward_is_stale() {
        let mut relu = Relu::new("R");
        let err = relu.backward(&array![[1.0]], &mut Trace::off()).unwrap_err();
        assert!(matches!(err, NnError::StaleGradientState { .. }));
    }
}
