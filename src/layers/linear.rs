use ndarray::Axis;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Field, Trace};
use crate::error::{NnError, Result};
use crate::layers::{Param, ParamGrad};
use crate::math::matrix::{self, Matrix};

/// Fully connected layer, `Y = X·W + b`.
///
/// `weights` is `[in, out]`, `biases` is `[1, out]` and broadcasts over the
/// batch dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linear {
    pub name: String,
    pub weights: Matrix,
    pub biases: Matrix,
    #[serde(skip)]
    cache_in: Option<Matrix>,
}

impl Linear {
    /// He-initialized weights, zero biases.
    pub fn new<R: Rng>(name: &str, input_size: usize, output_size: usize, rng: &mut R) -> Linear {
        Linear {
            name: name.to_string(),
            weights: matrix::he(input_size, output_size, input_size, rng),
            biases: Matrix::zeros((1, output_size)),
            cache_in: None,
        }
    }

    /// Wraps explicit parameters; `biases` must be `[1, weights.ncols()]`.
    pub fn from_params(name: &str, weights: Matrix, biases: Matrix) -> Result<Linear> {
        matrix::ensure_shape(&biases, (1, weights.ncols()), "Linear biases")?;
        Ok(Linear { name: name.to_string(), weights, biases, cache_in: None })
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn forward(&mut self, input: &Matrix, train: bool, trace: &mut Trace<'_>) -> Result<Matrix> {
        if input.ncols() != self.input_size() {
            return Err(NnError::ShapeMismatch {
                context: format!("{} forward", self.name),
                expected: (input.nrows(), self.input_size()),
                found: input.dim(),
            });
        }

        let out = input.dot(&self.weights) + &self.biases;

        if train {
            self.cache_in = Some(input.clone());
            trace.emit(&self.name, Field::Out, &out)?;
            trace.emit_transposed(&self.name, Field::W, &self.weights)?;
            trace.emit(&self.name, Field::B, &self.biases)?;
        } else {
            self.cache_in = None;
        }

        Ok(out)
    }

    /// Returns `dX` plus the gradients for `W` and `b`, in that order.
    pub fn backward(&mut self, grad_out: &Matrix, trace: &mut Trace<'_>) -> Result<(Matrix, Vec<ParamGrad>)> {
        let cache_in = self
            .cache_in
            .as_ref()
            .ok_or_else(|| NnError::StaleGradientState { layer: self.name.clone() })?;

        matrix::ensure_shape(
            grad_out,
            (cache_in.nrows(), self.output_size()),
            &format!("{} backward", self.name),
        )?;

        let grad_biases = grad_out.sum_axis(Axis(0)).insert_axis(Axis(0));
        let grad_weights = cache_in.t().dot(grad_out);
        let grad_in = grad_out.dot(&self.weights.t());

        trace.emit(&self.name, Field::Delta, grad_out)?;
        trace.emit_transposed(&self.name, Field::GW, &grad_weights)?;
        trace.emit(&self.name, Field::GB, &grad_biases)?;

        Ok((
            grad_in,
            vec![
                ParamGrad { param: Param::Weights, grad: grad_weights },
                ParamGrad { param: Param::Biases, grad: grad_biases },
            ],
        ))
    }

    pub fn param_mut(&mut self, param: Param) -> &mut Matrix {
        match param {
            Param::Weights => &mut self.weights,
            Param::Biases => &mut self.biases,
        }
    }
}
