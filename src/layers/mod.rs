pub mod linear;
pub mod relu;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Trace;
use crate::error::Result;
use crate::math::matrix::Matrix;

pub use linear::Linear;
pub use relu::Relu;

/// Identifies a trainable matrix inside its owning layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    Weights,
    Biases,
}

/// Gradient for one parameter; same shape as the parameter.
#[derive(Debug, Clone)]
pub struct ParamGrad {
    pub param: Param,
    pub grad: Matrix,
}

/// A unit of the layer stack. Every variant supports `forward` and `backward`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Linear(Linear),
    Relu(Relu),
}

impl Layer {
    pub fn linear<R: Rng>(name: &str, input_size: usize, output_size: usize, rng: &mut R) -> Layer {
        Layer::Linear(Linear::new(name, input_size, output_size, rng))
    }

    pub fn relu(name: &str) -> Layer {
        Layer::Relu(Relu::new(name))
    }

    pub fn name(&self) -> &str {
        match self {
            Layer::Linear(l) => &l.name,
            Layer::Relu(l) => &l.name,
        }
    }

    /// In training mode the input is cached for `backward`; otherwise any
    /// previous cache is dropped.
    pub fn forward(&mut self, input: &Matrix, train: bool, trace: &mut Trace<'_>) -> Result<Matrix> {
        match self {
            Layer::Linear(l) => l.forward(input, train, trace),
            Layer::Relu(l) => l.forward(input, train, trace),
        }
    }

    /// Returns the input gradient and this layer's parameter gradients.
    pub fn backward(&mut self, grad_out: &Matrix, trace: &mut Trace<'_>) -> Result<(Matrix, Vec<ParamGrad>)> {
        match self {
            Layer::Linear(l) => l.backward(grad_out, trace),
            Layer::Relu(l) => Ok((l.backward(grad_out, trace)?, Vec::new())),
        }
    }

    /// `None` for layers without that parameter.
    pub fn param_mut(&mut self, param: Param) -> Option<&mut Matrix> {
        match self {
            Layer::Linear(l) => Some(l.param_mut(param)),
            Layer::Relu(_) => None,
        }
    }
}
