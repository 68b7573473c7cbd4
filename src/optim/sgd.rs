use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::layers::{Layer, Param, ParamGrad};
use crate::math::matrix::{self, Matrix};

/// Minibatch SGD with optional heavy-ball momentum.
///
/// Each update computes `v = momentum * v + learning_rate * grad` and then
/// `param -= v`. With `momentum == 0` this is plain `param -= lr * grad` and
/// no velocity is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
    #[serde(default)]
    pub momentum: f64,
    /// Velocity per (layer index, parameter). Not persisted.
    #[serde(skip)]
    velocity: HashMap<(usize, Param), Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd::with_momentum(learning_rate, 0.0)
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum, velocity: HashMap::new() }
    }

    /// Drops any accumulated velocity.
    pub fn reset(&mut self) {
        self.velocity.clear();
    }

    /// Applies one in-place update to the parameter `grad` refers to in the
    /// layer at position `index` of the stack.
    pub fn step(&mut self, index: usize, layer: &mut Layer, grad: &ParamGrad) -> Result<()> {
        let name = layer.name().to_string();
        let param = layer.param_mut(grad.param).ok_or_else(|| {
            NnError::InvalidConfig(format!("layer {name} has no {:?} parameter", grad.param))
        })?;
        matrix::ensure_shape(&grad.grad, param.dim(), &format!("{name} {:?} update", grad.param))?;

        if self.momentum == 0.0 {
            param.scaled_add(-self.learning_rate, &grad.grad);
            return Ok(());
        }

        let velocity = self
            .velocity
            .entry((index, grad.param))
            .or_insert_with(|| Matrix::zeros(param.dim()));
        if velocity.dim() != param.dim() {
            *velocity = Matrix::zeros(param.dim());
        }
        let momentum = self.momentum;
        velocity.mapv_inplace(|v| v * momentum);
        velocity.scaled_add(self.learning_rate, &grad.grad);
        *param -= &*velocity;
        Ok(())
    }
}
