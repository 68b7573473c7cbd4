use serde::{Deserialize, Serialize};

use crate::diagnostics::Trace;
use crate::error::{NnError, Result};
use crate::layers::{Layer, ParamGrad};
use crate::loss::LossType;
use crate::math::matrix::Matrix;
use crate::optim::Sgd;

/// Gradient for one parameter of the layer at `layer` (index into the stack).
#[derive(Debug, Clone)]
pub struct GradRecord {
    pub layer: usize,
    pub grad: ParamGrad,
}

/// An ordered layer stack terminated by a loss.
///
/// Consecutive layer widths are not checked here; `NetworkSpec::build`
/// validates them for configured networks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    pub loss: Option<LossType>,
    pub optimizer: Sgd,
}

impl Network {
    /// An empty network with no layers and no loss.
    pub fn new(learning_rate: f64) -> Network {
        Network { layers: Vec::new(), loss: None, optimizer: Sgd::new(learning_rate) }
    }

    /// Appends a layer; its input is the output of the previously added one.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn set_loss(&mut self, loss: LossType) {
        self.loss = Some(loss);
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate
    }

    pub fn predict(&mut self, inputs: &Matrix, train: bool) -> Result<Matrix> {
        self.predict_traced(inputs, train, &mut Trace::off())
    }

    /// Runs every layer's forward in order and returns the final scores.
    pub fn predict_traced(&mut self, inputs: &Matrix, train: bool, trace: &mut Trace<'_>) -> Result<Matrix> {
        let mut current = inputs.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current, train, trace)?;
        }
        Ok(current)
    }

    /// Forward in training mode, loss, then backward through every layer in
    /// reverse. Returns the loss and every parameter gradient; parameters are
    /// left untouched.
    pub fn backprop(
        &mut self,
        inputs: &Matrix,
        labels: &[usize],
        trace: &mut Trace<'_>,
    ) -> Result<(f64, Vec<GradRecord>)> {
        let loss_type = self.loss.ok_or(NnError::LossNotConfigured)?;

        let scores = self.predict_traced(inputs, true, trace)?;
        let (loss, mut grad) = loss_type.get_loss(&scores, labels, trace)?;

        let mut records = Vec::new();
        for (idx, layer) in self.layers.iter_mut().enumerate().rev() {
            let (grad_in, param_grads) = layer.backward(&grad, trace)?;
            records.extend(param_grads.into_iter().map(|g| GradRecord { layer: idx, grad: g }));
            grad = grad_in;
        }

        Ok((loss, records))
    }

    pub fn train(&mut self, inputs: &Matrix, labels: &[usize]) -> Result<f64> {
        self.train_traced(inputs, labels, &mut Trace::off())
    }

    /// One SGD step. The returned loss reflects the parameters before the
    /// update.
    pub fn train_traced(&mut self, inputs: &Matrix, labels: &[usize], trace: &mut Trace<'_>) -> Result<f64> {
        let (loss, records) = self.backprop(inputs, labels, trace)?;
        self.apply_gradients(&records)?;
        Ok(loss)
    }

    pub fn apply_gradients(&mut self, records: &[GradRecord]) -> Result<()> {
        for record in records {
            let layer = self.layers.get_mut(record.layer).ok_or_else(|| {
                NnError::InvalidConfig(format!("gradient for missing layer {}", record.layer))
            })?;
            self.optimizer.step(record.layer, layer, &record.grad)?;
        }
        Ok(())
    }

    /// Loss for `inputs` without caching or emitting anything.
    pub fn evaluate_loss(&mut self, inputs: &Matrix, labels: &[usize]) -> Result<f64> {
        let loss_type = self.loss.ok_or(NnError::LossNotConfigured)?;
        let scores = self.predict(inputs, false)?;
        let (loss, _) = loss_type.get_loss(&scores, labels, &mut Trace::off())?;
        Ok(loss)
    }

    /// Serializes the network parameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
