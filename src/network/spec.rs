use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::layers::Layer;
use crate::loss::LossType;
use crate::network::network::Network;
use crate::optim::Sgd;

/// Describes one layer in a network specification.
///
/// - `Linear` — fully connected, `input_size → output_size`
/// - `Relu`   — elementwise rectifier, width-preserving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Linear { name: String, input_size: usize, output_size: usize },
    Relu { name: String },
}

/// A serializable architecture plus the hyperparameters needed to build it
/// reproducibly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub learning_rate: f64,
    /// Heavy-ball momentum; 0 is plain SGD.
    #[serde(default)]
    pub momentum: f64,
    /// Seed for parameter initialization.
    pub seed: u64,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    pub loss: LossType,
}

impl NetworkSpec {
    /// `dim → 256 → ReLU → 128 → ReLU → n_classes`, trained with softmax
    /// cross-entropy. Layer names match the reference dumps.
    pub fn reference_mlp(input_dim: usize, n_classes: usize, learning_rate: f64, seed: u64) -> NetworkSpec {
        let linear = |name: &str, input_size, output_size| LayerSpec::Linear {
            name: name.to_string(),
            input_size,
            output_size,
        };
        NetworkSpec {
            learning_rate,
            momentum: 0.0,
            seed,
            layers: vec![
                linear("L0_LIN", input_dim, 256),
                LayerSpec::Relu { name: "L0_RELU".to_string() },
                linear("L1_LIN", 256, 128),
                LayerSpec::Relu { name: "L1_RELU".to_string() },
                linear("L2_LIN", 128, n_classes),
            ],
            loss: LossType::SoftmaxCrossEntropy,
        }
    }

    /// Checks the hyperparameters and that consecutive Linear widths chain.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NnError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.momentum.is_finite() && self.momentum >= 0.0) {
            return Err(NnError::InvalidConfig(format!(
                "momentum must be non-negative, got {}",
                self.momentum
            )));
        }
        let mut width: Option<(usize, &str)> = None;
        for layer in &self.layers {
            if let LayerSpec::Linear { name, input_size, output_size } = layer {
                if *input_size == 0 || *output_size == 0 {
                    return Err(NnError::InvalidConfig(format!("layer {name} has a zero dimension")));
                }
                if let Some((prev, prev_name)) = width {
                    if prev != *input_size {
                        return Err(NnError::InvalidConfig(format!(
                            "layer {name} expects {input_size} inputs but {prev_name} produces {prev}"
                        )));
                    }
                }
                width = Some((*output_size, name.as_str()));
            }
        }
        Ok(())
    }

    /// Builds the network, drawing every initial parameter from one
    /// generator seeded with `self.seed`, in layer order.
    ///
    /// The generator is ChaCha8 expanded from the seed with
    /// `SeedableRng::seed_from_u64`, whose output is fixed across `rand`
    /// releases, so a seed always yields the same parameters.
    pub fn build(&self) -> Result<Network> {
        self.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut network = Network::new(self.learning_rate);
        network.optimizer = Sgd::with_momentum(self.learning_rate, self.momentum);
        for layer in &self.layers {
            network.add_layer(match layer {
                LayerSpec::Linear { name, input_size, output_size } => {
                    Layer::linear(name, *input_size, *output_size, &mut rng)
                }
                LayerSpec::Relu { name } => Layer::relu(name),
            });
        }
        network.set_loss(self.loss);
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
