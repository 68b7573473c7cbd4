use serde::{Deserialize, Serialize};

/// Per-epoch training statistics returned (and optionally streamed) by
/// `train_network`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch number, as used in diagnostic file names.
    pub epoch: usize,
    /// Mean of the per-batch training losses.
    pub train_loss: f64,
    /// Minibatches processed this epoch.
    pub batches: usize,
    /// Samples processed this epoch.
    pub samples: usize,
    /// Sample-weighted validation loss, if a validation split was provided.
    pub val_loss: Option<f64>,
    /// Validation accuracy as a fraction in [0, 1].
    pub val_accuracy: Option<f64>,
    /// Wall-clock duration of the training pass in milliseconds.
    pub elapsed_ms: u64,
}
