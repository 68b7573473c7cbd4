use std::sync::mpsc;

use crate::error::{NnError, Result};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_network` run.
///
/// # Fields
/// - `epochs`      — total number of passes over the training split
/// - `batch_size`  — samples per minibatch; the last batch may be smaller
/// - `max_batches` — stop each epoch after this many minibatches (debug mode
///                   for quick parity runs); `None` processes every batch
/// - `progress_tx` — optional channel; one `EpochStats` is sent per
///                   completed epoch. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub max_batches: Option<usize>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` that runs full epochs with no progress channel.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig { epochs, batch_size, max_batches: None, progress_tx: None }
    }

    pub fn with_max_batches(mut self, max_batches: usize) -> Self {
        self.max_batches = Some(max_batches);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NnError::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if self.max_batches == Some(0) {
            return Err(NnError::InvalidConfig("max_batches must be at least 1".to_string()));
        }
        Ok(())
    }
}
