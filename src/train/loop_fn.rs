use std::ops::Range;

use ndarray::Axis;

use crate::diagnostics::{DiagnosticsSink, Step, Trace};
use crate::error::{NnError, Result};
use crate::network::network::Network;
use crate::train::dataset::Split;

/// Contiguous minibatch ranges over `0..n`, in index order. The last range
/// is shorter when `batch_size` does not divide `n`; no sample is dropped.
pub fn batch_ranges(n: usize, batch_size: usize) -> impl Iterator<Item = Range<usize>> {
    let step = batch_size.max(1);
    (0..n).step_by(step).map(move |start| start..(start + step).min(n))
}

/// Outcome of one pass over the training split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochPass {
    pub total_loss: f64,
    pub batches: usize,
    pub samples: usize,
}

impl EpochPass {
    pub fn mean_loss(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.total_loss / self.batches as f64
        }
    }
}

/// Runs minibatch SGD over `split` in index order, one `train` call per
/// batch. Stops early after `max_batches` batches when set.
pub fn run_one_epoch(
    network: &mut Network,
    split: &Split,
    epoch: usize,
    batch_size: usize,
    max_batches: Option<usize>,
    sink: &mut dyn DiagnosticsSink,
) -> Result<EpochPass> {
    let mut pass = EpochPass { total_loss: 0.0, batches: 0, samples: 0 };

    for (iter, range) in batch_ranges(split.len(), batch_size).enumerate() {
        if max_batches.is_some_and(|max| iter >= max) {
            break;
        }
        let (inputs, labels) = split.batch(range);
        let mut trace = Trace::new(Step::new(epoch, iter), &mut *sink);
        pass.total_loss += network.train_traced(&inputs, labels, &mut trace)?;
        pass.batches += 1;
        pass.samples += labels.len();
    }

    Ok(pass)
}

/// Sample-weighted mean loss and accuracy of `network` on `split`, in
/// non-training mode.
pub fn evaluate(network: &mut Network, split: &Split, batch_size: usize) -> Result<(f64, f64)> {
    let loss_type = network.loss.ok_or(NnError::LossNotConfigured)?;
    if split.is_empty() {
        return Ok((0.0, 0.0));
    }

    let mut total_loss = 0.0;
    let mut correct = 0usize;
    for range in batch_ranges(split.len(), batch_size) {
        let (inputs, labels) = split.batch(range);
        let scores = network.predict(&inputs, false)?;
        let (loss, _) = loss_type.get_loss(&scores, labels, &mut Trace::off())?;
        total_loss += loss * labels.len() as f64;
        correct += scores
            .axis_iter(Axis(0))
            .zip(labels)
            .filter(|(row, label)| argmax(row.iter().copied()) == **label)
            .count();
    }

    let n = split.len() as f64;
    Ok((total_loss / n, correct as f64 / n))
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    values
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
        .0
}
