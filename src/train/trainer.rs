use std::time::Instant;

use crate::diagnostics::DiagnosticsSink;
use crate::error::Result;
use crate::network::network::Network;
use crate::train::dataset::Dataset;
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::{evaluate, run_one_epoch};
use crate::train::train_config::TrainConfig;

/// Trains `network` on `dataset.train` for `config.epochs` epochs.
///
/// Batches are taken in index order every epoch, so two runs with the same
/// initial parameters produce identical diagnostics. After each epoch one
/// line `Epoch: <n>, train loss: <loss>` is printed to stdout; when a
/// validation split is present it is evaluated and reported in the returned
/// stats.
///
/// # Errors
/// Any error from a training step aborts the run; the diagnostics already
/// written for that step are incomplete.
pub fn train_network(
    network: &mut Network,
    dataset: &Dataset,
    config: &TrainConfig,
    sink: &mut dyn DiagnosticsSink,
) -> Result<Vec<EpochStats>> {
    config.validate()?;

    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        let t_start = Instant::now();
        let pass = run_one_epoch(network, &dataset.train, epoch, config.batch_size, config.max_batches, sink)?;
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        let train_loss = pass.mean_loss();
        println!("Epoch: {}, train loss: {:.3}", epoch, train_loss);

        let (val_loss, val_accuracy) = match &dataset.val {
            Some(val) => {
                let (loss, acc) = evaluate(network, val, config.batch_size)?;
                (Some(loss), Some(acc))
            }
            None => (None, None),
        };

        let stats = EpochStats {
            epoch,
            train_loss,
            batches: pass.batches,
            samples: pass.samples,
            val_loss,
            val_accuracy,
            elapsed_ms,
        };

        if let Some(ref tx) = config.progress_tx {
            // Nobody listening is fine; training continues.
            let _ = tx.send(stats.clone());
        }
        history.push(stats);
    }

    Ok(history)
}
