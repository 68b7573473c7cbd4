use ndarray::Axis;

use crate::diagnostics::{Field, Trace};
use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Layer name the loss uses in diagnostic file names.
pub const DIAGNOSTICS_NAME: &str = "COST_CE";

/// Softmax over the class axis followed by mean categorical cross-entropy.
pub struct SoftmaxCrossEntropyLoss;

impl SoftmaxCrossEntropyLoss {
    /// Row-wise softmax. The row max is subtracted before exponentiating so
    /// large logits cannot overflow.
    pub fn softmax(scores: &Matrix) -> Matrix {
        let row_max = scores.fold_axis(Axis(1), f64::NEG_INFINITY, |&a, &b| a.max(b));
        let mut probs = scores - &row_max.insert_axis(Axis(1));
        probs.mapv_inplace(f64::exp);
        let row_sum = probs.sum_axis(Axis(1)).insert_axis(Axis(1));
        probs / &row_sum
    }

    /// Returns `(loss, grad)` where `loss` is the batch mean of
    /// `-log p[true class]` and `grad = (p - one_hot(labels)) / batch`, the
    /// combined softmax + cross-entropy gradient w.r.t. the logits.
    ///
    /// Labels are validated before any one-hot indexing.
    pub fn get_loss(scores: &Matrix, labels: &[usize], trace: &mut Trace<'_>) -> Result<(f64, Matrix)> {
        let (batch, classes) = scores.dim();
        if labels.len() != batch {
            return Err(NnError::ShapeMismatch {
                context: "loss labels".to_string(),
                expected: (batch, 1),
                found: (labels.len(), 1),
            });
        }
        if let Some((row, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= classes) {
            return Err(NnError::InvalidLabel { row, label, classes });
        }

        let probs = Self::softmax(scores);
        let loss = labels
            .iter()
            .enumerate()
            .map(|(row, &label)| -probs[[row, label]].ln())
            .sum::<f64>()
            / batch as f64;

        trace.emit(DIAGNOSTICS_NAME, Field::Loss, &Matrix::from_elem((1, 1), loss))?;

        let mut grad = probs;
        for (row, &label) in labels.iter().enumerate() {
            grad[[row, label]] -= 1.0;
        }
        grad /= batch as f64;

        Ok((loss, grad))
    }
}
