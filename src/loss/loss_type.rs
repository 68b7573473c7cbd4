use serde::{Deserialize, Serialize};

use crate::diagnostics::Trace;
use crate::error::Result;
use crate::loss::softmax_cross_entropy::SoftmaxCrossEntropyLoss;
use crate::math::matrix::Matrix;

/// Selects the loss a network trains against.
///
/// - `SoftmaxCrossEntropy` — softmax over raw scores plus categorical
///   cross-entropy against integer labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    SoftmaxCrossEntropy,
}

impl LossType {
    /// Scalar loss and its gradient w.r.t. `scores`.
    pub fn get_loss(&self, scores: &Matrix, labels: &[usize], trace: &mut Trace<'_>) -> Result<(f64, Matrix)> {
        match self {
            LossType::SoftmaxCrossEntropy => SoftmaxCrossEntropyLoss::get_loss(scores, labels, trace),
        }
    }
}
