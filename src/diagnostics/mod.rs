//! Per-step intermediate tensors, emitted from inside forward/backward.
//!
//! Layers never touch the filesystem. They hand a fully described [`Record`]
//! to whatever [`DiagnosticsSink`] the caller injected through a [`Trace`].

pub mod compare;
pub mod sink;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::matrix::Matrix;

pub use compare::{compare_dirs, load_txt, max_abs_diff, FileDiff};
pub use sink::{format_txt, MemorySink, NullSink, TxtDirSink};

/// Position of a training step: epoch number and minibatch index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    pub epoch: usize,
    pub iter: usize,
}

impl Step {
    pub fn new(epoch: usize, iter: usize) -> Step {
        Step { epoch, iter }
    }
}

/// Which tensor a record holds. The on-disk spelling is fixed by the
/// external reference trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Out,
    W,
    B,
    Delta,
    GW,
    GB,
    Loss,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Out => "out",
            Field::W => "W",
            Field::B => "b",
            Field::Delta => "delta",
            Field::GW => "gW",
            Field::GB => "gb",
            Field::Loss => "loss",
        }
    }
}

/// One labeled, shape-tagged tensor.
///
/// `matrix` is already in on-disk orientation: weight matrices and their
/// gradients arrive transposed, biases do not.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub step: Step,
    pub layer: &'a str,
    pub field: Field,
    pub matrix: ArrayView2<'a, f64>,
}

impl Record<'_> {
    /// `epoch_<3-digit>_iter_<3-digit>_<layer>_<field>_<rows>x<cols>.txt`
    pub fn file_name(&self) -> String {
        let (rows, cols) = self.matrix.dim();
        format!(
            "epoch_{:03}_iter_{:03}_{}_{}_{}x{}.txt",
            self.step.epoch,
            self.step.iter,
            self.layer,
            self.field.as_str(),
            rows,
            cols
        )
    }
}

/// Destination for diagnostic records. Called once per tensor per step,
/// from a single caller, in emission order.
pub trait DiagnosticsSink {
    fn record(&mut self, record: &Record<'_>) -> Result<()>;
}

/// The current step plus an optional sink. Threaded through
/// `forward`/`backward`/`get_loss` so emission stays out of the numeric code.
pub struct Trace<'a> {
    pub step: Step,
    sink: Option<&'a mut dyn DiagnosticsSink>,
}

impl<'a> Trace<'a> {
    pub fn new(step: Step, sink: &'a mut dyn DiagnosticsSink) -> Trace<'a> {
        Trace { step, sink: Some(sink) }
    }

    /// A trace that drops everything.
    pub fn off() -> Trace<'static> {
        Trace { step: Step::default(), sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&mut self, layer: &str, field: Field, matrix: &Matrix) -> Result<()> {
        let step = self.step;
        match self.sink.as_deref_mut() {
            Some(sink) => sink.record(&Record { step, layer, field, matrix: matrix.view() }),
            None => Ok(()),
        }
    }

    /// Same as [`Trace::emit`], writing the transpose of `matrix`.
    pub fn emit_transposed(&mut self, layer: &str, field: Field, matrix: &Matrix) -> Result<()> {
        let step = self.step;
        match self.sink.as_deref_mut() {
            Some(sink) => sink.record(&Record { step, layer, field, matrix: matrix.t() }),
            None => Ok(()),
        }
    }
}
