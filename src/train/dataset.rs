use std::ops::Range;

use ndarray::{s, Array2};
use rand::Rng;

use crate::error::{NnError, Result};
use crate::math::matrix::{sample_standard_normal, Matrix};

/// Inputs `[samples, features]` with one integer class label per row.
#[derive(Debug, Clone)]
pub struct Split {
    pub inputs: Matrix,
    pub labels: Vec<usize>,
}

impl Split {
    pub fn new(inputs: Matrix, labels: Vec<usize>) -> Result<Split> {
        if inputs.nrows() != labels.len() {
            return Err(NnError::ShapeMismatch {
                context: "split labels".to_string(),
                expected: (inputs.nrows(), 1),
                found: (labels.len(), 1),
            });
        }
        Ok(Split { inputs, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Contiguous rows `range` as an owned minibatch.
    pub fn batch(&self, range: Range<usize>) -> (Matrix, &[usize]) {
        (self.inputs.slice(s![range.clone(), ..]).to_owned(), &self.labels[range])
    }

    /// `n` samples spread round-robin over `classes` Gaussian clusters.
    ///
    /// Each class gets a random center in `[-1, 1]^features`; samples are the
    /// center plus `N(0, spread²)` noise. Used by the command-line demo so it
    /// runs without any dataset files.
    pub fn gaussian_clusters<R: Rng>(
        n: usize,
        features: usize,
        classes: usize,
        spread: f64,
        rng: &mut R,
    ) -> Result<Split> {
        if classes == 0 || features == 0 {
            return Err(NnError::InvalidConfig("clusters need at least one class and feature".to_string()));
        }
        let centers = Array2::from_shape_simple_fn((classes, features), || rng.gen::<f64>() * 2.0 - 1.0);
        let labels: Vec<usize> = (0..n).map(|i| i % classes).collect();
        let mut inputs = Matrix::zeros((n, features));
        for (i, &label) in labels.iter().enumerate() {
            for j in 0..features {
                inputs[[i, j]] = centers[[label, j]] + spread * sample_standard_normal(rng);
            }
        }
        Split::new(inputs, labels)
    }

    /// Splits off the last `n` rows as a second split.
    pub fn split_tail(self, n: usize) -> Result<(Split, Split)> {
        let total = self.len();
        if n > total {
            return Err(NnError::InvalidConfig(format!("cannot take {n} of {total} samples")));
        }
        let cut = total - n;
        let head = Split::new(self.inputs.slice(s![..cut, ..]).to_owned(), self.labels[..cut].to_vec())?;
        let tail = Split::new(self.inputs.slice(s![cut.., ..]).to_owned(), self.labels[cut..].to_vec())?;
        Ok((head, tail))
    }
}

/// Already normalized data, split by role.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub train: Split,
    pub val: Option<Split>,
    pub test: Option<Split>,
}

impl Dataset {
    pub fn new(train: Split) -> Dataset {
        Dataset { train, val: None, test: None }
    }
}
