pub mod diagnostics;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use diagnostics::{DiagnosticsSink, Field, MemorySink, NullSink, Record, Step, Trace, TxtDirSink};
pub use error::{NnError, Result};
pub use layers::{Layer, Linear, Param, ParamGrad, Relu};
pub use loss::{LossType, SoftmaxCrossEntropyLoss};
pub use math::matrix::Matrix;
pub use network::{GradRecord, LayerSpec, Network, NetworkSpec};
pub use optim::sgd::Sgd;
pub use train::{train_network, Dataset, EpochStats, Split, TrainConfig};
