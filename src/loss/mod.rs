pub mod loss_type;
pub mod softmax_cross_entropy;

pub use loss_type::LossType;
pub use softmax_cross_entropy::SoftmaxCrossEntropyLoss;
