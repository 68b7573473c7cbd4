pub mod network;
pub mod spec;

pub use network::{GradRecord, Network};
pub use spec::{LayerSpec, NetworkSpec};
