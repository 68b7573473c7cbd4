pub mod dataset;
pub mod epoch_stats;
pub mod loop_fn;
pub mod train_config;
pub mod trainer;

pub use dataset::{Dataset, Split};
pub use epoch_stats::EpochStats;
pub use loop_fn::{batch_ranges, evaluate, run_one_epoch, EpochPass};
pub use train_config::TrainConfig;
pub use trainer::train_network;
