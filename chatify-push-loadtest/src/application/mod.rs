pub mod handlers;
pub mod load_runner;
pub mod summary;

pub use handlers::{DriverConfig, VirtualUserDriver};
pub use load_runner::{IterationPolicy, LoadRunner, RunReport, RunnerConfig, VirtualUserReport};
pub use summary::{LatencyStats, RunSummary};
