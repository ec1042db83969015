//! Pipeline executor and worker pool.
//!
//! The executor runs the ordered stage sequence for one job, committing
//! progress to the job store after every stage and enforcing the global
//! processing deadline. The pool fans queued job ids out to a bounded
//! set of executor tasks.

pub mod executor;
pub mod pool;

pub use executor::{PipelineConfig, PipelineExecutor};
pub use pool::{JobQueue, WorkerPool};
