//! Job Store and File Publisher.
//!
//! The job store is the single source of truth for job state and the
//! only shared mutable resource in the system. The file store holds the
//! original upload and the rendered artifacts, addressed by
//! `(job_id, filename)`.

pub mod files;
pub mod jobs;

pub use files::FileStore;
pub use jobs::{JobStore, MemoryJobStore};
