//! Job orchestration for the clip pipeline.
//!
//! `Orchestrator` is the entry point: submit a source video, poll status,
//! cancel cooperatively, or resume a job after a restart. Stage execution
//! and checkpointing live in `pipeline` and `checkpoint`.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;

pub use checkpoint::CheckpointStore;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use orchestrator::Orchestrator;
pub use pipeline::Pipeline;
