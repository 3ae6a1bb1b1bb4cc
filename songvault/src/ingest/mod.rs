//! Ingestion pipeline: scratch management and orchestration.

mod reaper;
mod reconcile;
mod scratch;
mod service;

pub use reaper::{DEFAULT_SCRATCH_MAX_AGE, ReapReport, ScratchReaper};
pub use reconcile::{ALTERNATE_EXTENSIONS, reconcile_output};
pub use scratch::{ensure_scratch_dir, purge_work_item, remove_best_effort};
pub use service::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_INSPECT_TIMEOUT, IngestConfig, IngestRequest, IngestService,
};
