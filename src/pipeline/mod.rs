//! Pipeline orchestration for the research workflow.
//!
//! This module composes the capability roles and the dependency-linked task
//! chain into one run unit, executes it behind the engine boundary, and
//! reduces the per-task outputs into a single structured outcome record.
//!
//! # Components
//!
//! - **Progress**: a callback sink invoked at fixed milestones so any front
//!   end can subscribe to coarse phase markers
//! - **Executor**: the thin adapter that assembles a [`PipelineRun`] and
//!   extracts the ordered output list from the engine
//! - **Result**: the aggregator producing a [`ResultRecord`] with
//!   partial-failure capture
//! - **Service**: the top-level entry point that always returns a
//!   `ResultRecord`, never an unhandled error
//!
//! [`PipelineRun`]: crate::engine::PipelineRun

pub mod executor;
pub mod progress;
pub mod result;
pub mod service;

pub use executor::PipelineExecutor;
pub use progress::{milestones, ProgressReporter};
pub use result::{aggregate, ResultRecord};
pub use service::{ResearchService, RunParams};
