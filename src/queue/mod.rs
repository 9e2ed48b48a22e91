//! Queue composition and execution surface
//!
//! This module provides the building blocks a caller assembles into a
//! pipeline: [`CommandSpec`] descriptors, [`WorkItem`]s, [`Batch`]es with a
//! fixed [`Discipline`], and the [`TaskQueue`] that owns them and drives
//! execution.

pub mod batch;
pub mod config;
pub mod task_queue;
pub mod work_item;

pub use batch::{Batch, Discipline};
pub use config::QueueConfig;
pub use task_queue::TaskQueue;
pub use work_item::{CommandSpec, WorkItem};
