//! Partition module
//!
//! Slices, records and the partition contract.
//!
//! # Overview
//!
//! A cursor turns its synced intervals into [`Slice`]s. The orchestrator
//! wraps every slice in a [`Partition`], reads its [`Record`]s and reports
//! the partition back to the cursor once it is fully read. Records carry
//! the slice they were read under so the cursor can track the most recent
//! value per slice.

mod memory;
mod types;

pub use memory::{FnPartition, FnPartitionGenerator, StaticPartition};
pub use types::{Partition, PartitionGenerator, PartitionStatus, Record, Slice, SliceKey};
