//! Persisted copies of views.

pub mod partitioned;

pub use partitioned::{scan_partitions, write_partitioned, PartitionInfo, PartitionWriteSummary};
