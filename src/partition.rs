//! Partitioned access to an input file.
//!
//! The codec only needs read access to fixed-size slices of the input; this
//! module defines that contract and a simple in-memory implementation.
use crate::sonar::{Result, SonarError};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Read-only view of a file split into fixed-size partitions.
///
/// Every partition has `partition_size()` bytes except possibly the last,
/// which holds the remainder.
pub trait PartitionSource {
    /// Size of the whole input in bytes
    fn total_size(&self) -> usize;

    fn partition_count(&self) -> usize;

    /// Nominal size of every partition but the last
    fn partition_size(&self) -> usize;

    /// Bytes of partition `index`, or `None` if it does not exist
    fn partition(&self, index: usize) -> Option<&[u8]>;
}

/// An input file held in memory and sliced into partitions
#[derive(Debug, Clone)]
pub struct PartitionedFile {
    data: Vec<u8>,
    partition_size: usize,
}

impl PartitionedFile {
    /// Splits `data` into partitions of `partition_size` bytes.
    pub fn with_partition_size(data: Vec<u8>, partition_size: usize) -> Result<Self> {
        if partition_size == 0 {
            return Err(SonarError::InvalidConfig(
                "Partition size must be positive".to_string(),
            ));
        }
        Ok(PartitionedFile {
            data,
            partition_size,
        })
    }

    /// Splits `data` into at most `count` partitions of equal size (rounded up).
    ///
    /// Rounding can leave fewer partitions than requested (5 bytes in 4
    /// partitions gives 3 of 2 bytes); `partition_count()` is authoritative.
    pub fn with_partition_count(data: Vec<u8>, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(SonarError::InvalidConfig(
                "Partition count must be positive".to_string(),
            ));
        }
        let partition_size = data.len().div_ceil(count).max(1);
        let source = Self::with_partition_size(data, partition_size)?;
        if source.partition_count() < count {
            warn!(
                "Requested {} partitions but {} bytes only fill {}",
                count,
                source.total_size(),
                source.partition_count()
            );
        }
        Ok(source)
    }

    /// Reads `path` and splits it into `count` partitions.
    pub fn open(path: &Path, count: usize) -> Result<Self> {
        let data = fs::read(path)?;
        Self::with_partition_count(data, count)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl PartitionSource for PartitionedFile {
    fn total_size(&self) -> usize {
        self.data.len()
    }

    fn partition_count(&self) -> usize {
        self.data.len().div_ceil(self.partition_size)
    }

    fn partition_size(&self) -> usize {
        self.partition_size
    }

    fn partition(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.partition_size)?;
        if start >= self.data.len() {
            return None;
        }
        let end = (start + self.partition_size).min(self.data.len());
        Some(&self.data[start..end])
    }
}
