//! Fixed-size status code counter table
//!
//! Tallies are kept in a flat array indexed directly by status code. The key
//! domain (`0..600`) is small and dense, so a plain array beats a hash map both
//! in allocation cost and in increment speed on the per-record hot path.

use std::ops::Range;

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::decoder::DecodeError;

/// Exclusive upper bound of the status codes the table can hold
pub const STATUS_CODE_LIMIT: usize = 600;

/// Status codes counted as errors when computing the error rate (4xx and 5xx)
pub const ERROR_STATUS_RANGE: Range<u16> = 400..600;

/// Per-status counters for one file, or for a whole run after merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts {
    counts: [u64; STATUS_CODE_LIMIT],
}

impl Default for StatusCounts {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCounts {
    pub fn new() -> Self {
        Self {
            counts: [0; STATUS_CODE_LIMIT],
        }
    }

    /// Whether `status` has a slot in the table
    pub fn covers(status: u16) -> bool {
        (status as usize) < STATUS_CODE_LIMIT
    }

    /// Count one record with the given status
    ///
    /// Out-of-range statuses are rejected before any indexing happens, so the
    /// caller can treat them like any other undecodable record.
    pub fn increment(&mut self, status: u16) -> Result<(), DecodeError> {
        match self.counts.get_mut(status as usize) {
            Some(slot) => {
                *slot += 1;
                Ok(())
            }
            None => Err(DecodeError::StatusOutOfRange(status)),
        }
    }

    /// Count for a single status; zero for statuses outside the table
    pub fn get(&self, status: u16) -> u64 {
        self.counts.get(status as usize).copied().unwrap_or(0)
    }

    /// Element-wise addition of `other` into `self`
    ///
    /// Addition is commutative and associative, so merging any number of
    /// tables in any order produces the same result.
    pub fn merge(&mut self, other: &StatusCounts) {
        for (slot, count) in self.counts.iter_mut().zip(other.counts.iter()) {
            *slot += count;
        }
    }

    /// Sum over every slot
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Sum over the statuses in `range` (clamped to the table)
    pub fn count_in(&self, range: Range<u16>) -> u64 {
        let start = (range.start as usize).min(STATUS_CODE_LIMIT);
        let end = (range.end as usize).min(STATUS_CODE_LIMIT);
        if start >= end {
            return 0;
        }
        self.counts[start..end].iter().sum()
    }

    /// Non-zero `(status, count)` pairs in ascending status order
    pub fn iter(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(status, count)| (status as u16, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|count| *count == 0)
    }
}

impl Serialize for StatusCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let non_zero: Vec<(u16, u64)> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(non_zero.len()))?;
        for (status, count) in non_zero {
            map.serialize_entry(&status.to_string(), &count)?;
        }
        map.end()
    }
}
