//! Size Guard Module
//!
//! Estimates the serialized size of values and warns about oversized ones.

use std::io;

use serde::Serialize;
use tracing::warn;

// == Size Guard ==
/// Measures values by their JSON encoding and flags large ones.
///
/// Warnings are diagnostics only: a guard never fails or blocks the caller.
#[derive(Debug, Clone, Copy)]
pub struct SizeGuard {
    warn_threshold_bytes: usize,
}

impl SizeGuard {
    // == Constructor ==
    pub fn new(warn_threshold_bytes: usize) -> Self {
        Self {
            warn_threshold_bytes,
        }
    }

    pub fn warn_threshold_bytes(&self) -> usize {
        self.warn_threshold_bytes
    }

    // == Estimate ==
    /// Returns the byte length of `value`'s JSON encoding.
    ///
    /// The encoding is streamed into a counter, so no buffer of the full size
    /// is allocated.
    pub fn estimate<T: Serialize + ?Sized>(&self, value: &T) -> Result<usize, serde_json::Error> {
        let mut counter = ByteCounter::default();
        serde_json::to_writer(&mut counter, value)?;
        Ok(counter.bytes)
    }

    // == Check And Warn ==
    /// Emits a warning when `size_bytes` exceeds the threshold.
    ///
    /// Returns true if a warning was emitted.
    pub fn check_and_warn(&self, size_bytes: usize, label: &str) -> bool {
        if size_bytes > self.warn_threshold_bytes {
            warn!(
                label,
                size_bytes,
                threshold = self.warn_threshold_bytes,
                "Serialized result exceeds size threshold"
            );
            true
        } else {
            false
        }
    }
}

#[derive(Default)]
struct ByteCounter {
    bytes: usize,
}

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
