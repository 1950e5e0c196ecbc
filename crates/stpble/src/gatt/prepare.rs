//! Prepared (long) write reassembly
//!
//! A peer sends offset-addressed chunks with prepare-write requests and then
//! commits or cancels them with one execute-write. Only one sequence is
//! staged at a time since the peripheral accepts a single connection.

use super::constants::PREPARE_BUF_MAX_SIZE;
use super::error::PrepareError;
use log::debug;

/// Staging buffer for one prepared-write sequence
#[derive(Debug)]
pub struct PrepareWriteBuffer {
    capacity: usize,
    buf: Option<Vec<u8>>,
    /// Sum of accepted chunk lengths
    accumulated: usize,
    /// Highest byte written so far (end offset)
    extent: usize,
}

impl Default for PrepareWriteBuffer {
    fn default() -> Self {
        Self::new(PREPARE_BUF_MAX_SIZE)
    }
}

impl PrepareWriteBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buf: None,
            accumulated: 0,
            extent: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True while a sequence is staged
    pub fn is_active(&self) -> bool {
        self.buf.is_some()
    }

    pub fn accumulated_len(&self) -> usize {
        self.accumulated
    }

    /// Stages one chunk. The first chunk of a sequence allocates the buffer.
    ///
    /// On error nothing is copied and the accumulated length is unchanged.
    pub fn begin_or_continue(&mut self, offset: usize, chunk: &[u8]) -> Result<(), PrepareError> {
        if self.buf.is_none() {
            self.buf = Some(Self::allocate(self.capacity)?);
            self.accumulated = 0;
            self.extent = 0;
        }

        if offset > self.capacity {
            return Err(PrepareError::InvalidOffset {
                offset,
                capacity: self.capacity,
            });
        }
        let end = offset + chunk.len();
        if end > self.capacity {
            return Err(PrepareError::InvalidLength {
                offset,
                len: chunk.len(),
                capacity: self.capacity,
            });
        }

        let buf = self.buf.as_mut().ok_or(PrepareError::NoResources)?;
        buf[offset..end].copy_from_slice(chunk);
        self.accumulated += chunk.len();
        self.extent = self.extent.max(end);
        debug!(
            "staged {} bytes at offset {}, {} accumulated",
            chunk.len(),
            offset,
            self.accumulated
        );
        Ok(())
    }

    /// Ends the sequence. Returns the merged bytes when `commit` is set and a
    /// sequence was staged. The buffer is released either way.
    pub fn finish(&mut self, commit: bool) -> Option<Vec<u8>> {
        let buf = self.buf.take();
        let extent = self.extent;
        self.accumulated = 0;
        self.extent = 0;

        match buf {
            Some(mut data) if commit => {
                data.truncate(extent);
                Some(data)
            }
            _ => None,
        }
    }

    fn allocate(capacity: usize) -> Result<Vec<u8>, PrepareError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| PrepareError::NoResources)?;
        buf.resize(capacity, 0);
        Ok(buf)
    }
}
