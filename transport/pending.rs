// Outbound queue: owned buffers waiting for the socket to accept them, drained strictly FIFO
use crate::traits::OnSendComplete;
use sockio_core::{IoError, Result};
use std::collections::VecDeque;
use std::fmt;

/// A write that could not be flushed synchronously.
///
/// The buffer is never shifted; `offset` marks how much has already been sent.
pub struct PendingWrite {
    bytes: Vec<u8>,
    offset: usize,
    on_send_complete: Option<OnSendComplete>,
}

impl PendingWrite {
    pub fn new(bytes: Vec<u8>, on_send_complete: Option<OnSendComplete>) -> Self {
        PendingWrite {
            bytes,
            offset: 0,
            on_send_complete,
        }
    }

    /// Copies `bytes` into a new record; allocation failure is an error, not an abort.
    pub fn copy_from(bytes: &[u8], on_send_complete: Option<OnSendComplete>) -> Result<Self> {
        let mut owned = reserve_buffer(bytes.len())?;
        owned.extend_from_slice(bytes);
        Ok(Self::new(owned, on_send_complete))
    }

    /// Bytes still to be sent.
    pub fn remaining(&self) -> &[u8] {
        &self.bytes[self.offset..]
    }

    pub fn remaining_len(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn advance(&mut self, sent: usize) {
        self.offset = (self.offset + sent).min(self.bytes.len());
    }

    pub fn is_flushed(&self) -> bool {
        self.offset == self.bytes.len()
    }

    pub fn take_completion(&mut self) -> Option<OnSendComplete> {
        self.on_send_complete.take()
    }
}

impl fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PendingWrite")
            .field("len", &self.bytes.len())
            .field("offset", &self.offset)
            .field("has_completion", &self.on_send_complete.is_some())
            .finish()
    }
}

fn reserve_buffer(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|source| IoError::Allocation { len, source })?;
    Ok(buf)
}

#[derive(Debug, Default)]
pub struct PendingQueue {
    writes: VecDeque<PendingWrite>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: PendingWrite) {
        self.writes.push_back(write);
    }

    pub fn front_mut(&mut self) -> Option<&mut PendingWrite> {
        self.writes.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<PendingWrite> {
        self.writes.pop_front()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Total unsent bytes across every record.
    pub fn queued_bytes(&self) -> usize {
        self.writes.iter().map(PendingWrite::remaining_len).sum()
    }

    /// Drops every record without running its completion. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.writes.len();
        self.writes.clear();
        dropped
    }
}
