use std::sync::Arc;

use crate::core::errors::MarshalResult;

/// Append-only backing buffer for one binary signal slot.
///
/// Binary signals are accumulation buffers: within one simulation step,
/// every write appends. The first write after a step boundary truncates the
/// buffer (allocated capacity is kept) before appending; the boundary is
/// re-armed with [`clear_reset_flag`](BinaryBuffer::clear_reset_flag) once
/// the step completes.
#[derive(Debug, Default, Clone)]
pub struct BinaryBuffer {
    data: Vec<u8>,
    reset_done: bool,
}

impl BinaryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append bytes, truncating first if the per-step reset is still pending.
    ///
    /// The append is atomic: the reservation happens up front, and a failed
    /// allocation surfaces as `MarshalError::Capacity` with the buffer left
    /// exactly as before.
    pub fn append(&mut self, bytes: &[u8]) -> MarshalResult<()> {
        self.reset();
        self.data.try_reserve(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Truncate to zero length, keeping capacity. Idempotent within a step:
    /// only the first call after a step boundary truncates.
    pub fn reset(&mut self) {
        if !self.reset_done {
            self.data.clear();
            self.reset_done = true;
        }
    }

    /// Re-arm the reset gate at the end of a simulation step.
    pub fn clear_reset_flag(&mut self) {
        self.reset_done = false;
    }

    pub fn reset_pending(&self) -> bool {
        !self.reset_done
    }
}

/// Deferred-release queue for read-side strings.
///
/// Every read operation that produces a freshly allocated string (raw copy
/// or codec output) registers it here. Entries are not released when the
/// read returns: a caller holding several returned pointers from one batched
/// call may still be reading them while later variables are processed via
/// the same code path. Instead [`retire`](LazyFreeList::retire) runs at the
/// start of each read batch, and an entry registered in batch N is released
/// when batch N+2 begins. Strings from two consecutive reads therefore both
/// stay live until the call that follows the second one.
#[derive(Default)]
pub struct LazyFreeList {
    current: Vec<Arc<[u8]>>,
    previous: Vec<Arc<[u8]>>,
}

impl LazyFreeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new read batch, releasing the entries registered two batches
    /// ago.
    pub fn retire(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    /// Register a freshly produced string with the current batch.
    pub fn keep(&mut self, bytes: Vec<u8>) -> Arc<[u8]> {
        let entry: Arc<[u8]> = bytes.into();
        self.current.push(entry.clone());
        entry
    }

    pub fn live_entries(&self) -> usize {
        self.current.len() + self.previous.len()
    }
}
