use std::borrow::Cow;
use std::sync::Arc;

use log::{debug, trace};
use uuid::Uuid;

use crate::core::buffer::LazyFreeList;
use crate::core::codec::CodecRegistry;
use crate::core::errors::MarshalResult;
use crate::core::index::{ScalarSet, ValueRefIndex};
use crate::core::signal::SignalVector;
use crate::core::types::ValueRef;

/// The get/set boundary of one model instance.
///
/// Owns the signal vectors delivered over the simulation bus, the
/// value-reference index built from their annotations, and the deferred
/// release list for read-side strings. All operations are batched over a
/// value-reference slice; unknown value references are silently skipped.
pub struct SignalRuntime {
    pub instance_id: Uuid,
    vectors: Vec<SignalVector>,
    index: ValueRefIndex,
    free_list: LazyFreeList,
    binary_reset: bool,
}

impl SignalRuntime {
    pub fn new(vectors: Vec<SignalVector>, registry: &CodecRegistry) -> Self {
        let index = ValueRefIndex::build(&vectors, registry);
        let instance_id = Uuid::new_v4();
        debug!(
            "signal runtime {} created over {} vectors",
            instance_id,
            vectors.len()
        );
        Self {
            instance_id,
            vectors,
            index,
            free_list: LazyFreeList::new(),
            binary_reset: false,
        }
    }

    pub fn index(&self) -> &ValueRefIndex {
        &self.index
    }

    pub fn vectors(&self) -> &[SignalVector] {
        &self.vectors
    }

    pub fn vector(&self, index: usize) -> Option<&SignalVector> {
        self.vectors.get(index)
    }

    pub fn vector_mut(&mut self, index: usize) -> Option<&mut SignalVector> {
        self.vectors.get_mut(index)
    }

    /// Read scalar values produced by the component. Slots of `values`
    /// whose value reference is not indexed are left untouched.
    pub fn read_scalars(&self, vrefs: &[ValueRef], values: &mut [f64]) {
        for (vref, value) in vrefs.iter().zip(values.iter_mut()) {
            let Some(slot) = self.index.scalar(*vref, ScalarSet::Output) else {
                continue;
            };
            *value = self.vectors[slot.vector].scalar[slot.slot];
        }
    }

    /// Write scalar values consumed by the component.
    pub fn write_scalars(&mut self, vrefs: &[ValueRef], values: &[f64]) {
        for (vref, value) in vrefs.iter().zip(values.iter()) {
            let Some(slot) = self.index.scalar(*vref, ScalarSet::Input) else {
                continue;
            };
            self.vectors[slot.vector].scalar[slot.slot] = *value;
        }
    }

    /// Read binary payloads produced by the component, encoding each one
    /// when a codec is installed for its value reference.
    ///
    /// Every produced string registers with the deferred release list: it
    /// stays allocated through the next read batch and is released when the
    /// batch after that begins.
    pub fn read_binaries(&mut self, vrefs: &[ValueRef]) -> Vec<Option<Arc<[u8]>>> {
        let Self {
            vectors,
            index,
            free_list,
            ..
        } = self;
        free_list.retire();

        vrefs
            .iter()
            .map(|vref| {
                let slot = index.binary_tx(*vref)?;
                let buf = &vectors[slot.vector].binary[slot.slot];
                if buf.is_empty() {
                    return None;
                }
                trace!("read binary vref {} ({} bytes)", vref, buf.len());
                let produced = match index.codec(*vref) {
                    Some(codec) => codec.encode(buf.as_bytes()),
                    None => buf.as_bytes().to_vec(),
                };
                Some(free_list.keep(produced))
            })
            .collect()
    }

    /// Write binary payloads consumed by the component, decoding each one
    /// when a codec is installed for its value reference.
    ///
    /// Payloads always append: when several value references alias one
    /// signal (bus topology), every write lands on that signal within the
    /// step. The first write of a step truncates the buffers first.
    pub fn write_binaries(
        &mut self,
        vrefs: &[ValueRef],
        values: &[Option<&[u8]>],
    ) -> MarshalResult<()> {
        self.reset_binary_signals();
        for (vref, value) in vrefs.iter().zip(values.iter()) {
            let Some(data) = value else { continue };
            let Some(slot) = self.index.binary_rx(*vref) else {
                continue;
            };
            let bytes: Cow<'_, [u8]> = match self.index.codec(*vref) {
                Some(codec) => Cow::Owned(codec.decode(data)?),
                None => Cow::Borrowed(*data),
            };
            trace!("write binary vref {} ({} bytes)", vref, bytes.len());
            self.vectors[slot.vector].binary[slot.slot].append(&bytes)?;
        }
        Ok(())
    }

    /// Truncate all binary signals once per step. Safe to call more than
    /// once; only the first call after a step boundary truncates.
    pub fn reset_binary_signals(&mut self) {
        if !self.binary_reset {
            for sv in self.vectors.iter_mut() {
                if sv.is_binary {
                    sv.reset_binary();
                }
            }
            self.binary_reset = true;
        }
    }

    /// Re-arm the binary reset mechanism after a step completes.
    pub fn end_step(&mut self) {
        self.binary_reset = false;
        for sv in self.vectors.iter_mut() {
            sv.clear_reset_flags();
        }
    }
}
