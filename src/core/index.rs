use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::core::codec::{CodecRegistry, TextCodec};
use crate::core::signal::SignalVector;
use crate::core::types::ValueRef;

/// Location of one signal slot: the owning vector and the slot within it.
///
/// Fan-out index entries are independent map entries pointing at a shared
/// slot; none of them owns the underlying storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub vector: usize,
    pub slot: usize,
}

/// Which scalar set a value reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarSet {
    Input,
    Output,
}

/// String-keyed lookup from an external value reference to a signal slot.
///
/// Built once per runtime instance and read-only during simulation. A
/// lookup miss is not an error: unconfigured value references are common
/// and callers treat "not found" as "ignore this value reference".
#[derive(Default)]
pub struct ValueRefIndex {
    scalar_input: HashMap<String, SlotRef>,
    scalar_output: HashMap<String, SlotRef>,
    binary_rx: HashMap<String, SlotRef>,
    binary_tx: HashMap<String, SlotRef>,
    codecs: HashMap<String, Arc<dyn TextCodec>>,
}

impl ValueRefIndex {
    /// Index every signal of every vector.
    ///
    /// Scalar signals index by causality into the input xor output map.
    /// Binary signals index through their bus-topology fan-out lists, one
    /// entry per aliased value reference, all resolving to the same slot;
    /// the text-encoding annotation installs a codec handle per listed
    /// value reference.
    pub fn build(vectors: &[SignalVector], registry: &CodecRegistry) -> Self {
        let mut index = Self::default();

        for (vi, sv) in vectors.iter().enumerate() {
            for (si, spec) in sv.specs().iter().enumerate() {
                // Signals without a value reference are not addressable.
                let Some(vref) = spec.vref else { continue };
                let slot = SlotRef {
                    vector: vi,
                    slot: si,
                };

                if sv.is_binary {
                    for &rx in &spec.bus_rx_vrefs {
                        index.binary_rx.insert(rx.to_string(), slot);
                    }
                    for &tx in &spec.bus_tx_vrefs {
                        index.binary_tx.insert(tx.to_string(), slot);
                    }
                    if let Some(encoding) = &spec.encoding {
                        match registry.lookup(encoding) {
                            Some(codec) => {
                                for &ev in &spec.encoding_vrefs {
                                    index.codecs.insert(ev.to_string(), codec.clone());
                                }
                            }
                            None => warn!(
                                "signal '{}': no codec registered under '{}'",
                                spec.name, encoding
                            ),
                        }
                    }
                } else {
                    match spec.causality.as_deref() {
                        Some("output") => {
                            index.scalar_output.insert(vref.to_string(), slot);
                        }
                        Some("input") => {
                            index.scalar_input.insert(vref.to_string(), slot);
                        }
                        _ => {}
                    }
                }
            }
        }

        debug!(
            "value-reference index: scalar input={} output={}, binary rx={} tx={}, codecs={}",
            index.scalar_input.len(),
            index.scalar_output.len(),
            index.binary_rx.len(),
            index.binary_tx.len(),
            index.codecs.len()
        );
        index
    }

    pub fn scalar(&self, vref: ValueRef, set: ScalarSet) -> Option<SlotRef> {
        let key = vref.to_string();
        match set {
            ScalarSet::Input => self.scalar_input.get(&key).copied(),
            ScalarSet::Output => self.scalar_output.get(&key).copied(),
        }
    }

    pub fn binary_rx(&self, vref: ValueRef) -> Option<SlotRef> {
        self.binary_rx.get(&vref.to_string()).copied()
    }

    pub fn binary_tx(&self, vref: ValueRef) -> Option<SlotRef> {
        self.binary_tx.get(&vref.to_string()).copied()
    }

    pub fn codec(&self, vref: ValueRef) -> Option<&Arc<dyn TextCodec>> {
        self.codecs.get(&vref.to_string())
    }

    pub fn scalar_input_count(&self) -> usize {
        self.scalar_input.len()
    }

    pub fn scalar_output_count(&self) -> usize {
        self.scalar_output.len()
    }

    pub fn binary_rx_count(&self) -> usize {
        self.binary_rx.len()
    }

    pub fn binary_tx_count(&self) -> usize {
        self.binary_tx.len()
    }
}
