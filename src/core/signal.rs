use serde::{Deserialize, Serialize};

use crate::core::buffer::BinaryBuffer;
use crate::core::types::{MarshalKind, ValueRef, Variable};

/// Flat, engine-side signal storage: the "source" side of every marshal
/// group.
///
/// Scalar values and binary buffers live in parallel arrays indexed by one
/// global offset space shared across all marshal groups; each slot is used
/// by exactly one of the two arrays according to its kind. Scalar values
/// are stored as `f64` regardless of the group type; marshaling converts.
#[derive(Debug, Default)]
pub struct SourceVector {
    names: Vec<String>,
    kinds: Vec<MarshalKind>,
    pub scalar: Vec<f64>,
    pub binary: Vec<BinaryBuffer>,
}

impl SourceVector {
    /// Allocate storage sized to a classified signal list, one slot per
    /// signal in classified order. Zero signals yields zero-length storage.
    pub fn allocate(signals: &[Variable]) -> Self {
        let count = signals.len();
        Self {
            names: signals.iter().map(|s| s.name.clone()).collect(),
            kinds: signals.iter().map(|s| s.kind).collect(),
            scalar: vec![0.0; count],
            binary: vec![BinaryBuffer::new(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn signal_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|n| n.as_str())
    }

    pub fn kind_of(&self, index: usize) -> Option<MarshalKind> {
        self.kinds.get(index).copied()
    }

    /// Truncate all binary slots whose per-step reset is still pending.
    /// Called by the adapter shim before the first append of each step.
    pub fn reset_binary(&mut self) {
        for (kind, buf) in self.kinds.iter().zip(self.binary.iter_mut()) {
            if *kind == MarshalKind::Binary {
                buf.reset();
            }
        }
    }

    /// Re-arm the per-slot reset gates after a step completes.
    pub fn clear_reset_flags(&mut self) {
        for buf in self.binary.iter_mut() {
            buf.clear_reset_flag();
        }
    }
}

/// Per-signal annotations consumed by the value-reference index.
///
/// `bus_rx_vrefs`/`bus_tx_vrefs` list the external value references that
/// alias this signal in a bus topology; `encoding_vrefs` lists the value
/// references whose payloads use the named text encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub name: String,
    #[serde(default)]
    pub vref: Option<ValueRef>,
    #[serde(default)]
    pub causality: Option<String>,
    #[serde(default)]
    pub bus_rx_vrefs: Vec<ValueRef>,
    #[serde(default)]
    pub bus_tx_vrefs: Vec<ValueRef>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub encoding_vrefs: Vec<ValueRef>,
}

impl SignalSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_vref(mut self, vref: ValueRef) -> Self {
        self.vref = Some(vref);
        self
    }

    pub fn with_causality(mut self, causality: impl Into<String>) -> Self {
        self.causality = Some(causality.into());
        self
    }

    pub fn with_bus_topology(mut self, rx: Vec<ValueRef>, tx: Vec<ValueRef>) -> Self {
        self.bus_rx_vrefs = rx;
        self.bus_tx_vrefs = tx;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>, vrefs: Vec<ValueRef>) -> Self {
        self.encoding = Some(encoding.into());
        self.encoding_vrefs = vrefs;
        self
    }
}

/// Runtime-side named signal vector, holding either scalar values or binary
/// buffers for a set of signals delivered over the simulation bus.
#[derive(Debug, Default)]
pub struct SignalVector {
    pub name: String,
    pub is_binary: bool,
    specs: Vec<SignalSpec>,
    pub scalar: Vec<f64>,
    pub binary: Vec<BinaryBuffer>,
}

impl SignalVector {
    pub fn scalar(name: impl Into<String>, specs: Vec<SignalSpec>) -> Self {
        let count = specs.len();
        Self {
            name: name.into(),
            is_binary: false,
            specs,
            scalar: vec![0.0; count],
            binary: Vec::new(),
        }
    }

    pub fn binary(name: impl Into<String>, specs: Vec<SignalSpec>) -> Self {
        let count = specs.len();
        Self {
            name: name.into(),
            is_binary: true,
            specs,
            scalar: Vec::new(),
            binary: vec![BinaryBuffer::new(); count],
        }
    }

    pub fn count(&self) -> usize {
        self.specs.len()
    }

    pub fn specs(&self) -> &[SignalSpec] {
        &self.specs
    }

    pub fn spec(&self, index: usize) -> Option<&SignalSpec> {
        self.specs.get(index)
    }

    pub fn reset_binary(&mut self) {
        for buf in self.binary.iter_mut() {
            buf.reset();
        }
    }

    pub fn clear_reset_flags(&mut self) {
        for buf in self.binary.iter_mut() {
            buf.clear_reset_flag();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::classify;
    use crate::core::types::VariableDecl;

    #[test]
    fn test_allocate_source() {
        let decls = vec![
            VariableDecl::new("foo", 0, "Real"),
            VariableDecl::new("bar", 1, "Integer"),
            VariableDecl::new("payload", 2, "String").with_causality("output"),
        ];
        let signals = classify(&decls);
        let source = SourceVector::allocate(&signals);
        assert_eq!(source.len(), 3);
        assert_eq!(source.scalar.len(), 3);
        assert_eq!(source.binary.len(), 3);
        assert_eq!(source.kind_of(0), Some(MarshalKind::Primitive));
        assert_eq!(source.kind_of(2), Some(MarshalKind::Binary));
        assert_eq!(source.signal_name(2), Some("payload"));
    }

    #[test]
    fn test_empty_source() {
        let source = SourceVector::allocate(&[]);
        assert!(source.is_empty());
        assert_eq!(source.scalar.len(), 0);
    }

    #[test]
    fn test_source_reset_gate() {
        let decls = vec![VariableDecl::new("payload", 2, "String").with_causality("output")];
        let signals = classify(&decls);
        let mut source = SourceVector::allocate(&signals);

        source.reset_binary();
        source.binary[0].append(b"one").unwrap();
        source.binary[0].append(b"two").unwrap();
        assert_eq!(source.binary[0].as_bytes(), b"onetwo");

        // A second reset within the same step must not truncate.
        source.reset_binary();
        assert_eq!(source.binary[0].as_bytes(), b"onetwo");

        source.clear_reset_flags();
        source.reset_binary();
        assert!(source.binary[0].is_empty());
    }
}
