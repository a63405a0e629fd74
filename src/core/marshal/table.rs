use log::{debug, warn};

use crate::core::codec::CodecRegistry;
use crate::core::errors::MarshalResult;
use crate::core::marshal::group::MarshalGroup;
use crate::core::signal::SourceVector;
use crate::core::types::{MarshalDir, MarshalKind, MarshalType, ValueRef, Variable};

/// Ordered list of marshal groups covering a classified signal list.
#[derive(Default)]
pub struct MarshalTable {
    groups: Vec<MarshalGroup>,
}

impl MarshalTable {
    /// Walk a classified signal list once and emit a marshal group for each
    /// maximal run of identical (kind, direction, type).
    ///
    /// The source offset accumulates strictly by group count in emission
    /// order; it is unrelated to the value references. An empty signal list
    /// produces an empty table.
    pub fn generate(signals: &[Variable]) -> MarshalResult<Self> {
        let mut groups = Vec::new();
        let mut key: Option<(MarshalKind, MarshalDir, MarshalType)> = None;
        let mut run: Vec<ValueRef> = Vec::new();
        let mut offset = 0usize;

        for signal in signals {
            let signal_key = (signal.kind, signal.dir, signal.ty);
            if key != Some(signal_key) {
                if let Some((kind, dir, ty)) = key {
                    let count = run.len();
                    groups.push(MarshalGroup::new(
                        kind,
                        dir,
                        ty,
                        offset,
                        std::mem::take(&mut run),
                    )?);
                    offset += count;
                }
                key = Some(signal_key);
            }
            run.push(signal.vref);
        }
        if let Some((kind, dir, ty)) = key {
            if !run.is_empty() {
                groups.push(MarshalGroup::new(kind, dir, ty, offset, run)?);
            }
        }

        debug!(
            "marshal table generated: {} groups over {} signals",
            groups.len(),
            signals.len()
        );
        Ok(Self { groups })
    }

    /// Install codec handles on binary group slots whose variable carries a
    /// text-encoding annotation. Slots without a resolvable codec stay raw
    /// pass-through.
    ///
    /// `signals` must be the same classified list the table was generated
    /// from; each group's slots line up with the signals at
    /// `source_offset..source_offset + count`.
    pub fn install_codecs(&mut self, signals: &[Variable], registry: &CodecRegistry) {
        for group in &mut self.groups {
            if group.kind != MarshalKind::Binary {
                continue;
            }
            for slot in 0..group.count() {
                let variable = &signals[group.source_offset + slot];
                let Some(encoding) = &variable.encoding else {
                    continue;
                };
                match registry.lookup(encoding) {
                    Some(codec) => {
                        debug!(
                            "signal '{}': codec '{}' installed on group '{}' slot {}",
                            variable.name, encoding, group.name, slot
                        );
                        group.install_codec(slot, codec);
                    }
                    None => warn!(
                        "signal '{}': no codec registered under '{}', payload stays raw",
                        variable.name, encoding
                    ),
                }
            }
        }
    }

    pub fn groups(&self) -> &[MarshalGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [MarshalGroup] {
        &mut self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Signal-to-target pass over every group with an outbound direction.
    /// A failing group aborts the remainder of the pass; groups already
    /// marshaled keep their values.
    pub fn marshal_out(&mut self, source: &SourceVector) -> MarshalResult<()> {
        for group in &mut self.groups {
            group.marshal_out(source)?;
        }
        Ok(())
    }

    /// Target-to-signal pass over every group with an inbound direction.
    pub fn marshal_in(&self, source: &mut SourceVector) -> MarshalResult<()> {
        for group in &self.groups {
            group.marshal_in(source)?;
        }
        Ok(())
    }
}
