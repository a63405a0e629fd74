use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::core::codec::TextCodec;
use crate::core::errors::{MarshalError, MarshalResult};
use crate::core::signal::SourceVector;
use crate::core::types::{MarshalDir, MarshalKind, MarshalType, ValueRef};

/// Typed target storage of one marshal group.
///
/// The copy routine is selected once per group by matching this enum, never
/// per element; each variant holds a flat `count`-long slice of the group's
/// homogeneous type.
pub enum TargetStorage {
    Double(Vec<f64>),
    Int32(Vec<i32>),
    Bool(Vec<bool>),
    Binary(Vec<Option<Vec<u8>>>),
}

impl TargetStorage {
    fn for_group(
        name: &str,
        kind: MarshalKind,
        ty: MarshalType,
        count: usize,
    ) -> MarshalResult<Self> {
        match (kind, ty) {
            (MarshalKind::Primitive, MarshalType::Double) => Ok(Self::Double(vec![0.0; count])),
            (MarshalKind::Primitive, MarshalType::Int32) => Ok(Self::Int32(vec![0; count])),
            (MarshalKind::Primitive, MarshalType::Bool) => Ok(Self::Bool(vec![false; count])),
            (MarshalKind::Binary, MarshalType::String) => Ok(Self::Binary(vec![None; count])),
            _ => Err(MarshalError::Config {
                name: name.to_string(),
                reason: format!("kind '{kind}' does not admit type '{ty}'"),
            }),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Double(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Binary(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_double(&self) -> Option<&[f64]> {
        match self {
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int32(&self) -> Option<&[i32]> {
        match self {
            Self::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int32_mut(&mut self) -> Option<&mut [i32]> {
        match self {
            Self::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool_mut(&mut self) -> Option<&mut [bool]> {
        match self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[Option<Vec<u8>>]> {
        match self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary_mut(&mut self) -> Option<&mut [Option<Vec<u8>>]> {
        match self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }
}

/// A maximal run of variables sharing one (kind, direction, type) key,
/// with an exclusively owned target storage block.
///
/// Shape is fixed at build time; only values change afterwards.
pub struct MarshalGroup {
    pub name: String,
    pub kind: MarshalKind,
    pub dir: MarshalDir,
    pub ty: MarshalType,
    pub source_offset: usize,
    vrefs: Vec<ValueRef>,
    pub target: TargetStorage,
    codecs: Vec<Option<Arc<dyn TextCodec>>>,
}

impl MarshalGroup {
    pub(crate) fn new(
        kind: MarshalKind,
        dir: MarshalDir,
        ty: MarshalType,
        source_offset: usize,
        vrefs: Vec<ValueRef>,
    ) -> MarshalResult<Self> {
        let name = format!("mg-{kind}-{dir}-{ty}");
        let count = vrefs.len();
        let target = TargetStorage::for_group(&name, kind, ty, count)?;
        let codecs = if kind == MarshalKind::Binary {
            vec![None; count]
        } else {
            Vec::new()
        };
        Ok(Self {
            name,
            kind,
            dir,
            ty,
            source_offset,
            vrefs,
            target,
            codecs,
        })
    }

    pub fn count(&self) -> usize {
        self.vrefs.len()
    }

    pub fn vrefs(&self) -> &[ValueRef] {
        &self.vrefs
    }

    pub fn codec(&self, slot: usize) -> Option<&Arc<dyn TextCodec>> {
        self.codecs.get(slot).and_then(|c| c.as_ref())
    }

    pub(crate) fn install_codec(&mut self, slot: usize, codec: Arc<dyn TextCodec>) {
        self.codecs[slot] = Some(codec);
    }

    /// Copy source signals into the target block (signal storage to
    /// component side). Only groups whose direction permits the component
    /// to read the value are touched; for all others this is a no-op by
    /// construction, never a silent partial copy.
    pub fn marshal_out(&mut self, source: &SourceVector) -> MarshalResult<()> {
        if !self.dir.marshals_out() {
            return Ok(());
        }
        let offset = self.source_offset;
        match &mut self.target {
            TargetStorage::Double(target) => {
                let len = target.len();
                target.copy_from_slice(&source.scalar[offset..offset + len]);
            }
            TargetStorage::Int32(target) => {
                for (i, value) in target.iter_mut().enumerate() {
                    *value = source.scalar[offset + i] as i32;
                }
            }
            TargetStorage::Bool(target) => {
                for (i, value) in target.iter_mut().enumerate() {
                    *value = source.scalar[offset + i] != 0.0;
                }
            }
            TargetStorage::Binary(target) => {
                for (i, slot) in target.iter_mut().enumerate() {
                    let buf = &source.binary[offset + i];
                    if buf.is_empty() {
                        *slot = None;
                        continue;
                    }
                    // The codec produces a new buffer; the source bytes are
                    // never mutated.
                    *slot = Some(match &self.codecs[i] {
                        Some(codec) => codec.encode(buf.as_bytes()),
                        None => buf.as_bytes().to_vec(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Copy the target block back into source signals (component side to
    /// signal storage). Only groups whose direction permits the component
    /// to write the value are touched. Binary payloads are decoded when a
    /// codec is installed and appended to the source buffer; binary signals
    /// accumulate across multiple marshal events within one step.
    pub fn marshal_in(&self, source: &mut SourceVector) -> MarshalResult<()> {
        if !self.dir.marshals_in() {
            return Ok(());
        }
        let offset = self.source_offset;
        match &self.target {
            TargetStorage::Double(target) => {
                source.scalar[offset..offset + target.len()].copy_from_slice(target);
            }
            TargetStorage::Int32(target) => {
                for (i, value) in target.iter().enumerate() {
                    source.scalar[offset + i] = *value as f64;
                }
            }
            TargetStorage::Bool(target) => {
                for (i, value) in target.iter().enumerate() {
                    source.scalar[offset + i] = if *value { 1.0 } else { 0.0 };
                }
            }
            TargetStorage::Binary(target) => {
                for (i, slot) in target.iter().enumerate() {
                    let Some(payload) = slot else { continue };
                    let bytes: Cow<'_, [u8]> = match &self.codecs[i] {
                        Some(codec) => Cow::Owned(codec.decode(payload)?),
                        None => Cow::Borrowed(payload.as_slice()),
                    };
                    source.binary[offset + i].append(&bytes)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MarshalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarshalGroup")
            .field("name", &self.name)
            .field("count", &self.count())
            .field("source_offset", &self.source_offset)
            .finish()
    }
}
