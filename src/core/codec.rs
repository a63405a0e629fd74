use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::core::errors::{MarshalError, MarshalResult};

/// Reversible binary-to-text transform applied to binary signal payloads.
///
/// Implementations must be round-trip exact (`decode(encode(b)) == b` for
/// all byte strings `b`) and must produce text free of control characters
/// and NUL, so encoded payloads are safe to embed in a string-typed
/// transport.
pub trait TextCodec: Send + Sync {
    fn name(&self) -> &'static str;
    fn encode(&self, data: &[u8]) -> Vec<u8>;
    fn decode(&self, text: &[u8]) -> MarshalResult<Vec<u8>>;
}

/// Named codec registry. Codecs are looked up by the encoding annotation of
/// a variable; an entry provides both directions by construction.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn TextCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the codecs this crate ships (`ascii85`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Ascii85));
        registry
    }

    pub fn register(&mut self, codec: Arc<dyn TextCodec>) {
        debug!("registering codec '{}'", codec.name());
        self.codecs.insert(codec.name().to_string(), codec);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn TextCodec>> {
        self.codecs.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

/// Radix-85 text encoding.
///
/// Each 4-byte group maps to five characters from the alphabet `!`..`u`
/// (0x21..=0x75); an interior all-zero group shortens to `z`. A final
/// partial group of N bytes encodes as N+1 characters: the group is
/// zero-padded before encoding and the surplus characters are dropped.
/// Decoding pads a partial group with `u` and truncates the surplus bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ascii85;

const A85_LOW: u8 = 33; // '!'
const A85_HIGH: u8 = 117; // 'u'

impl Ascii85 {
    fn decode_error(reason: impl Into<String>) -> MarshalError {
        MarshalError::Decode {
            codec: "ascii85".to_string(),
            reason: reason.into(),
        }
    }
}

impl TextCodec for Ascii85 {
    fn name(&self) -> &'static str {
        "ascii85"
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity((data.len() + 3) / 4 * 5);
        for (i, chunk) in data.chunks(4).enumerate() {
            let mut x: u32 = 0;
            for (j, &b) in chunk.iter().enumerate() {
                x |= (b as u32) << ((3 - j) * 8);
            }
            let remaining = data.len() - (i * 4 + chunk.len());
            if x == 0 && chunk.len() == 4 && remaining >= 4 {
                out.push(b'z');
                continue;
            }
            let mut group = [0u8; 5];
            let mut v = x;
            for slot in (0..5).rev() {
                group[slot] = (v % 85) as u8 + A85_LOW;
                v /= 85;
            }
            out.extend_from_slice(&group[..chunk.len() + 1]);
        }
        out
    }

    fn decode(&self, text: &[u8]) -> MarshalResult<Vec<u8>> {
        let mut out = Vec::with_capacity((text.len() + 4) / 5 * 4);
        let mut group = [0u8; 5];
        let mut fill = 0usize;

        for &c in text {
            if c == b'z' {
                if fill != 0 {
                    return Err(Self::decode_error("'z' inside a five-character group"));
                }
                out.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            if !(A85_LOW..=A85_HIGH).contains(&c) {
                return Err(Self::decode_error(format!(
                    "byte 0x{c:02x} outside the ascii85 alphabet"
                )));
            }
            group[fill] = c;
            fill += 1;
            if fill == 5 {
                decode_group(&group, 4, &mut out)?;
                fill = 0;
            }
        }

        if fill == 1 {
            return Err(Self::decode_error(
                "a trailing group of one character is not decodable",
            ));
        }
        if fill > 1 {
            let padding = 5 - fill;
            for slot in fill..5 {
                group[slot] = A85_HIGH;
            }
            decode_group(&group, 4 - padding, &mut out)?;
        }
        Ok(out)
    }
}

fn decode_group(group: &[u8; 5], keep: usize, out: &mut Vec<u8>) -> MarshalResult<()> {
    let mut x: u64 = 0;
    for &c in group {
        x = x * 85 + (c - A85_LOW) as u64;
    }
    if x > u32::MAX as u64 {
        return Err(Ascii85::decode_error("group value exceeds 32 bits"));
    }
    let bytes = (x as u32).to_be_bytes();
    out.extend_from_slice(&bytes[..keep]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_lengths() {
        let codec = Ascii85;
        for len in 0..=256usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 7 + 13) as u8).collect();
            let encoded = codec.encode(&data);
            let decoded = codec.decode(&encoded).unwrap();
            assert_eq!(decoded, data, "round trip failed for length {len}");
        }
    }

    #[test]
    fn test_round_trip_zero_runs() {
        let codec = Ascii85;
        for len in 0..=64usize {
            let data = vec![0u8; len];
            let decoded = codec.decode(&codec.encode(&data)).unwrap();
            assert_eq!(decoded, data, "zero-run round trip failed for length {len}");
        }
    }

    #[test]
    fn test_interior_zero_group_shortens() {
        let codec = Ascii85;
        let data = [0, 0, 0, 0, 1, 2, 3, 4];
        let encoded = codec.encode(&data);
        assert_eq!(encoded[0], b'z');
        assert_eq!(codec.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_encoded_text_is_transport_safe() {
        let codec = Ascii85;
        let data: Vec<u8> = (0..=255u8).collect();
        let encoded = codec.encode(&data);
        assert!(encoded
            .iter()
            .all(|&c| !c.is_ascii_control() && c != 0));
    }

    #[test]
    fn test_known_vector() {
        // Four zero bytes at the end of input must not shorten to 'z'.
        let codec = Ascii85;
        assert_eq!(codec.encode(&[0, 0, 0, 0]), b"!!!!!");
        assert_eq!(codec.decode(b"!!!!!").unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_malformed_input_is_a_typed_error() {
        let codec = Ascii85;
        assert!(matches!(
            codec.decode(&[0x00, 0x01]),
            Err(MarshalError::Decode { .. })
        ));
        assert!(matches!(
            codec.decode(b"abcz"),
            Err(MarshalError::Decode { .. })
        ));
        assert!(matches!(
            codec.decode(b"!"),
            Err(MarshalError::Decode { .. })
        ));
        // Five 'u' characters exceed the 32-bit group range.
        assert!(matches!(
            codec.decode(b"uuuuu"),
            Err(MarshalError::Decode { .. })
        ));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = CodecRegistry::with_defaults();
        assert!(registry.lookup("ascii85").is_some());
        assert!(registry.lookup("base64").is_none());
        assert_eq!(registry.len(), 1);
    }
}
