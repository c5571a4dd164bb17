//! Binary wire format for field-tagged records.
//!
//! A record encodes as a `u16` field count followed by one entry per
//! field: `u16` tag, `u8` kind code, then a kind-determined payload.
//! All integers are little-endian.
//!
//! ```text
//! | count (2) | tag (2) | kind (1) | payload... | tag (2) | ...
//! ```
//!
//! Payloads per kind:
//!
//! - null: empty
//! - bool: 1 byte (zero = false)
//! - integer: 8 bytes (i64)
//! - text: u32 length + UTF-8 bytes
//! - map: u16 entry count, each entry two (u32 length + bytes) strings
//!
//! Every kind code is self-delimiting, which is what allows a decoder to
//! skip fields whose tag it does not know. Field order on the wire is not
//! significant.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Kind code for a null value.
pub const KIND_NULL: u8 = 0x00;
/// Kind code for a boolean.
pub const KIND_BOOL: u8 = 0x01;
/// Kind code for a signed integer.
pub const KIND_INTEGER: u8 = 0x02;
/// Kind code for a text string.
pub const KIND_TEXT: u8 = 0x03;
/// Kind code for a string map.
pub const KIND_MAP: u8 = 0x04;

/// Encode a list of `(tag, value)` fields to record bytes.
///
/// # Panics
///
/// Panics when the field list or a map value holds more than
/// `u16::MAX` entries; the wire counts cannot represent more, and a
/// truncated count would misalign every field that follows it.
#[must_use]
pub fn encode_fields(fields: &[(u16, Value)]) -> Vec<u8> {
    assert!(
        fields.len() <= usize::from(u16::MAX),
        "field count exceeds u16::MAX"
    );
    let mut buf = Vec::with_capacity(16 + fields.len() * 8);
    buf.extend_from_slice(&(fields.len() as u16).to_le_bytes());

    for (tag, value) in fields {
        buf.extend_from_slice(&tag.to_le_bytes());
        match value {
            Value::Null => buf.push(KIND_NULL),
            Value::Bool(b) => {
                buf.push(KIND_BOOL);
                buf.push(u8::from(*b));
            }
            Value::Integer(n) => {
                buf.push(KIND_INTEGER);
                buf.extend_from_slice(&n.to_le_bytes());
            }
            Value::Text(s) => {
                buf.push(KIND_TEXT);
                encode_str(&mut buf, s);
            }
            Value::Map(entries) => {
                assert!(
                    entries.len() <= usize::from(u16::MAX),
                    "map entry count exceeds u16::MAX"
                );
                buf.push(KIND_MAP);
                buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
                for (k, v) in entries {
                    encode_str(&mut buf, k);
                    encode_str(&mut buf, v);
                }
            }
        }
    }

    buf
}

/// Decode record bytes into `(tag, value)` fields in wire order.
///
/// # Errors
///
/// Fails on truncated data, an unknown kind code, or invalid UTF-8 in a
/// text payload. Unknown *tags* are not an error at this layer; tag
/// interpretation belongs to [`crate::Schema`].
pub fn decode_fields(bytes: &[u8]) -> CodecResult<Vec<(u16, Value)>> {
    let mut reader = Reader::new(bytes);
    let count = reader.read_u16()?;
    let mut fields = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let tag = reader.read_u16()?;
        let kind = reader.read_u8()?;
        let value = match kind {
            KIND_NULL => Value::Null,
            KIND_BOOL => Value::Bool(reader.read_u8()? != 0),
            KIND_INTEGER => Value::Integer(i64::from_le_bytes(reader.read_array()?)),
            KIND_TEXT => Value::Text(reader.read_str(tag)?),
            KIND_MAP => {
                let entry_count = reader.read_u16()?;
                let mut entries = Vec::with_capacity(entry_count as usize);
                for _ in 0..entry_count {
                    let k = reader.read_str(tag)?;
                    let v = reader.read_str(tag)?;
                    entries.push((k, v));
                }
                Value::map(entries)
            }
            code => return Err(CodecError::UnknownKindCode { code }),
        };
        fields.push((tag, value));
    }

    Ok(fields)
}

fn encode_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Cursor over record bytes with bounds-checked reads.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.offset.checked_add(len).ok_or(CodecError::UnexpectedEof {
            offset: self.offset,
        })?;
        if end > self.bytes.len() {
            return Err(CodecError::UnexpectedEof {
                offset: self.offset,
            });
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> CodecResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> CodecResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.take(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    fn read_str(&mut self, tag: u16) -> CodecResult<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record() {
        let bytes = encode_fields(&[]);
        assert_eq!(bytes, vec![0, 0]);
        assert!(decode_fields(&bytes).unwrap().is_empty());
    }

    #[test]
    fn null_field() {
        let fields = vec![(7u16, Value::Null)];
        let bytes = encode_fields(&fields);
        assert_eq!(bytes, vec![1, 0, 7, 0, KIND_NULL]);
        assert_eq!(decode_fields(&bytes).unwrap(), fields);
    }

    #[test]
    fn bool_field() {
        let fields = vec![(0u16, Value::Bool(true)), (1u16, Value::Bool(false))];
        let bytes = encode_fields(&fields);
        assert_eq!(decode_fields(&bytes).unwrap(), fields);
    }

    #[test]
    fn integer_field() {
        for n in [0i64, 1, -1, i64::MAX, i64::MIN, 1_700_000_000_000] {
            let fields = vec![(3u16, Value::Integer(n))];
            let bytes = encode_fields(&fields);
            assert_eq!(decode_fields(&bytes).unwrap(), fields);
        }
    }

    #[test]
    fn text_field() {
        let fields = vec![(2u16, Value::Text("http://r:7878".to_string()))];
        let bytes = encode_fields(&fields);
        assert_eq!(decode_fields(&bytes).unwrap(), fields);
    }

    #[test]
    fn empty_text_field() {
        let fields = vec![(2u16, Value::Text(String::new()))];
        let bytes = encode_fields(&fields);
        assert_eq!(decode_fields(&bytes).unwrap(), fields);
    }

    #[test]
    fn map_field() {
        let fields = vec![(
            5u16,
            Value::map(vec![
                ("X-Api-Key".to_string(), "abc".to_string()),
                ("Authorization".to_string(), "Basic 123".to_string()),
            ]),
        )];
        let bytes = encode_fields(&fields);
        assert_eq!(decode_fields(&bytes).unwrap(), fields);
    }

    #[test]
    fn multiple_fields_round_trip() {
        let fields = vec![
            (0u16, Value::Text("prod".to_string())),
            (10u16, Value::Bool(true)),
            (11u16, Value::Text("http://r:7878".to_string())),
            (12u16, Value::Text("abc".to_string())),
            (13u16, Value::map(vec![("a".to_string(), "b".to_string())])),
        ];
        let bytes = encode_fields(&fields);
        assert_eq!(decode_fields(&bytes).unwrap(), fields);
    }

    #[test]
    #[should_panic(expected = "map entry count exceeds u16::MAX")]
    fn oversized_map_is_rejected() {
        let entries: Vec<_> = (0..65_536u32)
            .map(|i| (i.to_string(), String::new()))
            .collect();
        encode_fields(&[(0u16, Value::Map(entries))]);
    }

    #[test]
    fn truncated_data_fails() {
        let fields = vec![(2u16, Value::Text("hello".to_string()))];
        let bytes = encode_fields(&fields);

        for len in 0..bytes.len() {
            let result = decode_fields(&bytes[..len]);
            assert!(result.is_err(), "truncation at {len} should fail");
        }
    }

    #[test]
    fn unknown_kind_code_fails() {
        // count=1, tag=0, kind=0x7f
        let bytes = vec![1, 0, 0, 0, 0x7f];
        let result = decode_fields(&bytes);
        assert!(matches!(
            result,
            Err(CodecError::UnknownKindCode { code: 0x7f })
        ));
    }

    #[test]
    fn invalid_utf8_fails() {
        // count=1, tag=9, kind=text, len=2, bytes=0xff 0xfe
        let mut bytes = vec![1, 0, 9, 0, KIND_TEXT];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let result = decode_fields(&bytes);
        assert!(matches!(result, Err(CodecError::InvalidUtf8 { tag: 9 })));
    }
}
