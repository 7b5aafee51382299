use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use lnk_core::CodecError;
use serde_json::Value;
use std::io::{Read, Write};

/// Gzip compression level applied to encoded values.
const COMPRESSION_LEVEL: u32 = 8;

/// Converts structured values to and from the byte representation the
/// backends store.
///
/// Absence survives the round trip: `encode(None)` is `None` and
/// `decode(None)` is `None`, without ever turning into a decode error.
/// Encoding need not be byte-deterministic; decoding the same bytes
/// always yields the same value.
pub trait Codec: Send + Sync + 'static {
    fn encode(&self, value: Option<&Value>) -> Result<Option<Vec<u8>>, CodecError>;
    fn decode(&self, bytes: Option<&[u8]>) -> Result<Option<Value>, CodecError>;
}

/// The production codec: JSON encoding, then gzip at a fixed level.
///
/// A JSON null is collapsed into absence on both paths, so `None` is
/// the single representation of "no value" above the codec.
#[derive(Debug, Clone, Default)]
pub struct GzipJsonCodec;

impl GzipJsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for GzipJsonCodec {
    fn encode(&self, value: Option<&Value>) -> Result<Option<Vec<u8>>, CodecError> {
        let value = match value {
            None => return Ok(None),
            Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let json = serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
        encoder
            .write_all(&json)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        let bytes = encoder
            .finish()
            .map_err(|e| CodecError::Encode(e.to_string()))?;

        Ok(Some(bytes))
    }

    fn decode(&self, bytes: Option<&[u8]>) -> Result<Option<Value>, CodecError> {
        let Some(bytes) = bytes else {
            return Ok(None);
        };

        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        let value: Value =
            serde_json::from_slice(&json).map_err(|e| CodecError::Decode(e.to_string()))?;

        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip(value: Value) -> Option<Value> {
        let codec = GzipJsonCodec::new();
        let bytes = codec.encode(Some(&value)).unwrap();
        codec.decode(bytes.as_deref()).unwrap()
    }

    #[test]
    fn roundtrip_preserves_values() {
        for value in [
            json!("https://example.com"),
            json!({"title": "a page", "text": "body"}),
            json!([1, 2, 3]),
            json!(42),
            json!({"nested": {"deep": ["values", true]}}),
        ] {
            assert_eq!(roundtrip(value.clone()), Some(value));
        }
    }

    #[test]
    fn absence_passes_through() {
        let codec = GzipJsonCodec::new();
        assert_eq!(codec.encode(None).unwrap(), None);
        assert_eq!(codec.decode(None).unwrap(), None);
    }

    #[test]
    fn null_collapses_to_absence() {
        let codec = GzipJsonCodec::new();
        assert_eq!(codec.encode(Some(&Value::Null)).unwrap(), None);
        assert_eq!(roundtrip(Value::Null), None);
    }

    #[test]
    fn encoded_bytes_are_compressed() {
        let codec = GzipJsonCodec::new();
        let value = json!("x".repeat(4096));
        let bytes = codec.encode(Some(&value)).unwrap().unwrap();
        assert!(bytes.len() < 4096);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let codec = GzipJsonCodec::new();
        let err = codec.decode(Some(b"not gzip at all")).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
