//! CBOR helpers over `ciborium::Value`.

use ciborium::value::{Integer, Value};
use thiserror::Error;

/// Tag 24: embedded CBOR data item (RFC 8949 §3.4.5.1).
pub const TAG_ENCODED_CBOR: u64 = 24;

/// Tag 18: COSE_Sign1 (RFC 9052).
pub const TAG_COSE_SIGN1: u64 = 18;

/// Tag 0: RFC 3339 date-time string.
pub const TAG_DATE_TIME: u64 = 0;

/// Low-level CBOR failure, mapped to a [`crate::RejectReason`] by callers.
#[derive(Error, Debug)]
pub enum CborError {
    /// Bytes are not a well-formed CBOR item.
    #[error("CBOR decode error: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    /// A value could not be encoded.
    #[error("CBOR encode error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    /// Input continues past the single expected item.
    #[error("{0} trailing bytes after CBOR item")]
    TrailingBytes(usize),

    /// Tag 24 wraps something other than a byte string.
    #[error("tag 24 does not wrap a byte string")]
    EncodedNotBytes,
}

/// Decode exactly one CBOR item; trailing bytes are an error.
pub fn decode(bytes: &[u8]) -> Result<Value, CborError> {
    let mut rest = bytes;
    let value = ciborium::de::from_reader(&mut rest)?;
    if !rest.is_empty() {
        return Err(CborError::TrailingBytes(rest.len()));
    }
    Ok(value)
}

pub fn encode(value: &Value) -> Result<Vec<u8>, CborError> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out)?;
    Ok(out)
}

/// Value under a text key.
pub fn get<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

/// Value under an integer key (COSE header labels).
pub fn get_label(map: &[(Value, Value)], label: i64) -> Option<&Value> {
    let label = Integer::from(label);
    map.iter()
        .find(|(k, _)| k.as_integer() == Some(label))
        .map(|(_, v)| v)
}

pub fn as_i64(value: &Value) -> Option<i64> {
    value.as_integer().and_then(|i| i64::try_from(i).ok())
}

pub fn as_u64(value: &Value) -> Option<u64> {
    value.as_integer().and_then(|i| u64::try_from(i).ok())
}

/// Strip one level of tag 24, decoding the embedded bytes. Untagged values
/// pass through unchanged.
pub fn unwrap_encoded(value: Value) -> Result<Value, CborError> {
    match value {
        Value::Tag(TAG_ENCODED_CBOR, inner) => match *inner {
            Value::Bytes(bytes) => decode(&bytes),
            _ => Err(CborError::EncodedNotBytes),
        },
        other => Ok(other),
    }
}

/// Wrap encoded bytes in tag 24 and encode the result.
pub fn encode_tagged(bytes: &[u8]) -> Result<Vec<u8>, CborError> {
    encode(&Value::Tag(TAG_ENCODED_CBOR, Box::new(Value::Bytes(bytes.to_vec()))))
}
