//! Contract-call argument values
//!
//! Arguments arrive as loosely-typed `{type, val}` tagged unions and are
//! converted into a closed variant enum at construction time. Unknown tags
//! are rejected immediately, never deferred to encode time. Tuple members
//! keep their insertion order: the order is part of the signing hash.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::wire::{Reader, Writer, WireError};

const TAG_UINT128: u8 = 0x00;
const TAG_INT128: u8 = 0x01;
const TAG_PRINCIPAL: u8 = 0x02;
const TAG_BUFFER: u8 = 0x03;
const TAG_TUPLE: u8 = 0x04;

/// Errors raised while constructing or validating argument values
#[derive(Error, Debug)]
pub enum ArgError {
    #[error("{0} is not a supported argument type")]
    UnsupportedType(String),
    #[error("Invalid argument value: {0}")]
    InvalidValue(String),
}

/// The closed set of argument kinds a function schema may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgKind {
    UInt128,
    Int128,
    Principal,
    Buffer,
    Tuple,
}

impl ArgKind {
    /// Parse the external tag used in `{type, val}` argument specs
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "uint128" => Some(Self::UInt128),
            "int128" => Some(Self::Int128),
            "principal" => Some(Self::Principal),
            "buffer" => Some(Self::Buffer),
            "tuple" => Some(Self::Tuple),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::UInt128 => "uint128",
            Self::Int128 => "int128",
            Self::Principal => "principal",
            Self::Buffer => "buffer",
            Self::Tuple => "tuple",
        }
    }
}

/// A typed contract-call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    UInt128(u128),
    Int128(i128),
    Principal(String),
    Buffer(Vec<u8>),
    /// Ordered named members; serialization order is insertion order
    Tuple(Vec<(String, ArgValue)>),
}

impl ArgValue {
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::UInt128(_) => ArgKind::UInt128,
            Self::Int128(_) => ArgKind::Int128,
            Self::Principal(_) => ArgKind::Principal,
            Self::Buffer(_) => ArgKind::Buffer,
            Self::Tuple(_) => ArgKind::Tuple,
        }
    }

    /// Build an argument from a `{type, val}` JSON spec
    ///
    /// Tuple members are `{key, type, val}` objects inside a `val` array.
    /// Integer values may be JSON numbers or decimal strings; buffers are
    /// hex strings.
    pub fn from_json(spec: &Value) -> Result<Self, ArgError> {
        let tag = spec
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ArgError::InvalidValue("missing type tag".to_string()))?;
        let kind =
            ArgKind::from_tag(tag).ok_or_else(|| ArgError::UnsupportedType(tag.to_string()))?;
        let val = spec
            .get("val")
            .ok_or_else(|| ArgError::InvalidValue("missing val".to_string()))?;

        let arg = match kind {
            ArgKind::UInt128 => Self::UInt128(json_u128(val)?),
            ArgKind::Int128 => Self::Int128(json_i128(val)?),
            ArgKind::Principal => Self::Principal(
                val.as_str()
                    .ok_or_else(|| ArgError::InvalidValue("principal must be a string".to_string()))?
                    .to_string(),
            ),
            ArgKind::Buffer => {
                let hex_str = val
                    .as_str()
                    .ok_or_else(|| ArgError::InvalidValue("buffer must be a hex string".to_string()))?;
                Self::Buffer(hex::decode(hex_str).map_err(|_| {
                    ArgError::InvalidValue("buffer must be a hex string".to_string())
                })?)
            }
            ArgKind::Tuple => {
                let members = val
                    .as_array()
                    .ok_or_else(|| ArgError::InvalidValue("tuple val must be an array".to_string()))?;
                let mut entries = Vec::with_capacity(members.len());
                for member in members {
                    let key = member
                        .get("key")
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            ArgError::InvalidValue("tuple member missing key".to_string())
                        })?;
                    entries.push((key.to_string(), Self::from_json(member)?));
                }
                Self::Tuple(entries)
            }
        };
        arg.validate()?;
        Ok(arg)
    }

    /// Enforce the length bounds the wire format can carry
    ///
    /// Called at setter time so encoding stays infallible.
    pub fn validate(&self) -> Result<(), ArgError> {
        match self {
            Self::UInt128(_) | Self::Int128(_) => Ok(()),
            Self::Principal(p) => {
                if p.is_empty() || p.len() > u8::MAX as usize {
                    return Err(ArgError::InvalidValue(format!(
                        "principal length {} out of range",
                        p.len()
                    )));
                }
                Ok(())
            }
            Self::Buffer(bytes) => {
                if bytes.len() > u32::MAX as usize {
                    return Err(ArgError::InvalidValue("buffer too large".to_string()));
                }
                Ok(())
            }
            Self::Tuple(members) => {
                if members.len() > u8::MAX as usize {
                    return Err(ArgError::InvalidValue("too many tuple members".to_string()));
                }
                for (key, value) in members {
                    if key.is_empty() || key.len() > u8::MAX as usize {
                        return Err(ArgError::InvalidValue(format!(
                            "tuple key length {} out of range",
                            key.len()
                        )));
                    }
                    value.validate()?;
                }
                Ok(())
            }
        }
    }

    /// Canonical wire encoding: tag byte + payload
    pub fn encode(&self, w: &mut Writer) {
        match self {
            Self::UInt128(value) => {
                w.put_u8(TAG_UINT128);
                w.put_u128_be(*value);
            }
            Self::Int128(value) => {
                w.put_u8(TAG_INT128);
                w.put_bytes(&value.to_be_bytes());
            }
            Self::Principal(principal) => {
                w.put_u8(TAG_PRINCIPAL);
                w.put_short_string(principal);
            }
            Self::Buffer(bytes) => {
                w.put_u8(TAG_BUFFER);
                w.put_u32_be(bytes.len() as u32);
                w.put_bytes(bytes);
            }
            Self::Tuple(members) => {
                w.put_u8(TAG_TUPLE);
                w.put_u8(members.len() as u8);
                for (key, value) in members {
                    w.put_short_string(key);
                    value.encode(w);
                }
            }
        }
    }

    pub fn decode(r: &mut Reader) -> Result<Self, WireError> {
        match r.read_u8()? {
            TAG_UINT128 => Ok(Self::UInt128(r.read_u128_be()?)),
            TAG_INT128 => {
                let bytes = r.read_bytes(16)?;
                Ok(Self::Int128(i128::from_be_bytes(
                    bytes.try_into().map_err(|_| WireError::UnexpectedEof)?,
                )))
            }
            TAG_PRINCIPAL => Ok(Self::Principal(r.read_short_string()?)),
            TAG_BUFFER => {
                let len = r.read_u32_be()? as usize;
                Ok(Self::Buffer(r.read_bytes(len)?.to_vec()))
            }
            TAG_TUPLE => {
                let count = r.read_u8()? as usize;
                let mut members = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = r.read_short_string()?;
                    members.push((key, Self::decode(r)?));
                }
                Ok(Self::Tuple(members))
            }
            unknown => Err(WireError::Invalid(format!(
                "unknown argument tag {unknown:#04x}"
            ))),
        }
    }

    /// JSON projection used by `Transaction::to_json`
    pub fn to_json(&self) -> Value {
        match self {
            Self::UInt128(value) => serde_json::json!({
                "type": "uint128", "val": value.to_string()
            }),
            Self::Int128(value) => serde_json::json!({
                "type": "int128", "val": value.to_string()
            }),
            Self::Principal(principal) => serde_json::json!({
                "type": "principal", "val": principal
            }),
            Self::Buffer(bytes) => serde_json::json!({
                "type": "buffer", "val": hex::encode(bytes)
            }),
            Self::Tuple(members) => {
                let vals: Vec<Value> = members
                    .iter()
                    .map(|(key, value)| {
                        let mut obj = value.to_json();
                        if let Some(map) = obj.as_object_mut() {
                            map.insert("key".to_string(), Value::from(key.clone()));
                        }
                        obj
                    })
                    .collect();
                serde_json::json!({ "type": "tuple", "val": vals })
            }
        }
    }
}

fn json_u128(val: &Value) -> Result<u128, ArgError> {
    match val {
        Value::String(s) => s
            .parse::<u128>()
            .map_err(|_| ArgError::InvalidValue(format!("not a uint128: {s}"))),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| ArgError::InvalidValue(format!("not a uint128: {n}"))),
        other => Err(ArgError::InvalidValue(format!("not a uint128: {other}"))),
    }
}

fn json_i128(val: &Value) -> Result<i128, ArgError> {
    match val {
        Value::String(s) => s
            .parse::<i128>()
            .map_err(|_| ArgError::InvalidValue(format!("not an int128: {s}"))),
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .ok_or_else(|| ArgError::InvalidValue(format!("not an int128: {n}"))),
        other => Err(ArgError::InvalidValue(format!("not an int128: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_closed_set() {
        let arg = ArgValue::from_json(&json!({ "type": "uint128", "val": "400000000" })).unwrap();
        assert_eq!(arg, ArgValue::UInt128(400_000_000));

        let err = ArgValue::from_json(&json!({ "type": "uint256", "val": "1" })).unwrap_err();
        assert!(matches!(err, ArgError::UnsupportedType(tag) if tag == "uint256"));
    }

    #[test]
    fn test_tuple_preserves_insertion_order() {
        let arg = ArgValue::from_json(&json!({
            "type": "tuple",
            "val": [
                { "key": "hashbytes", "type": "buffer", "val": hex::encode(b"some-hash") },
                { "key": "version", "type": "buffer", "val": "01" },
            ]
        }))
        .unwrap();
        match &arg {
            ArgValue::Tuple(members) => {
                assert_eq!(members[0].0, "hashbytes");
                assert_eq!(members[1].0, "version");
            }
            other => panic!("expected tuple, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let arg = ArgValue::Tuple(vec![
            ("amount".to_string(), ArgValue::UInt128(123)),
            ("delta".to_string(), ArgValue::Int128(-45)),
            (
                "who".to_string(),
                ArgValue::Principal("SP000000000000000000002Q6VF78".to_string()),
            ),
            ("blob".to_string(), ArgValue::Buffer(vec![0xde, 0xad])),
        ]);
        let mut w = Writer::new();
        arg.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(ArgValue::decode(&mut r).unwrap(), arg);
        r.expect_end().unwrap();
    }

    #[test]
    fn test_negative_int128_round_trip() {
        let arg = ArgValue::Int128(-1);
        let mut w = Writer::new();
        arg.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(ArgValue::decode(&mut r).unwrap(), arg);
    }

    #[test]
    fn test_validate_rejects_oversized_principal() {
        let arg = ArgValue::Principal("S".repeat(300));
        assert!(arg.validate().is_err());
    }

    #[test]
    fn test_unknown_wire_tag_rejected() {
        let mut r = Reader::new(&[0x09]);
        assert!(ArgValue::decode(&mut r).is_err());
    }
}
