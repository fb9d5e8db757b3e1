//! JSON-Cadence values.
//!
//! Every argument sent to and every result returned from the network travels
//! as JSON-Cadence: `{"type": "<Type>", "value": <payload>}`. Integers are
//! carried as strings, dictionaries as key/value pair lists, composites as an
//! id plus an ordered field list.

use serde_json::{json, Map, Value};

use super::{CadenceError, UFix64};
use crate::identity::FlowAddress;

/// Which composite flavour a [`CadenceValue::Composite`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    Struct,
    Resource,
    Event,
    Contract,
    Enum,
}

impl CompositeKind {
    fn type_name(&self) -> &'static str {
        match self {
            CompositeKind::Struct => "Struct",
            CompositeKind::Resource => "Resource",
            CompositeKind::Event => "Event",
            CompositeKind::Contract => "Contract",
            CompositeKind::Enum => "Enum",
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Struct" => Some(CompositeKind::Struct),
            "Resource" => Some(CompositeKind::Resource),
            "Event" => Some(CompositeKind::Event),
            "Contract" => Some(CompositeKind::Contract),
            "Enum" => Some(CompositeKind::Enum),
            _ => None,
        }
    }
}

/// Numeric Cadence types the simulator never builds itself but may read back
/// from a script. Kept as text so no precision is lost.
const PASSTHROUGH_NUMBERS: &[&str] = &[
    "Int", "Int8", "Int16", "Int32", "Int64", "Int128", "Int256", "UInt", "UInt16", "UInt256",
    "Word8", "Word16", "Word32", "Word64", "Fix64",
];

/// A Cadence value in the subset this simulator exchanges with the network.
#[derive(Debug, Clone, PartialEq)]
pub enum CadenceValue {
    Void,
    Bool(bool),
    String(String),
    Address(FlowAddress),
    UInt8(u8),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    UFix64(UFix64),
    /// Any other numeric type, tagged with its Cadence type name.
    Number { ty: String, value: String },
    Optional(Option<Box<CadenceValue>>),
    Array(Vec<CadenceValue>),
    Dictionary(Vec<(CadenceValue, CadenceValue)>),
    Composite {
        kind: CompositeKind,
        id: String,
        fields: Vec<(String, CadenceValue)>,
    },
}

impl CadenceValue {
    /// A `[UInt8]` array holding `bytes`.
    pub fn byte_array(bytes: &[u8]) -> Self {
        CadenceValue::Array(bytes.iter().copied().map(CadenceValue::UInt8).collect())
    }

    /// A struct value with the given fully-qualified type id.
    pub fn structure(id: impl Into<String>, fields: Vec<(String, CadenceValue)>) -> Self {
        CadenceValue::Composite {
            kind: CompositeKind::Struct,
            id: id.into(),
            fields,
        }
    }

    /// Look up a composite field by name.
    pub fn field(&self, name: &str) -> Option<&CadenceValue> {
        match self {
            CadenceValue::Composite { fields, .. } => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            CadenceValue::Optional(Some(inner)) => inner.field(name),
            _ => None,
        }
    }

    /// Unsigned integer view of any unsigned integer value.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            CadenceValue::UInt8(v) => Some(u128::from(*v)),
            CadenceValue::UInt32(v) => Some(u128::from(*v)),
            CadenceValue::UInt64(v) => Some(u128::from(*v)),
            CadenceValue::UInt128(v) => Some(*v),
            CadenceValue::Number { value, .. } => value.parse().ok(),
            CadenceValue::Optional(Some(inner)) => inner.as_u128(),
            _ => None,
        }
    }

    /// Cadence type name of this value.
    pub fn type_name(&self) -> &str {
        match self {
            CadenceValue::Void => "Void",
            CadenceValue::Bool(_) => "Bool",
            CadenceValue::String(_) => "String",
            CadenceValue::Address(_) => "Address",
            CadenceValue::UInt8(_) => "UInt8",
            CadenceValue::UInt32(_) => "UInt32",
            CadenceValue::UInt64(_) => "UInt64",
            CadenceValue::UInt128(_) => "UInt128",
            CadenceValue::UFix64(_) => "UFix64",
            CadenceValue::Number { ty, .. } => ty,
            CadenceValue::Optional(_) => "Optional",
            CadenceValue::Array(_) => "Array",
            CadenceValue::Dictionary(_) => "Dictionary",
            CadenceValue::Composite { kind, .. } => kind.type_name(),
        }
    }

    /// The JSON-Cadence representation.
    pub fn to_json(&self) -> Value {
        let value = match self {
            CadenceValue::Void => return json!({ "type": "Void" }),
            CadenceValue::Bool(b) => Value::Bool(*b),
            CadenceValue::String(s) => Value::String(s.clone()),
            CadenceValue::Address(a) => Value::String(a.to_string()),
            CadenceValue::UInt8(v) => Value::String(v.to_string()),
            CadenceValue::UInt32(v) => Value::String(v.to_string()),
            CadenceValue::UInt64(v) => Value::String(v.to_string()),
            CadenceValue::UInt128(v) => Value::String(v.to_string()),
            CadenceValue::UFix64(v) => Value::String(v.to_string()),
            CadenceValue::Number { value, .. } => Value::String(value.clone()),
            CadenceValue::Optional(inner) => match inner {
                Some(v) => v.to_json(),
                None => Value::Null,
            },
            CadenceValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            CadenceValue::Dictionary(entries) => Value::Array(
                entries
                    .iter()
                    .map(|(k, v)| json!({ "key": k.to_json(), "value": v.to_json() }))
                    .collect(),
            ),
            CadenceValue::Composite { id, fields, .. } => json!({
                "id": id,
                "fields": fields
                    .iter()
                    .map(|(name, v)| json!({ "name": name, "value": v.to_json() }))
                    .collect::<Vec<_>>(),
            }),
        };
        json!({ "type": self.type_name(), "value": value })
    }

    /// Serialized JSON-Cadence bytes, as shipped in script and transaction
    /// arguments.
    pub fn encode(&self) -> Vec<u8> {
        // Serializing a `serde_json::Value` cannot fail.
        serde_json::to_vec(&self.to_json()).unwrap_or_default()
    }

    /// Parse JSON-Cadence bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CadenceError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json(&value)
    }

    /// Parse a JSON-Cadence value.
    pub fn from_json(value: &Value) -> Result<Self, CadenceError> {
        let obj = value
            .as_object()
            .ok_or_else(|| CadenceError::Malformed("value is not an object".into()))?;
        let ty = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CadenceError::Malformed("missing type tag".into()))?;
        let payload = obj.get("value").unwrap_or(&Value::Null);

        match ty {
            "Void" => Ok(CadenceValue::Void),
            "Bool" => payload
                .as_bool()
                .map(CadenceValue::Bool)
                .ok_or_else(|| CadenceError::Malformed("Bool payload".into())),
            "String" | "Character" => Ok(CadenceValue::String(text(payload, ty)?.to_string())),
            "Address" => text(payload, ty)?
                .parse()
                .map(CadenceValue::Address)
                .map_err(|e| CadenceError::Malformed(format!("Address payload: {e}"))),
            "UInt8" => Ok(CadenceValue::UInt8(number(payload, ty)?)),
            "UInt32" => Ok(CadenceValue::UInt32(number(payload, ty)?)),
            "UInt64" => Ok(CadenceValue::UInt64(number(payload, ty)?)),
            "UInt128" => Ok(CadenceValue::UInt128(number(payload, ty)?)),
            "UFix64" => Ok(CadenceValue::UFix64(text(payload, ty)?.parse()?)),
            t if PASSTHROUGH_NUMBERS.contains(&t) => Ok(CadenceValue::Number {
                ty: t.to_string(),
                value: text(payload, ty)?.to_string(),
            }),
            "Optional" => match payload {
                Value::Null => Ok(CadenceValue::Optional(None)),
                inner => Ok(CadenceValue::Optional(Some(Box::new(Self::from_json(inner)?)))),
            },
            "Array" => list(payload, ty)?
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(CadenceValue::Array),
            "Dictionary" => list(payload, ty)?
                .iter()
                .map(|entry| {
                    let key = entry
                        .get("key")
                        .ok_or_else(|| CadenceError::Malformed("dictionary entry key".into()))?;
                    let val = entry
                        .get("value")
                        .ok_or_else(|| CadenceError::Malformed("dictionary entry value".into()))?;
                    Ok((Self::from_json(key)?, Self::from_json(val)?))
                })
                .collect::<Result<Vec<_>, CadenceError>>()
                .map(CadenceValue::Dictionary),
            other => match CompositeKind::from_type_name(other) {
                Some(kind) => decode_composite(kind, payload),
                None => Err(CadenceError::UnsupportedType(other.to_string())),
            },
        }
    }

    /// Plain JSON view for console output: dictionaries become objects,
    /// composites become objects of their fields, small integers become JSON
    /// numbers, fixed-point values stay strings.
    pub fn to_plain_json(&self) -> Value {
        match self {
            CadenceValue::Void => Value::Null,
            CadenceValue::Bool(b) => Value::Bool(*b),
            CadenceValue::String(s) => Value::String(s.clone()),
            CadenceValue::Address(a) => Value::String(a.to_string()),
            CadenceValue::UInt8(v) => json!(v),
            CadenceValue::UInt32(v) => json!(v),
            CadenceValue::UInt64(v) => json!(v),
            CadenceValue::UInt128(v) => match u64::try_from(*v) {
                Ok(small) => json!(small),
                Err(_) => Value::String(v.to_string()),
            },
            CadenceValue::UFix64(v) => Value::String(v.to_string()),
            CadenceValue::Number { ty, value } => {
                if ty == "Fix64" {
                    Value::String(value.clone())
                } else if let Ok(n) = value.parse::<i64>() {
                    json!(n)
                } else if let Ok(n) = value.parse::<u64>() {
                    json!(n)
                } else {
                    Value::String(value.clone())
                }
            }
            CadenceValue::Optional(inner) => inner
                .as_ref()
                .map(|v| v.to_plain_json())
                .unwrap_or(Value::Null),
            CadenceValue::Array(items) => {
                Value::Array(items.iter().map(Self::to_plain_json).collect())
            }
            CadenceValue::Dictionary(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    let key = match k.to_plain_json() {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    map.insert(key, v.to_plain_json());
                }
                Value::Object(map)
            }
            CadenceValue::Composite { fields, .. } => {
                let mut map = Map::new();
                for (name, v) in fields {
                    map.insert(name.clone(), v.to_plain_json());
                }
                Value::Object(map)
            }
        }
    }
}

fn text<'a>(payload: &'a Value, ty: &str) -> Result<&'a str, CadenceError> {
    payload
        .as_str()
        .ok_or_else(|| CadenceError::Malformed(format!("{ty} payload must be a string")))
}

fn number<T: std::str::FromStr>(payload: &Value, ty: &str) -> Result<T, CadenceError> {
    text(payload, ty)?
        .parse()
        .map_err(|_| CadenceError::Malformed(format!("{ty} payload out of range")))
}

fn list<'a>(payload: &'a Value, ty: &str) -> Result<&'a Vec<Value>, CadenceError> {
    payload
        .as_array()
        .ok_or_else(|| CadenceError::Malformed(format!("{ty} payload must be an array")))
}

fn decode_composite(kind: CompositeKind, payload: &Value) -> Result<CadenceValue, CadenceError> {
    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CadenceError::Malformed("composite id".into()))?
        .to_string();
    let fields = payload
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| CadenceError::Malformed("composite fields".into()))?
        .iter()
        .map(|field| {
            let name = field
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| CadenceError::Malformed("composite field name".into()))?;
            let value = field
                .get("value")
                .ok_or_else(|| CadenceError::Malformed("composite field value".into()))?;
            Ok((name.to_string(), CadenceValue::from_json(value)?))
        })
        .collect::<Result<Vec<_>, CadenceError>>()?;
    Ok(CadenceValue::Composite { kind, id, fields })
}
