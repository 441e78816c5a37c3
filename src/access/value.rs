use crate::access::error::{AccessError, AccessResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column types supported by the engine. Text widths are declared in
/// characters (UTF-16 code units); every character occupies two bytes on
/// disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Float,
    /// Fixed-width text: always stored at the declared width, padded.
    Text(u16),
    /// Variable-width text bounded by the declared width, no padding.
    VarText(u16),
}

impl DataType {
    /// Whether `value` is representable under this type.
    pub fn check(&self, value: &Value) -> bool {
        match (self, value) {
            (DataType::Int, Value::Int(_)) => true,
            (DataType::Float, Value::Float(_)) => true,
            (DataType::Text(width) | DataType::VarText(width), Value::Text(text)) => {
                text.encode_utf16().count() <= *width as usize
            }
            _ => false,
        }
    }

    /// Convert textual input into a typed value.
    pub fn parse(&self, text: &str) -> AccessResult<Value> {
        match self {
            DataType::Int => text.trim().parse::<i32>().map(Value::Int).map_err(|_| {
                AccessError::SchemaViolation(format!("`{}` is not a valid integer", text))
            }),
            DataType::Float => text.trim().parse::<f32>().map(Value::Float).map_err(|_| {
                AccessError::SchemaViolation(format!("`{}` is not a valid float", text))
            }),
            DataType::Text(width) | DataType::VarText(width) => {
                if text.encode_utf16().count() > *width as usize {
                    return Err(AccessError::SchemaViolation(format!(
                        "text `{}` exceeds declared width {}",
                        text, width
                    )));
                }
                Ok(Value::Text(text.to_string()))
            }
        }
    }

    /// Encoded payload size of `value` under this type, excluding the
    /// record's offset table.
    pub fn byte_len(&self, value: &Value) -> usize {
        match (self, value) {
            (DataType::Int, _) | (DataType::Float, _) => 4,
            (DataType::Text(width), _) => 2 * *width as usize,
            (DataType::VarText(width), Value::Text(text)) => {
                2 * text.encode_utf16().count().min(*width as usize)
            }
            (DataType::VarText(_), _) => 0,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Text(width) => write!(f, "text({})", width),
            DataType::VarText(width) => write!(f, "vartext({})", width),
        }
    }
}

/// A single typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}
