//! Decoded value types
//!
//! A record field declares a [`Shape`]; the reader decodes memory into the
//! matching [`Value`] and the field's [`FieldValue`] impl unpacks it.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// Primitive types the reader can decode
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, IntoStaticStr, Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Width in bytes
    pub fn width(&self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }
}

/// What a field decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Shape {
    Scalar(ScalarType),
    /// Length-prefixed `List<T>`
    Array(ScalarType),
    /// Length-prefixed UTF-16 string
    String,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(t) => write!(f, "{}", t),
            Shape::Array(t) => write!(f, "[{}]", t),
            Shape::String => f.write_str("string"),
        }
    }
}

impl FromStr for Shape {
    type Err = Error;

    /// Parse the [`Display`](fmt::Display) form: `i32`, `[i32]` or `string`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let unknown = || Error::InvalidSchema(format!("unknown shape: {}", s));

        if s == "string" {
            return Ok(Shape::String);
        }
        match s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            Some(inner) => inner
                .trim()
                .parse()
                .map(Shape::Array)
                .map_err(|_| unknown()),
            None => s.parse().map(Shape::Scalar).map_err(|_| unknown()),
        }
    }
}

/// A primitive that can be decoded from little-endian bytes
pub trait Scalar: Copy + Sized + 'static {
    const TYPE: ScalarType;

    /// Decode from exactly `TYPE.width()` bytes
    fn from_le_slice(bytes: &[u8]) -> Self;

    fn to_le_vec(self) -> Vec<u8>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: ScalarType = ScalarType::$variant;

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                fn to_le_vec(self) -> Vec<u8> {
                    self.to_le_bytes().to_vec()
                }
            }
        )*
    };
}

impl_scalar! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrayValue {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ArrayValue {
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(ScalarValue),
    Array(ArrayValue),
    String(String),
}

impl Value {
    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(s) => Shape::Scalar(match s {
                ScalarValue::I8(_) => ScalarType::I8,
                ScalarValue::I16(_) => ScalarType::I16,
                ScalarValue::I32(_) => ScalarType::I32,
                ScalarValue::I64(_) => ScalarType::I64,
                ScalarValue::U8(_) => ScalarType::U8,
                ScalarValue::U16(_) => ScalarType::U16,
                ScalarValue::U32(_) => ScalarType::U32,
                ScalarValue::U64(_) => ScalarType::U64,
                ScalarValue::F32(_) => ScalarType::F32,
                ScalarValue::F64(_) => ScalarType::F64,
            }),
            Value::Array(a) => Shape::Array(match a {
                ArrayValue::I8(_) => ScalarType::I8,
                ArrayValue::I16(_) => ScalarType::I16,
                ArrayValue::I32(_) => ScalarType::I32,
                ArrayValue::I64(_) => ScalarType::I64,
                ArrayValue::U8(_) => ScalarType::U8,
                ArrayValue::U16(_) => ScalarType::U16,
                ArrayValue::U32(_) => ScalarType::U32,
                ArrayValue::U64(_) => ScalarType::U64,
                ArrayValue::F32(_) => ScalarType::F32,
                ArrayValue::F64(_) => ScalarType::F64,
            }),
            Value::String(_) => Shape::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => match s {
                ScalarValue::I8(v) => write!(f, "{}", v),
                ScalarValue::I16(v) => write!(f, "{}", v),
                ScalarValue::I32(v) => write!(f, "{}", v),
                ScalarValue::I64(v) => write!(f, "{}", v),
                ScalarValue::U8(v) => write!(f, "{}", v),
                ScalarValue::U16(v) => write!(f, "{}", v),
                ScalarValue::U32(v) => write!(f, "{}", v),
                ScalarValue::U64(v) => write!(f, "{}", v),
                ScalarValue::F32(v) => write!(f, "{}", v),
                ScalarValue::F64(v) => write!(f, "{}", v),
            },
            Value::Array(a) => match a {
                ArrayValue::I8(v) => write!(f, "{:?}", v),
                ArrayValue::I16(v) => write!(f, "{:?}", v),
                ArrayValue::I32(v) => write!(f, "{:?}", v),
                ArrayValue::I64(v) => write!(f, "{:?}", v),
                ArrayValue::U8(v) => write!(f, "{:?}", v),
                ArrayValue::U16(v) => write!(f, "{:?}", v),
                ArrayValue::U32(v) => write!(f, "{:?}", v),
                ArrayValue::U64(v) => write!(f, "{:?}", v),
                ArrayValue::F32(v) => write!(f, "{:?}", v),
                ArrayValue::F64(v) => write!(f, "{:?}", v),
            },
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// A Rust type a record field can have
///
/// The shape is derived from the field's type, so a schema cannot ask the
/// reader for an `f32` and then store it in an `i16`.
pub trait FieldValue: Sized {
    const SHAPE: Shape;

    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_field_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const SHAPE: Shape = Shape::Scalar(ScalarType::$variant);

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Scalar(ScalarValue::$variant(v)) => Some(v),
                        _ => None,
                    }
                }
            }

            impl FieldValue for Vec<$ty> {
                const SHAPE: Shape = Shape::Array(ScalarType::$variant);

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Array(ArrayValue::$variant(v)) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl FieldValue for String {
    const SHAPE: Shape = Shape::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_scalar_type_names() {
        assert_eq!(ScalarType::from_str("i16").unwrap(), ScalarType::I16);
        assert_eq!(ScalarType::F64.to_string(), "f64");
        assert!(ScalarType::from_str("int16").is_err());
    }

    #[test]
    fn test_scalar_decode_little_endian() {
        assert_eq!(i16::from_le_slice(&[0xFE, 0xFF]), -2);
        assert_eq!(u32::from_le_slice(&[0x78, 0x56, 0x34, 0x12]), 0x12345678);
        assert_eq!(f32::from_le_slice(&1.5f32.to_le_bytes()), 1.5);
    }

    #[test]
    fn test_field_value_shape_check() {
        assert_eq!(<i16 as FieldValue>::SHAPE, Shape::Scalar(ScalarType::I16));
        assert_eq!(<Vec<i32> as FieldValue>::SHAPE, Shape::Array(ScalarType::I32));

        let value = Value::Scalar(ScalarValue::I16(7));
        assert_eq!(value.shape(), Shape::Scalar(ScalarType::I16));
        assert_eq!(i16::from_value(value.clone()), Some(7));
        assert_eq!(i32::from_value(value), None);
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::Scalar(ScalarType::U32).to_string(), "u32");
        assert_eq!(Shape::Array(ScalarType::I32).to_string(), "[i32]");
        assert_eq!(Shape::String.to_string(), "string");
    }

    #[test]
    fn test_shape_parse() {
        assert_eq!("u32".parse::<Shape>().unwrap(), Shape::Scalar(ScalarType::U32));
        assert_eq!("[ i16 ]".parse::<Shape>().unwrap(), Shape::Array(ScalarType::I16));
        assert_eq!("string".parse::<Shape>().unwrap(), Shape::String);
        assert!("[string]".parse::<Shape>().is_err());
        assert!("int".parse::<Shape>().is_err());
    }
}
