use starknet::core::types::{Felt, U256};

use super::types::UintWidth;
use crate::error::{Error, Result};

/// A host-side value encoded to, or decoded from, felts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Felt(Felt),
    /// Hex (`0x..`) or decimal literal. Accepted when encoding felt-like and
    /// integer types; never produced by decoding.
    Text(String),
    Bool(bool),
    Uint { width: UintWidth, value: u128 },
    U256(U256),
    Sequence(Vec<Value>),
    /// Struct members in declaration order.
    Struct(Vec<Value>),
}

impl Value {
    pub const fn uint(width: UintWidth, value: u128) -> Self {
        Self::Uint { width, value }
    }

    pub const fn u8(value: u8) -> Self {
        Self::uint(UintWidth::U8, value as u128)
    }

    pub const fn u16(value: u16) -> Self {
        Self::uint(UintWidth::U16, value as u128)
    }

    pub const fn u32(value: u32) -> Self {
        Self::uint(UintWidth::U32, value as u128)
    }

    pub const fn u64(value: u64) -> Self {
        Self::uint(UintWidth::U64, value as u128)
    }

    pub const fn u128(value: u128) -> Self {
        Self::uint(UintWidth::U128, value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Short description of the variant, used in conversion errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Felt(_) => "a felt".to_string(),
            Self::Text(s) => format!("text `{s}`"),
            Self::Bool(_) => "a bool".to_string(),
            Self::Uint { width, .. } => format!("a {width}"),
            Self::U256(_) => "a u256".to_string(),
            Self::Sequence(items) => format!("a sequence of {} item(s)", items.len()),
            Self::Struct(members) => format!("a struct of {} member(s)", members.len()),
        }
    }
}

/// Conversion from a Rust value into a [`Value`]; used by generated bindings.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion from a decoded [`Value`] back into a Rust value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl IntoValue for Felt {
    fn into_value(self) -> Value {
        Value::Felt(self)
    }
}

impl FromValue for Felt {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Felt(felt) => Ok(felt),
            other => Err(Error::conversion("Felt", other.describe())),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(Error::conversion("bool", other.describe())),
        }
    }
}

impl IntoValue for U256 {
    fn into_value(self) -> Value {
        Value::U256(self)
    }
}

impl FromValue for U256 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::U256(v) => Ok(v),
            other => Err(Error::conversion("U256", other.describe())),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Sequence(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Sequence(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(Error::conversion("Vec", other.describe())),
        }
    }
}

macro_rules! impl_uint_value {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::uint(UintWidth::$width, self as u128)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Uint { value, .. } => <$ty>::try_from(value)
                            .map_err(|_| Error::overflow(value, stringify!($ty))),
                        other => Err(Error::conversion(stringify!($ty), other.describe())),
                    }
                }
            }
        )*
    };
}

impl_uint_value!(u8 => U8, u16 => U16, u32 => U32, u64 => U64, u128 => U128);
