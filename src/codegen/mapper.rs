//! Cairo type strings to host (Rust) type tokens, and back.

use std::convert::Infallible;
use std::fmt;

use crate::codec::{Type, TypeKind, UintWidth};

/// Rust type a Cairo type is exposed as in generated bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    Felt,
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Vec(Box<HostType>),
    /// A struct generated from the ABI, by its Rust name.
    Struct(String),
}

impl HostType {
    /// Parse a token produced by [`Display`](fmt::Display). Only built-in
    /// tokens are recognised; struct names are not.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(inner) = token.strip_prefix("Vec<").and_then(|t| t.strip_suffix('>')) {
            return Self::from_token(inner).map(|inner| Self::Vec(Box::new(inner)));
        }
        Some(match token {
            "Felt" => Self::Felt,
            "bool" => Self::Bool,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "U256" => Self::U256,
            _ => return None,
        })
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Felt => f.write_str("Felt"),
            Self::Bool => f.write_str("bool"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::U128 => f.write_str("u128"),
            Self::U256 => f.write_str("U256"),
            Self::Vec(inner) => write!(f, "Vec<{inner}>"),
            Self::Struct(name) => f.write_str(name),
        }
    }
}

/// Map a Cairo type string to its host type.
///
/// Unknown, user-defined and unparseable types map to [`HostType::Felt`]
/// rather than failing. Use [`map_type`] to bind user-defined types.
pub fn cairo_to_host(type_string: &str) -> HostType {
    match Type::resolve(type_string) {
        Ok(ty) => map_type(&ty, &mut |name: &str| {
            tracing::debug!(
                target: "starkbind::codegen",
                ty = %name,
                "No host mapping for user-defined type, falling back to Felt"
            );
            Ok::<_, Infallible>(HostType::Felt)
        })
        .unwrap_or_else(|never| match never {}),
        Err(err) => {
            tracing::debug!(
                target: "starkbind::codegen",
                ty = type_string,
                error = %err,
                "Unparseable type, falling back to Felt"
            );
            HostType::Felt
        }
    }
}

/// Map a resolved type to its host type. `named` decides what every
/// user-defined type (at any array depth) becomes.
pub fn map_type<E>(
    ty: &Type,
    named: &mut impl FnMut(&str) -> Result<HostType, E>,
) -> Result<HostType, E> {
    Ok(match ty.kind() {
        TypeKind::Felt | TypeKind::ContractAddress | TypeKind::ClassHash => HostType::Felt,
        TypeKind::Bool => HostType::Bool,
        TypeKind::Uint(UintWidth::U8) => HostType::U8,
        TypeKind::Uint(UintWidth::U16) => HostType::U16,
        TypeKind::Uint(UintWidth::U32) => HostType::U32,
        TypeKind::Uint(UintWidth::U64) => HostType::U64,
        TypeKind::Uint(UintWidth::U128) => HostType::U128,
        TypeKind::U256 => HostType::U256,
        TypeKind::Array { element, .. } => HostType::Vec(Box::new(map_type(element, named)?)),
        TypeKind::Named(name) => named(name)?,
    })
}

/// Canonical Cairo type string for a host type. Structs only carry their
/// Rust name, which is returned as is.
pub fn host_to_cairo(host: &HostType) -> String {
    match host {
        HostType::Felt => "core::felt252".to_string(),
        HostType::Bool => "core::bool".to_string(),
        HostType::U8 => "core::integer::u8".to_string(),
        HostType::U16 => "core::integer::u16".to_string(),
        HostType::U32 => "core::integer::u32".to_string(),
        HostType::U64 => "core::integer::u64".to_string(),
        HostType::U128 => "core::integer::u128".to_string(),
        HostType::U256 => "core::integer::u256".to_string(),
        HostType::Vec(inner) => format!("core::array::Array::<{}>", host_to_cairo(inner)),
        HostType::Struct(name) => name.clone(),
    }
}
