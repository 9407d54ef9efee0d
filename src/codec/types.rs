//! Cairo type strings resolved into a recursive [`Type`].

use std::fmt;

use crate::error::{Error, Result};

/// Width of a Cairo unsigned integer that fits in a single felt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UintWidth {
    U8,
    U16,
    U32,
    U64,
    U128,
}

impl UintWidth {
    pub const fn bits(self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::U64 => 64,
            Self::U128 => 128,
        }
    }

    /// Largest representable value.
    pub const fn max(self) -> u128 {
        match self {
            Self::U8 => u8::MAX as u128,
            Self::U16 => u16::MAX as u128,
            Self::U32 => u32::MAX as u128,
            Self::U64 => u64::MAX as u128,
            Self::U128 => u128::MAX,
        }
    }

    pub const fn fits(self, value: u128) -> bool {
        value <= self.max()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
        }
    }
}

impl fmt::Display for UintWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Felt,
    ContractAddress,
    ClassHash,
    Bool,
    Uint(UintWidth),
    U256,
    /// `T[N]` (bounded) or `T[]` / `Array<T>` / `Span<T>` (unbounded).
    Array {
        size: Option<usize>,
        element: Box<Type>,
    },
    /// A user-defined struct or enum, by its fully qualified name.
    Named(String),
}

/// A resolved Cairo type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    name: String,
    kind: TypeKind,
}

impl Type {
    pub fn resolve(type_string: &str) -> Result<Self> {
        let name = type_string.trim();
        if name.is_empty() {
            return Err(syntax(type_string, "empty type"));
        }

        let kind = if let Some(rest) = name.strip_suffix(']') {
            let open = rest
                .rfind('[')
                .ok_or_else(|| syntax(name, "unbalanced `]`"))?;
            let (element, size) = (rest[..open].trim(), rest[open + 1..].trim());
            if element.is_empty() {
                return Err(syntax(name, "array has no element type"));
            }
            let size = if size.is_empty() {
                None
            } else {
                Some(size.parse::<usize>().map_err(|_| {
                    syntax(
                        name,
                        format!("array size `{size}` is not a non-negative integer"),
                    )
                })?)
            };
            TypeKind::Array {
                size,
                element: Box::new(Self::resolve(element)?),
            }
        } else if let Some(open) = name.find('<') {
            let inner = name
                .strip_suffix('>')
                .map(|s| &s[open + 1..])
                .ok_or_else(|| syntax(name, "unbalanced `<`"))?;
            let path = name[..open].trim_end_matches("::");
            match last_segment(path) {
                "Array" | "Span" => TypeKind::Array {
                    size: None,
                    element: Box::new(Self::resolve(inner)?),
                },
                _ => TypeKind::Named(name.to_string()),
            }
        } else {
            classify(last_segment(name), name)
        };

        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }

    /// The type string this was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Bare name of the innermost element type, without module path.
    pub fn base(&self) -> &str {
        match &self.kind {
            TypeKind::Array { element, .. } => element.base(),
            _ => {
                let path = self.name.split('<').next().unwrap_or(self.name.as_str());
                last_segment(path.trim_end_matches("::"))
            }
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// Declared element count of a bounded array.
    pub fn size(&self) -> Option<usize> {
        match self.kind {
            TypeKind::Array { size, .. } => size,
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&Type> {
        match &self.kind {
            TypeKind::Array { element, .. } => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

fn classify(base: &str, full: &str) -> TypeKind {
    match base {
        "felt252" | "felt" => TypeKind::Felt,
        "ContractAddress" => TypeKind::ContractAddress,
        "ClassHash" => TypeKind::ClassHash,
        "bool" => TypeKind::Bool,
        "u8" => TypeKind::Uint(UintWidth::U8),
        "u16" => TypeKind::Uint(UintWidth::U16),
        // Cairo `usize` is a 32-bit integer.
        "u32" | "usize" => TypeKind::Uint(UintWidth::U32),
        "u64" => TypeKind::Uint(UintWidth::U64),
        "u128" => TypeKind::Uint(UintWidth::U128),
        "u256" => TypeKind::U256,
        _ => TypeKind::Named(full.to_string()),
    }
}

fn syntax(ty: &str, reason: impl Into<String>) -> Error {
    Error::TypeSyntax {
        ty: ty.to_string(),
        reason: reason.into(),
    }
}
