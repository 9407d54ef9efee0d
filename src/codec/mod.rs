//! Felt codec: encodes host [`Value`]s into calldata felts and decodes felts
//! back, driven by the resolved Cairo type of each argument.
//!
//! Wire layout:
//! - felt-like scalars, `bool` and `u8`..`u128` take one felt;
//! - `u256` takes two felts, low 128 bits first;
//! - arrays take a length felt followed by each element;
//! - structs take each member in declaration order (no length prefix).

pub mod types;
pub mod value;

use starknet::core::types::{Felt, U256};

use crate::abi::{Argument, Event, Interface, Method, Struct};
use crate::error::{Error, Result};

pub use types::{Type, TypeKind, UintWidth};
pub use value::{FromValue, IntoValue, Value};

/// Maximum nesting of arrays and structs inside one argument.
const MAX_DEPTH: usize = 64;

/// Encode `values` positionally against `args`.
///
/// Struct-typed arguments need the struct table of an [`Interface`]; use
/// [`Interface::pack`] for those.
pub fn pack(args: &[Argument], values: &[Value]) -> Result<Vec<Felt>> {
    Codec::default().pack(args, values)
}

/// Decode one value per argument from the front of `data`. Trailing felts are
/// left unread.
pub fn unpack(args: &[Argument], data: &[Felt]) -> Result<Vec<Value>> {
    Codec::default().unpack(args, data)
}

impl Interface {
    /// Struct-aware [`pack`].
    pub fn pack(&self, args: &[Argument], values: &[Value]) -> Result<Vec<Felt>> {
        Codec::with_structs(self).pack(args, values)
    }

    /// Struct-aware [`unpack`].
    pub fn unpack(&self, args: &[Argument], data: &[Felt]) -> Result<Vec<Value>> {
        Codec::with_structs(self).unpack(args, data)
    }

    /// Calldata for invoking `method` with `values`.
    pub fn encode_call(&self, method: &Method, values: &[Value]) -> Result<Vec<Felt>> {
        self.pack(&method.inputs, values)
    }

    /// Decode the return data of `method`.
    pub fn decode_output(&self, method: &Method, data: &[Felt]) -> Result<Vec<Value>> {
        self.unpack(&method.outputs, data)
    }

    /// Decode an emitted event. `keys` must not include the selector key.
    pub fn decode_event(
        &self,
        event: &Event,
        keys: &[Felt],
        data: &[Felt],
    ) -> Result<(Vec<Value>, Vec<Value>)> {
        Ok((self.unpack(&event.keys, keys)?, self.unpack(&event.data, data)?))
    }
}

#[derive(Default, Clone, Copy)]
struct Codec<'a> {
    interface: Option<&'a Interface>,
}

impl<'a> Codec<'a> {
    fn with_structs(interface: &'a Interface) -> Self {
        Self {
            interface: Some(interface),
        }
    }

    fn struct_def(&self, name: &str) -> Result<&'a Struct> {
        self.interface
            .and_then(|interface| interface.resolve_struct(name))
            .ok_or_else(|| Error::UnsupportedType(name.to_string()))
    }

    /// Whether values of `ty` occupy no felts at all, e.g. a struct with no
    /// members.
    fn is_zero_width(&self, ty: &Type, depth: usize) -> bool {
        let TypeKind::Named(name) = ty.kind() else {
            return false;
        };
        if depth > MAX_DEPTH {
            return false;
        }
        self.struct_def(name).is_ok_and(|def| {
            def.members.iter().all(|member| {
                Type::resolve(&member.ty).is_ok_and(|ty| self.is_zero_width(&ty, depth + 1))
            })
        })
    }

    fn pack(&self, args: &[Argument], values: &[Value]) -> Result<Vec<Felt>> {
        if args.len() != values.len() {
            return Err(Error::Arity {
                args: args.len(),
                values: values.len(),
            });
        }

        let mut out = Vec::with_capacity(args.len());
        for (arg, value) in args.iter().zip(values) {
            let ty = Type::resolve(&arg.ty)?;
            let start = out.len();
            self.pack_value(&ty, value, &mut out, 0)?;
            tracing::trace!(
                target: "starkbind::codec",
                arg = arg.name_or_empty(),
                ty = %ty,
                felts = out.len() - start,
                "Packed argument"
            );
        }
        Ok(out)
    }

    fn pack_value(&self, ty: &Type, value: &Value, out: &mut Vec<Felt>, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::RecursionLimit(ty.name().to_string()));
        }

        match ty.kind() {
            TypeKind::Felt | TypeKind::ContractAddress | TypeKind::ClassHash => {
                out.push(felt_from_value(ty, value)?);
            }
            TypeKind::Bool => match value {
                Value::Bool(b) => out.push(if *b { Felt::ONE } else { Felt::ZERO }),
                other => return Err(Error::conversion(ty.name(), other.describe())),
            },
            TypeKind::Uint(width) => {
                let v = uint_from_value(ty, *width, value)?;
                out.push(Felt::from(v));
            }
            TypeKind::U256 => {
                let v = u256_from_value(ty, value)?;
                out.push(Felt::from(v.low()));
                out.push(Felt::from(v.high()));
            }
            TypeKind::Array { element, .. } => match value {
                Value::Sequence(items) => {
                    out.push(Felt::from(items.len() as u64));
                    for item in items {
                        self.pack_value(element, item, out, depth + 1)?;
                    }
                }
                other => return Err(Error::conversion(ty.name(), other.describe())),
            },
            TypeKind::Named(name) => {
                let def = self.struct_def(name)?;
                let members = match value {
                    Value::Struct(members) => members,
                    other => return Err(Error::conversion(ty.name(), other.describe())),
                };
                if members.len() != def.members.len() {
                    return Err(Error::Arity {
                        args: def.members.len(),
                        values: members.len(),
                    });
                }
                for (member, v) in def.members.iter().zip(members) {
                    let member_ty = Type::resolve(&member.ty)?;
                    self.pack_value(&member_ty, v, out, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn unpack(&self, args: &[Argument], data: &[Felt]) -> Result<Vec<Value>> {
        let mut cursor = data;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let ty = Type::resolve(&arg.ty)?;
            let before = cursor.len();
            values.push(self.unpack_value(&ty, &mut cursor, 0)?);
            tracing::trace!(
                target: "starkbind::codec",
                arg = arg.name_or_empty(),
                ty = %ty,
                felts = before - cursor.len(),
                "Unpacked argument"
            );
        }
        Ok(values)
    }

    fn unpack_value(&self, ty: &Type, cursor: &mut &[Felt], depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(Error::RecursionLimit(ty.name().to_string()));
        }

        let value = match ty.kind() {
            TypeKind::Felt | TypeKind::ContractAddress | TypeKind::ClassHash => {
                Value::Felt(take(ty, cursor, 1)?[0])
            }
            TypeKind::Bool => Value::Bool(take(ty, cursor, 1)?[0] != Felt::ZERO),
            TypeKind::Uint(width) => {
                let felt = take(ty, cursor, 1)?[0];
                let v = felt_to_u128(ty, felt)?;
                if !width.fits(v) {
                    return Err(Error::overflow(v, ty.name()));
                }
                Value::uint(*width, v)
            }
            TypeKind::U256 => {
                let words = take(ty, cursor, 2)?;
                let low = felt_to_u128(ty, words[0])?;
                let high = felt_to_u128(ty, words[1])?;
                Value::U256(U256::from_words(low, high))
            }
            TypeKind::Array { element, .. } => {
                let len_felt = take(ty, cursor, 1)?[0];
                let count = u64::try_from(len_felt)
                    .ok()
                    .and_then(|c| usize::try_from(c).ok())
                    .ok_or_else(|| Error::overflow(format!("{len_felt:#x}"), ty.name()))?;
                // Every element needs at least one felt, unless it has none.
                if count > cursor.len() && !self.is_zero_width(element, depth + 1) {
                    return Err(Error::truncated(ty.name(), count, cursor.len()));
                }
                let mut items = Vec::with_capacity(count.min(cursor.len()));
                for _ in 0..count {
                    items.push(self.unpack_value(element, cursor, depth + 1)?);
                }
                Value::Sequence(items)
            }
            TypeKind::Named(name) => {
                let def = self.struct_def(name)?;
                let mut members = Vec::with_capacity(def.members.len());
                for member in &def.members {
                    let member_ty = Type::resolve(&member.ty)?;
                    members.push(self.unpack_value(&member_ty, cursor, depth + 1)?);
                }
                Value::Struct(members)
            }
        };
        Ok(value)
    }
}

fn take<'d>(ty: &Type, cursor: &mut &'d [Felt], n: usize) -> Result<&'d [Felt]> {
    if cursor.len() < n {
        return Err(Error::truncated(ty.name(), n, cursor.len()));
    }
    let (head, tail) = cursor.split_at(n);
    *cursor = tail;
    Ok(head)
}

fn felt_to_u128(ty: &Type, felt: Felt) -> Result<u128> {
    u128::try_from(felt).map_err(|_| Error::overflow(format!("{felt:#x}"), ty.name()))
}

fn felt_from_value(ty: &Type, value: &Value) -> Result<Felt> {
    match value {
        Value::Felt(felt) => Ok(*felt),
        Value::Text(text) => {
            let invalid = || Error::conversion(ty.name(), value.describe());
            let text = text.trim();
            let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Some(hex) => (hex, 16),
                None => (text, 10),
            };
            // Also rejects a sign.
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return Err(invalid());
            }
            if radix == 16 && digits.trim_start_matches('0').len() > 64 {
                return Err(invalid());
            }
            let wide = if radix == 16 {
                primitive_types::U256::from_str_radix(digits, 16).map_err(|_| invalid())?
            } else {
                primitive_types::U256::from_dec_str(digits).map_err(|_| invalid())?
            };
            let mut bytes = [0u8; 32];
            for (i, limb) in wide.0.iter().enumerate() {
                let start = (3 - i) * 8;
                bytes[start..start + 8].copy_from_slice(&limb.to_be_bytes());
            }
            // `from_bytes_be` reduces modulo the field prime; values at or
            // above it do not survive the round trip.
            let felt = Felt::from_bytes_be(&bytes);
            if felt.to_bytes_be() != bytes {
                return Err(invalid());
            }
            Ok(felt)
        }
        other => Err(Error::conversion(ty.name(), other.describe())),
    }
}

/// Splits a numeric literal into `(digits, radix)`, rejecting negatives.
fn split_literal<'t>(ty: &Type, text: &'t str, value: &Value) -> Result<(&'t str, u32)> {
    let text = text.trim();
    if text.starts_with('-') {
        return Err(Error::overflow(text, ty.name()));
    }
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(Error::conversion(ty.name(), value.describe()));
    }
    Ok((digits, radix))
}

fn uint_from_value(ty: &Type, width: UintWidth, value: &Value) -> Result<u128> {
    let v = match value {
        Value::Uint { value, .. } => *value,
        Value::Text(text) => {
            let (digits, radix) = split_literal(ty, text, value)?;
            // Digits are validated, so a parse failure can only be overflow.
            u128::from_str_radix(digits, radix).map_err(|_| Error::overflow(text, ty.name()))?
        }
        other => return Err(Error::conversion(ty.name(), other.describe())),
    };
    if !width.fits(v) {
        return Err(Error::overflow(v, ty.name()));
    }
    Ok(v)
}

fn u256_from_value(ty: &Type, value: &Value) -> Result<U256> {
    match value {
        Value::U256(v) => Ok(*v),
        Value::Uint { value, .. } => Ok(U256::from(*value)),
        Value::Text(text) => {
            let (digits, radix) = split_literal(ty, text, value)?;
            let overflow = || Error::overflow(text, ty.name());
            let wide = if radix == 16 {
                if digits.trim_start_matches('0').len() > 64 {
                    return Err(overflow());
                }
                primitive_types::U256::from_str_radix(digits, 16).map_err(|_| overflow())?
            } else {
                primitive_types::U256::from_dec_str(digits).map_err(|_| overflow())?
            };
            Ok(U256::from_words(wide.low_u128(), (wide >> 128).low_u128()))
        }
        other => Err(Error::conversion(ty.name(), other.describe())),
    }
}
