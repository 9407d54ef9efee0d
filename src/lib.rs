//! ABI-driven felt codec and typed binding generator for Starknet contracts.
//!
//! - [`abi`] parses a contract's JSON ABI into an [`Interface`].
//! - [`codec`] packs host [`Value`]s into calldata felts and unpacks them back.
//! - [`codegen`] binds an [`Interface`] and renders a typed Rust client module.
//! - [`bind`] is the small runtime the generated modules call into.

pub mod abi;
pub mod bind;
pub mod codec;
pub mod codegen;
pub mod error;

pub use abi::{event_selector, parse, selector, Interface};
pub use codec::{pack, unpack, FromValue, IntoValue, Type, Value};
pub use error::{Error, ParseError, Result};
pub use starknet::core::types::{Felt, U256};
