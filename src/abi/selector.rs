use starknet::core::types::Felt;
use starknet::core::utils::get_selector_from_name;

use crate::error::Result;

/// Entry point selector for `name`: `sn_keccak(name)`.
///
/// Exposed directly so callers can build calldata by hand without going
/// through generated bindings.
pub fn selector(name: &str) -> Result<Felt> {
    Ok(get_selector_from_name(name)?)
}

/// Selector emitted as `keys[0]` of an event.
///
/// Events are keyed by their bare name, so any module path
/// (`contracts::token::Transfer`) is dropped first.
pub fn event_selector(event_name: &str) -> Result<Felt> {
    let bare = event_name.rsplit("::").next().unwrap_or(event_name);
    selector(bare)
}
