//! Contract interface model and the JSON ABI parser.
//!
//! An ABI document is a JSON array of entries discriminated by their `type`
//! field. [`parse`] turns it into an [`Interface`], which is built once and
//! only read afterwards.

pub mod selector;

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use starknet::core::types::Felt;

use crate::error::{ParseError, Result};

pub use selector::{event_selector, selector};

/// Kind of callable entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Constructor,
    Function,
    L1Handler,
}

/// State mutability tag of a method. Anything other than `view` mutates state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMutability {
    View,
    #[default]
    #[serde(other)]
    External,
}

/// A named (or positional) typed slot: method input/output, event key/data
/// field or struct member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    /// Declaration offset, only meaningful for struct members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ty: ty.into(),
            offset: None,
        }
    }

    /// An argument with no name, as found in method outputs.
    pub fn unnamed(ty: impl Into<String>) -> Self {
        Self {
            name: None,
            ty: ty.into(),
            offset: None,
        }
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state_mutability: StateMutability,
    #[serde(default)]
    pub inputs: Vec<Argument>,
    #[serde(default)]
    pub outputs: Vec<Argument>,
    /// Entry point selector, computed from the name. Constructors have none.
    #[serde(skip)]
    pub selector: Option<Felt>,
}

impl Method {
    pub fn is_view(&self) -> bool {
        self.state_mutability == StateMutability::View
    }
}

/// One variant of an enum-shaped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub keys: Vec<Argument>,
    #[serde(default)]
    pub data: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
}

impl Event {
    pub fn is_enum(&self) -> bool {
        self.kind.as_deref() == Some("enum") || !self.variants.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub members: Vec<Argument>,
}

/// Cairo 1 event member: a typed field tagged `key` or `data`.
#[derive(Debug, Deserialize)]
struct EventMember {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(flatten)]
    event: Event,
    #[serde(default)]
    members: Vec<EventMember>,
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        let mut event = raw.event;
        for member in raw.members {
            let arg = Argument::new(member.name, member.ty);
            match member.kind.as_deref() {
                Some("key") => event.keys.push(arg),
                _ => event.data.push(arg),
            }
        }
        event
    }
}

/// Parsed contract interface: constructor, methods, events and structs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    constructor: Option<Method>,
    methods: BTreeMap<String, Method>,
    events: BTreeMap<String, Event>,
    structs: BTreeMap<String, Struct>,
}

impl Interface {
    /// Parse an ABI document from raw JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(ParseError::Json)?;
        Self::from_value(&value)
    }

    /// Build an interface from an already decoded JSON document.
    pub fn from_value(document: &serde_json::Value) -> Result<Self> {
        let entries = document.as_array().ok_or(ParseError::NotAnArray)?;
        let mut interface = Self::default();

        for (index, entry) in entries.iter().enumerate() {
            let kind = entry
                .get("type")
                .and_then(serde_json::Value::as_str)
                .ok_or(ParseError::MissingType { index })?;
            let invalid = |source| ParseError::InvalidEntry {
                index,
                kind: kind.to_string(),
                source,
            };

            match kind {
                "constructor" => {
                    let method = Method::deserialize(entry).map_err(invalid)?;
                    interface.constructor = Some(method);
                }
                "function" | "l1_handler" => {
                    let mut method = Method::deserialize(entry).map_err(invalid)?;
                    method.selector = Some(selector(&method.name)?);
                    if interface.methods.contains_key(&method.name) {
                        tracing::warn!(
                            target: "starkbind::abi",
                            method = %method.name,
                            "Duplicate method name, keeping the last definition"
                        );
                    }
                    interface.methods.insert(method.name.clone(), method);
                }
                "event" => {
                    let event: Event = RawEvent::deserialize(entry).map_err(invalid)?.into();
                    interface.events.insert(event.name.clone(), event);
                }
                "struct" => {
                    let def = Struct::deserialize(entry).map_err(invalid)?;
                    interface.structs.insert(def.name.clone(), def);
                }
                other => {
                    return Err(ParseError::UnknownType {
                        index,
                        kind: other.to_string(),
                    }
                    .into())
                }
            }
        }

        tracing::debug!(
            target: "starkbind::abi",
            methods = interface.methods.len(),
            events = interface.events.len(),
            structs = interface.structs.len(),
            constructor = interface.constructor.is_some(),
            "Parsed ABI"
        );
        Ok(interface)
    }

    pub fn constructor(&self) -> Option<&Method> {
        self.constructor.as_ref()
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Methods ordered by name.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values()
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }

    /// Events ordered by name.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn struct_def(&self, name: &str) -> Option<&Struct> {
        self.structs.get(name)
    }

    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.structs.values()
    }

    /// Struct a type string refers to: the exact declaration, else the one
    /// struct whose bare name matches.
    pub fn resolve_struct(&self, name: &str) -> Option<&Struct> {
        if let Some(def) = self.structs.get(name) {
            return Some(def);
        }
        // ABIs sometimes reference a struct by a shorter path than it is
        // declared under.
        let bare = name.rsplit("::").next().unwrap_or(name);
        let mut candidates = self
            .structs
            .values()
            .filter(|s| s.name.rsplit("::").next() == Some(bare));
        match (candidates.next(), candidates.next()) {
            (Some(def), None) => Some(def),
            _ => None,
        }
    }
}

/// Entry wrapper restoring the `type` discriminator on serialization.
#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    entry: &'a T,
}

/// Serializes back to an ABI document that parses to an equal interface.
/// Cairo 1 event members come out as `keys`/`data`.
impl Serialize for Interface {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = usize::from(self.constructor.is_some())
            + self.methods.len()
            + self.events.len()
            + self.structs.len();
        let mut seq = serializer.serialize_seq(Some(len))?;
        for def in self.structs.values() {
            seq.serialize_element(&Tagged {
                kind: "struct",
                entry: def,
            })?;
        }
        if let Some(constructor) = &self.constructor {
            seq.serialize_element(constructor)?;
        }
        for method in self.methods.values() {
            seq.serialize_element(method)?;
        }
        for event in self.events.values() {
            seq.serialize_element(&Tagged {
                kind: "event",
                entry: event,
            })?;
        }
        seq.end()
    }
}

impl FromStr for Interface {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s.as_bytes())
    }
}

/// Parse an ABI document. Performs no I/O: the caller supplies the bytes.
pub fn parse(json: &[u8]) -> Result<Interface> {
    Interface::from_json(json)
}
