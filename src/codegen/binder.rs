//! Builds generation metadata from a parsed [`Interface`].

use std::collections::{BTreeMap, BTreeSet};

use convert_case::{Case, Casing};

use super::mapper::{map_type, HostType};
use super::CodegenError;
use crate::abi::{Argument, Event, Interface, Method};
use crate::codec::Type;

/// One typed field of a method signature, event or struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldBinding {
    pub name: String,
    pub cairo_type: String,
    pub host_type: HostType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    /// Cairo entry point name.
    pub name: String,
    pub normalized: String,
    /// `true` iff the method is `view`.
    pub read_only: bool,
    pub inputs: Vec<FieldBinding>,
    pub outputs: Vec<FieldBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    /// Fully qualified Cairo event name.
    pub name: String,
    pub normalized: String,
    /// Name the event selector is computed from.
    pub selector_name: String,
    pub is_enum: bool,
    pub keys: Vec<FieldBinding>,
    pub data: Vec<FieldBinding>,
}

/// A user-defined ABI struct, generated as a Rust struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructBinding {
    /// Fully qualified Cairo struct name.
    pub name: String,
    pub normalized: String,
    pub members: Vec<FieldBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBinding {
    pub type_name: String,
    /// The interface the binding was built from; embedded as the ABI constant.
    pub interface: Interface,
    /// Compiled class, embedded verbatim when present.
    pub class: Option<String>,
    pub constructor: Option<MethodBinding>,
    /// Sorted by Cairo name.
    pub methods: Vec<MethodBinding>,
    /// Sorted by Cairo name.
    pub events: Vec<EventBinding>,
    /// Structs referenced by methods and events, sorted by Cairo name.
    pub structs: Vec<StructBinding>,
}

impl ContractBinding {
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn calls(&self) -> impl Iterator<Item = &MethodBinding> {
        self.methods.iter().filter(|m| m.read_only)
    }

    pub fn transacts(&self) -> impl Iterator<Item = &MethodBinding> {
        self.methods.iter().filter(|m| !m.read_only)
    }
}

/// PascalCase identifier for a Cairo name.
///
/// A `::` path collapses to its last segment, except that a trailing `Event`
/// keeps its parent: `contracts::HelloStarknet::Event` becomes
/// `HelloStarknetEvent`.
pub fn normalize_name(name: &str) -> String {
    let mut segments = name.rsplit("::");
    let last = segments.next().unwrap_or(name);
    let base = match (last, segments.next()) {
        ("Event", Some(parent)) => format!("{parent}Event"),
        _ => last.to_string(),
    };
    base.to_case(Case::Pascal)
}

/// Bind every method, event and referenced struct of `interface`.
///
/// Fails with [`CodegenError::Template`] on a type that has no host
/// binding, such as a user-defined type without a struct definition.
pub fn bind_contract(type_name: &str, interface: &Interface) -> Result<ContractBinding, CodegenError> {
    let mut binder = Binder {
        interface,
        structs: BTreeMap::new(),
        pending: BTreeSet::new(),
    };
    let constructor = interface
        .constructor()
        .map(|method| binder.method(method))
        .transpose()?;
    let methods = interface
        .methods()
        .map(|method| binder.method(method))
        .collect::<Result<Vec<_>, _>>()?;
    let events = interface
        .events()
        .map(|event| binder.event(event))
        .collect::<Result<Vec<_>, _>>()?;

    let binding = ContractBinding {
        type_name: type_name.to_string(),
        interface: interface.clone(),
        class: None,
        constructor,
        methods,
        events,
        structs: binder.structs.into_values().collect(),
    };
    tracing::debug!(
        target: "starkbind::codegen",
        contract = type_name,
        calls = binding.calls().count(),
        transacts = binding.transacts().count(),
        events = binding.events.len(),
        structs = binding.structs.len(),
        "Bound contract"
    );
    Ok(binding)
}

struct Binder<'a> {
    interface: &'a Interface,
    structs: BTreeMap<String, StructBinding>,
    /// Structs whose members are being bound; breaks cycles through arrays.
    pending: BTreeSet<String>,
}

impl Binder<'_> {
    fn method(&mut self, method: &Method) -> Result<MethodBinding, CodegenError> {
        Ok(MethodBinding {
            name: method.name.clone(),
            normalized: normalize_name(&method.name),
            read_only: method.is_view(),
            inputs: self.fields(&method.inputs, |i, arg| {
                arg.name.clone().unwrap_or_else(|| format!("arg{i}"))
            })?,
            outputs: self.fields(&method.outputs, |i, _| format!("ret{i}"))?,
        })
    }

    fn event(&mut self, event: &Event) -> Result<EventBinding, CodegenError> {
        Ok(EventBinding {
            name: event.name.clone(),
            normalized: normalize_name(&event.name),
            selector_name: event
                .name
                .rsplit("::")
                .next()
                .unwrap_or(event.name.as_str())
                .to_string(),
            is_enum: event.is_enum(),
            keys: self.fields(&event.keys, field_name)?,
            data: self.fields(&event.data, field_name)?,
        })
    }

    fn fields(
        &mut self,
        args: &[Argument],
        name: impl Fn(usize, &Argument) -> String,
    ) -> Result<Vec<FieldBinding>, CodegenError> {
        args.iter()
            .enumerate()
            .map(|(i, arg)| {
                Ok(FieldBinding {
                    name: name(i, arg),
                    cairo_type: arg.ty.clone(),
                    host_type: self.host(&arg.ty)?,
                })
            })
            .collect()
    }

    fn host(&mut self, type_string: &str) -> Result<HostType, CodegenError> {
        let ty = Type::resolve(type_string).map_err(|err| {
            CodegenError::template(format!("cannot bind type: {err}"), type_string)
        })?;
        map_type(&ty, &mut |name: &str| self.bind_struct(name))
    }

    fn bind_struct(&mut self, name: &str) -> Result<HostType, CodegenError> {
        let interface = self.interface;
        let def = interface.resolve_struct(name).ok_or_else(|| {
            CodegenError::template("cannot bind type: no struct definition in the ABI", name)
        })?;
        let normalized = normalize_name(&def.name);
        if !self.structs.contains_key(&def.name) && self.pending.insert(def.name.clone()) {
            let members = self.fields(&def.members, field_name)?;
            self.pending.remove(&def.name);
            self.structs.insert(
                def.name.clone(),
                StructBinding {
                    name: def.name.clone(),
                    normalized: normalized.clone(),
                    members,
                },
            );
        }
        Ok(HostType::Struct(normalized))
    }
}

fn field_name(i: usize, arg: &Argument) -> String {
    arg.name.clone().unwrap_or_else(|| format!("field{i}"))
}
