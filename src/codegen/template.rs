//! The contract template: turns [`ContractBinding`]s into a token stream.

use convert_case::{Case, Casing};
use itertools::Itertools;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::binder::{ContractBinding, EventBinding, FieldBinding, MethodBinding, StructBinding};
use super::mapper::HostType;
use super::{CodegenError, GeneratorConfig};

/// Compiled once per [`Generator`](super::Generator) and reused for every
/// render.
#[derive(Debug, Clone)]
pub(crate) struct ContractTemplate {
    package: Ident,
    runtime: syn::Path,
}

impl ContractTemplate {
    pub(crate) fn compile(config: &GeneratorConfig) -> Result<Self, CodegenError> {
        let runtime_name = config.runtime_crate.replace('-', "_");
        let runtime = syn::parse_str::<syn::Path>(&runtime_name).map_err(|err| {
            CodegenError::template(
                format!("invalid runtime crate path: {err}"),
                &config.runtime_crate,
            )
        })?;
        Ok(Self {
            package: ident(&config.package)?,
            runtime,
        })
    }

    pub(crate) fn render(&self, contracts: &[ContractBinding]) -> Result<TokenStream, CodegenError> {
        let package = &self.package;
        let rt = &self.runtime;

        let mut module_items = Vec::new();
        let mut rendered = Vec::with_capacity(contracts.len());
        for contract in contracts {
            rendered.push(self.render_contract(contract, &mut module_items)?);
        }
        // Contracts in one module share identical struct definitions.
        let mut structs = Vec::new();
        for def in contracts.iter().flat_map(|c| &c.structs).unique() {
            let (struct_ty, tokens) = render_struct(rt, def)?;
            module_items.push(struct_ty);
            structs.push(tokens);
        }
        ensure_unique("module", &module_items)?;

        Ok(quote! {
            pub mod #package {
                #![allow(
                    dead_code,
                    non_snake_case,
                    unused_imports,
                    unused_mut,
                    unused_variables,
                    clippy::all
                )]

                use std::sync::Arc;

                use #rt::bind::{
                    decode_member, decode_next, struct_members, BindError, BoundContract, Call,
                    CallOpts, ContractCaller, ContractTransactor,
                };
                use #rt::{Felt, Interface, IntoValue, U256};

                #(#rendered)*

                #(#structs)*
            }
        })
    }

    fn render_contract(
        &self,
        contract: &ContractBinding,
        module_items: &mut Vec<Ident>,
    ) -> Result<TokenStream, CodegenError> {
        let rt = &self.runtime;
        let name = ident(&contract.type_name)?;
        let caller = format_ident!("{}Caller", name);
        let transactor = format_ident!("{}Transactor", name);
        let filterer = format_ident!("{}Filterer", name);
        let upper = contract.type_name.to_case(Case::UpperSnake);
        let abi_const = ident(&format!("{upper}_ABI"))?;

        let abi = serde_json::to_string(&contract.interface).map_err(|err| {
            CodegenError::template(
                format!("failed to serialize ABI of `{}`: {err}", contract.type_name),
                &contract.type_name,
            )
        })?;
        let class = match &contract.class {
            Some(class) => {
                let class_const = ident(&format!("{upper}_CLASS"))?;
                module_items.push(class_const.clone());
                Some(quote! { pub const #class_const: &str = #class; })
            }
            None => None,
        };
        module_items.extend([
            name.clone(),
            caller.clone(),
            transactor.clone(),
            filterer.clone(),
            abi_const.clone(),
        ]);

        let mut call_names = vec![format_ident!("with_opts")];
        let mut calls = Vec::new();
        for method in contract.calls() {
            let (fn_name, tokens) = render_call(method)?;
            call_names.push(fn_name);
            calls.push(tokens);
        }
        ensure_unique(&caller.to_string(), &call_names)?;

        let mut transact_names = Vec::new();
        let mut builders = Vec::new();
        let mut transacts = Vec::new();
        for method in contract.transacts() {
            let (fn_name, builder_name, builder, transact) = render_transact(method)?;
            transact_names.extend([fn_name, builder_name]);
            builders.push(builder);
            transacts.push(transact);
        }
        ensure_unique(&transactor.to_string(), &transact_names)?;

        let mut parser_names = Vec::new();
        let mut parsers = Vec::new();
        let mut event_structs = Vec::new();
        for event in contract.events.iter().filter(|e| !e.is_enum) {
            let (event_ty, parser_name, event_struct, parser) = render_event(rt, event)?;
            module_items.push(event_ty);
            parser_names.push(parser_name);
            event_structs.push(event_struct);
            parsers.push(parser);
        }
        ensure_unique(&filterer.to_string(), &parser_names)?;

        let constructor = contract
            .constructor
            .as_ref()
            .map(|ctor| {
                let (params, values) = params_and_values(&ctor.inputs)?;
                Ok::<_, CodegenError>(quote! {
                    impl #name<()> {
                        /// Calldata for deploying this contract.
                        pub fn constructor_calldata(#(#params),*) -> Result<Vec<Felt>, BindError> {
                            #rt::bind::constructor_calldata(#abi_const, &[#(#values),*])
                        }
                    }
                })
            })
            .transpose()?;

        Ok(quote! {
            pub const #abi_const: &str = #abi;
            #class

            #[derive(Debug, Clone)]
            pub struct #name<B> {
                pub caller: #caller<B>,
                pub transactor: #transactor<B>,
                pub filterer: #filterer,
            }

            impl<B: Clone> #name<B> {
                pub fn new(address: Felt, backend: B) -> Result<Self, BindError> {
                    let interface: Interface = #abi_const.parse()?;
                    let contract = BoundContract::new(address, Arc::new(interface), backend);
                    Ok(Self {
                        filterer: #filterer { contract: contract.with_backend(()) },
                        transactor: #transactor { contract: contract.clone() },
                        caller: #caller { contract, opts: CallOpts::default() },
                    })
                }

                pub fn address(&self) -> Felt {
                    self.caller.contract.address()
                }
            }

            #constructor

            #[derive(Debug, Clone)]
            pub struct #caller<B> {
                contract: BoundContract<B>,
                pub opts: CallOpts,
            }

            impl<B> #caller<B> {
                pub fn with_opts(mut self, opts: CallOpts) -> Self {
                    self.opts = opts;
                    self
                }
            }

            impl<B: ContractCaller> #caller<B> {
                #(#calls)*
            }

            #[derive(Debug, Clone)]
            pub struct #transactor<B> {
                contract: BoundContract<B>,
            }

            impl<B> #transactor<B> {
                #(#builders)*
            }

            impl<B: ContractTransactor> #transactor<B> {
                #(#transacts)*
            }

            #[derive(Debug, Clone)]
            pub struct #filterer {
                contract: BoundContract<()>,
            }

            impl #filterer {
                #(#parsers)*
            }

            #(#event_structs)*
        })
    }
}

/// Rust fn name of a method: the normalized name in snake case.
fn method_name(method: &MethodBinding) -> String {
    method.normalized.to_case(Case::Snake)
}

fn render_call(method: &MethodBinding) -> Result<(Ident, TokenStream), CodegenError> {
    let fn_name = ident(&method_name(method))?;
    let cairo_name = &method.name;
    let doc = format!(" Calls the `{cairo_name}` view entry point.");
    let (params, values) = params_and_values(&method.inputs)?;
    let call = quote! { self.contract.call(&self.opts, #cairo_name, &[#(#values),*]).await? };

    let (ret, body) = match method.outputs.as_slice() {
        [] => (quote! { () }, quote! { #call; Ok(()) }),
        [single] => {
            let ty = host_tokens(&single.host_type)?;
            (
                ty,
                quote! {
                    let mut out = #call.into_iter();
                    decode_next(&mut out)
                },
            )
        }
        many => {
            let tys = many
                .iter()
                .map(|f| host_tokens(&f.host_type))
                .collect::<Result<Vec<_>, _>>()?;
            let decodes = tys.iter().map(|_| quote! { decode_next(&mut out)? });
            (
                quote! { (#(#tys),*) },
                quote! {
                    let mut out = #call.into_iter();
                    Ok((#(#decodes),*))
                },
            )
        }
    };

    let tokens = quote! {
        #[doc = #doc]
        pub async fn #fn_name(&self, #(#params),*) -> Result<#ret, BindError> {
            #body
        }
    };
    Ok((fn_name, tokens))
}

fn render_transact(
    method: &MethodBinding,
) -> Result<(Ident, Ident, TokenStream, TokenStream), CodegenError> {
    let fn_name = ident(&method_name(method))?;
    let builder_name = ident(&format!("{}_call", method_name(method)))?;
    let cairo_name = &method.name;
    let (params, values) = params_and_values(&method.inputs)?;

    let builder_doc = format!(" Encodes a call to `{cairo_name}` without sending it.");
    let builder = quote! {
        #[doc = #builder_doc]
        pub fn #builder_name(&self, #(#params),*) -> Result<Call, BindError> {
            self.contract.build_call(#cairo_name, &[#(#values),*])
        }
    };

    let doc = format!(" Invokes `{cairo_name}` and returns the transaction hash.");
    let transact = quote! {
        #[doc = #doc]
        pub async fn #fn_name(&self, #(#params),*) -> Result<Felt, BindError> {
            self.contract.transact(#cairo_name, &[#(#values),*]).await
        }
    };
    Ok((fn_name, builder_name, builder, transact))
}

fn render_event(
    rt: &syn::Path,
    event: &EventBinding,
) -> Result<(Ident, Ident, TokenStream, TokenStream), CodegenError> {
    let event_ty = ident(&event.normalized)?;
    let parser_name = ident(&format!("parse_{}", event.normalized.to_case(Case::Snake)))?;
    let event_name = &event.name;
    let selector_name = &event.selector_name;

    let key_fields = fields(&event.keys)?;
    let data_fields = fields(&event.data)?;
    let all_names: Vec<Ident> = key_fields
        .iter()
        .chain(&data_fields)
        .map(|(name, _)| name.clone())
        .collect();
    ensure_unique(&event_ty.to_string(), &all_names)?;

    let members = key_fields
        .iter()
        .chain(&data_fields)
        .map(|(name, ty)| quote! { pub #name: #ty });
    let key_inits = key_fields
        .iter()
        .map(|(name, _)| quote! { #name: decode_next(&mut keys)? });
    let data_inits = data_fields
        .iter()
        .map(|(name, _)| quote! { #name: decode_next(&mut data)? });

    let event_struct = quote! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct #event_ty {
            #(#members),*
        }

        impl #event_ty {
            pub const NAME: &'static str = #event_name;

            pub fn event_selector() -> Result<Felt, BindError> {
                Ok(#rt::selector(#selector_name)?)
            }
        }
    };

    let doc = format!(" Decodes an emitted `{event_name}` event. `keys[0]` is the selector.");
    let parser = quote! {
        #[doc = #doc]
        pub fn #parser_name(&self, keys: &[Felt], data: &[Felt]) -> Result<#event_ty, BindError> {
            let (keys, data) = self.contract.decode_event(#event_ty::NAME, keys, data)?;
            let mut keys = keys.into_iter();
            let mut data = data.into_iter();
            Ok(#event_ty {
                #(#key_inits,)*
                #(#data_inits,)*
            })
        }
    };

    Ok((event_ty, parser_name, event_struct, parser))
}

fn render_struct(
    rt: &syn::Path,
    def: &StructBinding,
) -> Result<(Ident, TokenStream), CodegenError> {
    let struct_ty = ident(&def.normalized)?;
    let cairo_name = &def.name;
    let members = fields(&def.members)?;
    let names: Vec<Ident> = members.iter().map(|(name, _)| name.clone()).collect();
    ensure_unique(&struct_ty.to_string(), &names)?;
    let tys = members.iter().map(|(_, ty)| ty);
    let count = names.len();
    let doc = format!(" Generated from the `{cairo_name}` ABI struct.");

    let tokens = quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct #struct_ty {
            #(pub #names: #tys),*
        }

        impl IntoValue for #struct_ty {
            fn into_value(self) -> #rt::Value {
                #rt::Value::Struct(vec![#(self.#names.into_value()),*])
            }
        }

        impl #rt::FromValue for #struct_ty {
            fn from_value(value: #rt::Value) -> #rt::Result<Self> {
                let mut members = struct_members(value, #cairo_name, #count)?;
                Ok(Self {
                    #(#names: decode_member(&mut members, #cairo_name)?,)*
                })
            }
        }
    };
    Ok((struct_ty, tokens))
}

fn fields(fields: &[FieldBinding]) -> Result<Vec<(Ident, TokenStream)>, CodegenError> {
    fields
        .iter()
        .map(|f| Ok((ident(&f.name)?, host_tokens(&f.host_type)?)))
        .collect()
}

/// `name: Type` parameters and the matching `name.into_value()` expressions.
fn params_and_values(
    inputs: &[FieldBinding],
) -> Result<(Vec<TokenStream>, Vec<TokenStream>), CodegenError> {
    let fields = fields(inputs)?;
    let names: Vec<Ident> = fields.iter().map(|(name, _)| name.clone()).collect();
    ensure_unique("parameter list", &names)?;
    Ok(fields
        .into_iter()
        .map(|(name, ty)| (quote! { #name: #ty }, quote! { #name.into_value() }))
        .unzip())
}

fn host_tokens(host: &HostType) -> Result<TokenStream, CodegenError> {
    let token = host.to_string();
    syn::parse_str::<syn::Type>(&token)
        .map(|ty| quote! { #ty })
        .map_err(|err| CodegenError::template(format!("unrenderable type token: {err}"), token))
}

/// A Rust identifier for `name`, raw (`r#type`) when `name` is a keyword.
fn ident(name: &str) -> Result<Ident, CodegenError> {
    syn::parse_str::<Ident>(name)
        .or_else(|_| syn::parse_str::<Ident>(&format!("r#{name}")))
        .map_err(|err| {
            CodegenError::template(format!("`{name}` is not a valid identifier: {err}"), name)
        })
}

fn ensure_unique(group: &str, names: &[Ident]) -> Result<(), CodegenError> {
    let duplicates: Vec<String> = names.iter().map(ToString::to_string).duplicates().collect();
    if duplicates.is_empty() {
        return Ok(());
    }
    Err(CodegenError::template(
        format!("duplicate identifiers in {group}: {}", duplicates.join(", ")),
        names.iter().join(", "),
    ))
}
