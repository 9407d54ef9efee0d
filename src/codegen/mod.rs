//! Binding generation: [`binder`] derives per-method and per-event metadata,
//! the contract template renders it, and the result is validated with `syn`
//! and pretty-printed.

pub mod binder;
pub mod mapper;
mod template;

use crate::abi::Interface;

pub use binder::{
    bind_contract, normalize_name, ContractBinding, EventBinding, FieldBinding, MethodBinding,
    StructBinding,
};
pub use mapper::{cairo_to_host, host_to_cairo, map_type, HostType};

use template::ContractTemplate;

const HEADER: &str = "// Code generated by starkbind. DO NOT EDIT.\n\
// This file is a generated binding and any manual changes will be lost.\n\n";

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error(transparent)]
    Abi(#[from] crate::Error),
    #[error("template error: {message} (in `{content}`)")]
    Template { message: String, content: String },
    #[error("generated source is not valid Rust: {message}")]
    Format { message: String, buffer: String },
}

impl CodegenError {
    pub(crate) fn template(message: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Name of the generated module.
    pub package: String,
    /// Crate (or path) the generated code imports its runtime from.
    pub runtime_crate: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            package: "main".to_string(),
            runtime_crate: "starkbind".to_string(),
        }
    }
}

/// One contract to generate bindings for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSource {
    pub type_name: String,
    /// ABI JSON document.
    pub abi: String,
    /// Compiled class to embed, if any.
    pub class: Option<String>,
}

impl ContractSource {
    pub fn new(type_name: impl Into<String>, abi: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            abi: abi.into(),
            class: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

/// Renders bindings with one compiled template.
#[derive(Debug, Clone)]
pub struct Generator {
    template: ContractTemplate,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self, CodegenError> {
        Ok(Self {
            template: ContractTemplate::compile(&config)?,
        })
    }

    pub fn render(&self, contracts: &[ContractBinding]) -> Result<String, CodegenError> {
        let tokens = self.template.render(contracts)?;
        let source = format_source(&tokens.to_string())?;
        tracing::debug!(
            target: "starkbind::codegen",
            contracts = contracts.len(),
            bytes = source.len(),
            "Rendered bindings"
        );
        Ok(source)
    }

    /// Parse, bind and render every source into a single module.
    pub fn bind(&self, sources: &[ContractSource]) -> Result<String, CodegenError> {
        let bindings = sources
            .iter()
            .map(|source| {
                let interface: Interface = source.abi.parse()?;
                let binding = bind_contract(&source.type_name, &interface)?;
                Ok(match &source.class {
                    Some(class) => binding.with_class(class.as_str()),
                    None => binding,
                })
            })
            .collect::<Result<Vec<_>, CodegenError>>()?;
        self.render(&bindings)
    }
}

/// Validate Rust source and pretty-print it under the generated-code header.
pub fn format_source(buffer: &str) -> Result<String, CodegenError> {
    let file = syn::parse_file(buffer).map_err(|err| CodegenError::Format {
        message: err.to_string(),
        buffer: buffer.to_string(),
    })?;
    Ok(format!("{HEADER}{}", prettyplease::unparse(&file)))
}
