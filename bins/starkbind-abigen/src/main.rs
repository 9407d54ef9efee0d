//! Starkbind ABI generator - typed Rust bindings for Starknet contracts
//!
//! # Usage
//!
//! ```bash
//! # Bindings for a Sierra contract class, written to a file
//! starkbind-abigen --abi target/dev/hello_starknet.contract_class.json --out src/hello.rs
//!
//! # Plain ABI from stdin, custom module and type names
//! cat abi.json | starkbind-abigen --abi - --pkg token --type Erc20
//! ```

mod config;

use std::fs;
use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::Config;
use starkbind::codegen::{ContractSource, Generator, GeneratorConfig};

fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let source = generate(&config)?;
    match &config.out {
        Some(path) => {
            fs::write(path, &source)
                .with_context(|| format!("Failed to write bindings to {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = source.len(), "Wrote bindings");
        }
        None => io::stdout()
            .write_all(source.as_bytes())
            .context("Failed to write bindings to stdout")?,
    }
    Ok(())
}

/// Read the inputs named by `config` and render the bindings.
fn generate(config: &Config) -> Result<String> {
    let raw = read_abi(config)?;
    let abi = extract_abi(&raw)?;
    let class = config
        .bin
        .as_ref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read contract class {}", path.display()))
        })
        .transpose()?;

    let type_name = config.type_name();
    tracing::info!(
        contract = %type_name,
        package = %config.package,
        runtime = %config.runtime_crate,
        "Generating bindings"
    );

    let generator = Generator::new(GeneratorConfig {
        package: config.package.clone(),
        runtime_crate: config.runtime_crate.clone(),
    })?;
    let mut source = ContractSource::new(type_name, abi);
    source.class = class;
    Ok(generator.bind(&[source])?)
}

fn read_abi(config: &Config) -> Result<String> {
    if config.reads_stdin() {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read ABI from stdin")?;
        return Ok(raw);
    }
    fs::read_to_string(&config.abi).with_context(|| format!("Failed to read ABI {}", config.abi))
}

/// Unwrap an `{"abi": ...}` envelope such as a Sierra contract class.
///
/// The envelope's `abi` is either the entry array itself or a string holding
/// its JSON encoding. Anything else is returned unchanged.
fn extract_abi(raw: &str) -> Result<String> {
    let document: serde_json::Value = serde_json::from_str(raw).context("ABI input is not JSON")?;
    let Some(abi) = document.as_object().and_then(|object| object.get("abi")) else {
        return Ok(raw.to_string());
    };
    match abi {
        serde_json::Value::Array(_) => Ok(abi.to_string()),
        serde_json::Value::String(encoded) => Ok(encoded.clone()),
        other => bail!("`abi` field must be an array or a JSON string, found {other}"),
    }
}
