//! Configuration for the binding generator

use std::path::{Path, PathBuf};

use clap::Parser;
use convert_case::{Case, Casing};

/// Path value that selects stdin.
pub const STDIN: &str = "-";

/// Starknet contract binding generator
///
/// Reads a contract ABI (or a Sierra contract class containing one) and writes
/// a typed Rust client module.
#[derive(Parser, Debug)]
#[command(name = "starkbind-abigen")]
#[command(about = "Generate typed Rust bindings from a Starknet contract ABI", long_about = None)]
pub struct Config {
    /// Path to the ABI JSON, or `-` to read from stdin
    #[arg(long)]
    pub abi: String,

    /// Compiled contract class to embed in the bindings
    #[arg(long)]
    pub bin: Option<PathBuf>,

    /// Name of the generated contract type (defaults to the ABI file name)
    #[arg(long = "type")]
    pub type_name: Option<String>,

    /// Name of the generated module
    #[arg(long = "pkg", default_value = "main")]
    pub package: String,

    /// Output file (defaults to stdout)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Crate the generated code imports its runtime from
    #[arg(long, env = "STARKBIND_RUNTIME_CRATE", default_value = "starkbind")]
    pub runtime_crate: String,
}

impl Config {
    pub fn reads_stdin(&self) -> bool {
        self.abi == STDIN
    }

    /// Contract type name: `--type`, else the PascalCased ABI file name up to
    /// its first `.`, else the package name.
    pub fn type_name(&self) -> String {
        if let Some(name) = &self.type_name {
            return name.clone();
        }
        let stem = if self.reads_stdin() {
            None
        } else {
            Path::new(&self.abi)
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.split('.').next())
                .filter(|stem| !stem.is_empty())
        };
        stem.unwrap_or(self.package.as_str()).to_case(Case::Pascal)
    }
}
