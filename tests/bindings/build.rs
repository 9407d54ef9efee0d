//! Build script for the generated bindings.
//!
//! Renders each ABI fixture under `tests/fixtures` into `OUT_DIR`, so the
//! crate always compiles what the generator currently emits.

use anyhow::Result;
use std::path::PathBuf;
use std::{env, fs};

use starkbind::codegen::{ContractSource, Generator, GeneratorConfig};

/// (module, contract type, fixture file)
const FIXTURES: &[(&str, &str, &str)] = &[
    ("shapes", "Shapes", "shapes.json"),
    ("erc20", "Erc20", "erc20.json"),
];

fn main() -> Result<()> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let fixtures_dir = manifest_dir.join("../fixtures");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    for (package, type_name, file) in FIXTURES {
        let path = fixtures_dir.join(file);
        println!("cargo:rerun-if-changed={}", path.display());

        let abi = fs::read_to_string(&path)?;
        let generator = Generator::new(GeneratorConfig {
            package: (*package).to_string(),
            ..GeneratorConfig::default()
        })?;
        let source = generator.bind(&[ContractSource::new(*type_name, abi)])?;
        fs::write(out_dir.join(format!("{package}.rs")), source)?;
    }
    Ok(())
}
