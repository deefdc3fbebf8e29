//! folio code generation - typed Rust structs from a `folio.yaml` configuration.
//!
//! The main entry point is [`generate_from_config`], which reads the config
//! and writes a Rust source file with one struct per document type, value
//! enums for `enum` fields, and a `StoreExt` trait with `all_<plural>()` and
//! `find_<type>()` accessors on [`folio::DocumentStore`].

mod enum_gen;
mod generator;
mod store_gen;
mod struct_gen;
pub mod type_utils;

use folio::FolioConfig;
use std::path::Path;

/// Generate Rust types from a `folio.yaml` file.
///
/// Reads the config at `config_path`, generates typed Rust code, and writes
/// the output to `output_path`. This is intended to be called from a
/// `build.rs` build script. The generated code uses `serde` and `serde_json`
/// from the calling crate.
///
/// # Example
///
/// ```no_run
/// // In build.rs:
/// folio_codegen::generate_from_config("folio.yaml", "src/content.rs").unwrap();
/// ```
pub fn generate_from_config(
    config_path: &str,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = FolioConfig::load(Path::new(config_path))?;
    let type_defs = config.type_defs()?;
    generator::check_type_defs(&type_defs)?;
    let tokens = generator::generate_all(&type_defs);
    let formatted = generator::format_token_stream(&tokens);
    std::fs::write(output_path, formatted)?;
    Ok(())
}

/// Generate Rust types from config YAML text.
///
/// Like [`generate_from_config`] but takes the config content directly
/// and returns the generated source.
pub fn generate_from_config_str(config_yaml: &str) -> Result<String, Box<dyn std::error::Error>> {
    let config = FolioConfig::from_str_in(config_yaml, ".")?;
    let type_defs = config.type_defs()?;
    generator::check_type_defs(&type_defs)?;
    let tokens = generator::generate_all(&type_defs);
    Ok(generator::format_token_stream(&tokens))
}
