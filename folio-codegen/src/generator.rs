use folio::schema::{check_type_def, FieldKind, FieldSpec, TypeDef};
use std::collections::HashSet;
use proc_macro2::TokenStream;
use quote::quote;

use crate::enum_gen::generate_enums;
use crate::store_gen::generate_store_ext;
use crate::struct_gen::generate_structs;
use crate::type_utils::{enum_type_name, enum_variant_ident, safe_field_ident, type_struct_name};

const HEADER: &str = "// @generated by folio-codegen. Do not edit.\n\n";

/// Generate the complete module for a set of document types.
pub fn generate_all(type_defs: &[TypeDef]) -> TokenStream {
    let enums = generate_enums(type_defs);
    let structs = generate_structs(type_defs);
    let store_ext = generate_store_ext(type_defs);

    quote! {
        use serde::{Deserialize, Serialize};

        #enums
        #structs
        #store_ext
    }
}

/// Run the schema checks of the registry, then reject definitions whose
/// generated identifiers would collide.
pub fn check_type_defs(type_defs: &[TypeDef]) -> Result<(), String> {
    let mut type_idents = HashSet::new();
    for def in type_defs {
        check_type_def(def).map_err(|e| e.to_string())?;

        let struct_name = type_struct_name(&def.name);
        if !type_idents.insert(struct_name.clone()) {
            return Err(format!("{}: type name '{struct_name}' is generated twice", def.name));
        }

        let mut field_idents: HashSet<String> = ["_id", "r#type", "_raw", "body"]
            .into_iter()
            .map(String::from)
            .collect();
        let fields = def
            .fields
            .iter()
            .map(|(n, s)| (n, s))
            .chain(def.computed_fields.iter().map(|(n, c)| (n, &c.spec)));
        for (name, spec) in fields {
            let ident = safe_field_ident(name).to_string();
            if !field_idents.insert(ident.clone()) {
                return Err(format!(
                    "{}: field '{name}' maps to the Rust field '{ident}', which is already used",
                    def.name
                ));
            }
            if spec.kind == FieldKind::Enum {
                check_enum(def, name, spec)?;
                let enum_name = enum_type_name(&def.name, name);
                if !type_idents.insert(enum_name.clone()) {
                    return Err(format!("{}: type name '{enum_name}' is generated twice", def.name));
                }
            }
        }
    }
    Ok(())
}

fn check_enum(def: &TypeDef, field: &str, spec: &FieldSpec) -> Result<(), String> {
    let mut variants = HashSet::new();
    for option in spec.options.iter().flatten() {
        let variant = enum_variant_ident(option).to_string();
        if !variants.insert(variant.clone()) {
            return Err(format!(
                "{}: options of '{field}' collide on the Rust variant '{variant}'",
                def.name
            ));
        }
    }
    Ok(())
}

/// Pretty-print generated tokens. Falls back to the raw token string when
/// the tokens do not parse as a file.
pub fn format_token_stream(tokens: &TokenStream) -> String {
    let body = match syn::parse2::<syn::File>(tokens.clone()) {
        Ok(file) => prettyplease::unparse(&file),
        Err(e) => {
            // Surfaces as a warning when run from a build script
            println!("cargo:warning=folio-codegen: generated code did not parse: {e}");
            tokens.to_string()
        }
    };
    format!("{HEADER}{body}")
}
