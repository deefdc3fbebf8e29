use folio::schema::{collection_name, FieldKind, FieldSpec, TypeDef};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::type_utils::{
    enum_type_name, field_to_rust_type, is_optional, safe_field_ident, type_struct_name,
};

/// Generate a document struct for every type, in declaration order.
pub fn generate_structs(type_defs: &[TypeDef]) -> TokenStream {
    let mut tokens = TokenStream::new();
    for def in type_defs {
        tokens.extend(generate_type_struct(def));
    }
    tokens
}

/// Generate the struct for one document type: `_id`, `type`, declared
/// fields, computed fields, then `_raw` and `body`.
fn generate_type_struct(def: &TypeDef) -> TokenStream {
    let struct_ident = format_ident!("{}", type_struct_name(&def.name));
    let type_name = &def.name;
    let collection = collection_name(&def.name);

    let mut doc_comment = format!(" A `{}` document.\n Files: `{}`", def.name, def.file_path_pattern);
    if let Some(description) = &def.description {
        doc_comment = format!(" {description}\n\n{doc_comment}");
    }

    let declared = def
        .fields
        .iter()
        .map(|(field_name, spec)| generate_field_with_attrs(&def.name, field_name, spec));
    let computed = def.computed_fields.iter().map(|(field_name, computed)| {
        // Computed values are always present
        let spec = FieldSpec {
            required: true,
            ..computed.spec.clone()
        };
        generate_field_with_attrs(&def.name, field_name, &spec)
    });
    let field_tokens: Vec<_> = declared.chain(computed).collect();

    quote! {
        #[doc = #doc_comment]
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct #struct_ident {
            /// Source file path relative to the content root
            pub _id: String,
            #[serde(rename = "type")]
            pub r#type: String,
            #(#field_tokens)*
            pub _raw: folio::RawInfo,
            pub body: folio::Body,
        }

        impl #struct_ident {
            pub const TYPE_NAME: &'static str = #type_name;
            pub const COLLECTION: &'static str = #collection;

            pub fn flattened_path(&self) -> &str {
                &self._raw.flattened_path
            }
        }
    }
}

/// Generate a struct field with appropriate serde attributes.
fn generate_field_with_attrs(type_name: &str, field_name: &str, spec: &FieldSpec) -> TokenStream {
    let ident = safe_field_ident(field_name);
    let ty = field_to_rust_type(spec, type_name, field_name);
    let serde_attrs = generate_serde_attrs(type_name, field_name, spec);

    let ident_str = ident.to_string();
    let rename_attr = if ident_str.strip_prefix("r#").unwrap_or(&ident_str) != field_name {
        Some(quote! { #[serde(rename = #field_name)] })
    } else {
        None
    };

    let doc_attr = spec.description.as_ref().map(|d| {
        let d = format!(" {d}");
        quote! { #[doc = #d] }
    });

    quote! {
        #doc_attr
        #rename_attr
        #serde_attrs
        pub #ident: #ty,
    }
}

/// Generate serde attributes for a field.
fn generate_serde_attrs(type_name: &str, field_name: &str, spec: &FieldSpec) -> TokenStream {
    match spec.kind {
        FieldKind::List | FieldKind::Json if is_optional(spec) => quote! { #[serde(default)] },
        FieldKind::Enum if spec.default.is_some() && !spec.required => {
            let default_fn = format!("{}::default", enum_type_name(type_name, field_name));
            quote! { #[serde(default = #default_fn)] }
        }
        _ if is_optional(spec) => {
            quote! { #[serde(default, skip_serializing_if = "Option::is_none")] }
        }
        _ => quote! {},
    }
}
