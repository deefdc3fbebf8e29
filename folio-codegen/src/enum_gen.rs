use folio::schema::{FieldKind, FieldSpec, TypeDef};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::type_utils::{enum_type_name, enum_variant_ident};

/// Generate a value enum for every `enum` field, declared or computed.
pub fn generate_enums(type_defs: &[TypeDef]) -> TokenStream {
    let mut tokens = TokenStream::new();

    for def in type_defs {
        let computed = def.computed_fields.iter().map(|(name, c)| (name, &c.spec));
        for (field_name, spec) in def.fields.iter().map(|(n, s)| (n, s)).chain(computed) {
            if spec.kind == FieldKind::Enum {
                tokens.extend(generate_value_enum(&def.name, field_name, spec));
            }
        }
    }

    tokens
}

/// Generate a value enum like PostStatus.
fn generate_value_enum(type_name: &str, field_name: &str, spec: &FieldSpec) -> TokenStream {
    let type_ident = format_ident!("{}", enum_type_name(type_name, field_name));
    let options = spec.options.as_deref().unwrap_or_default();

    let variants: Vec<_> = options
        .iter()
        .map(|option| {
            let variant = enum_variant_ident(option);
            quote! {
                #[serde(rename = #option)]
                #variant
            }
        })
        .collect();

    let as_str_arms: Vec<_> = options
        .iter()
        .map(|option| {
            let variant = enum_variant_ident(option);
            quote! { Self::#variant => #option }
        })
        .collect();

    let default_impl = spec
        .default
        .as_ref()
        .and_then(|value| value.as_str())
        .filter(|value| options.iter().any(|o| o == value))
        .map(|value| {
            let default_variant = enum_variant_ident(value);
            quote! {
                impl Default for #type_ident {
                    fn default() -> Self {
                        Self::#default_variant
                    }
                }
            }
        });

    quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum #type_ident {
            #(#variants),*
        }

        impl #type_ident {
            pub fn as_str(&self) -> &'static str {
                match self {
                    #(#as_str_arms),*
                }
            }
        }

        #default_impl
    }
}
