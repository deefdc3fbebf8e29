use folio::schema::TypeDef;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::type_utils::{all_method_name, find_method_name, type_struct_name};

/// Generate the StoreExt trait with typed accessors for every document type.
pub fn generate_store_ext(type_defs: &[TypeDef]) -> TokenStream {
    let mut trait_methods = Vec::new();
    let mut impl_methods = Vec::new();

    for def in type_defs {
        let all_ident = format_ident!("{}", all_method_name(&def.name));
        let find_ident = format_ident!("{}", find_method_name(&def.name));
        let struct_ident = format_ident!("{}", type_struct_name(&def.name));
        let all_doc = format!(" Every `{}` document, in file order.", def.name);
        let find_doc = format!(" The `{}` document with the given flattened path.", def.name);

        trait_methods.push(quote! {
            #[doc = #all_doc]
            fn #all_ident(&self) -> folio::Result<Vec<#struct_ident>>;
            #[doc = #find_doc]
            fn #find_ident(&self, flattened_path: &str) -> folio::Result<Option<#struct_ident>>;
        });

        impl_methods.push(quote! {
            fn #all_ident(&self) -> folio::Result<Vec<#struct_ident>> {
                self.store().typed(#struct_ident::TYPE_NAME)
            }

            fn #find_ident(&self, flattened_path: &str) -> folio::Result<Option<#struct_ident>> {
                self.store()
                    .find_by_path(#struct_ident::TYPE_NAME, flattened_path)?
                    .map(|doc| serde_json::from_value(doc.to_json()).map_err(folio::FolioError::from))
                    .transpose()
            }
        });
    }

    quote! {
        /// Extension trait providing typed document accessors.
        pub trait StoreExt {
            fn store(&self) -> &folio::DocumentStore;

            #(#trait_methods)*
        }

        impl StoreExt for folio::DocumentStore {
            fn store(&self) -> &folio::DocumentStore {
                self
            }

            #(#impl_methods)*
        }
    }
}
