use folio::schema::{pluralize, FieldKind, FieldSpec};
use heck::{ToPascalCase, ToSnakeCase};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Struct name for a document type.
/// e.g. "Post" -> "Post", "blog_post" -> "BlogPost"
pub fn type_struct_name(type_name: &str) -> String {
    type_name.to_pascal_case()
}

/// Accessor returning every document of a type.
/// e.g. "Post" -> "all_posts", "Category" -> "all_categories"
pub fn all_method_name(type_name: &str) -> String {
    format!("all_{}", pluralize(type_name).to_snake_case())
}

/// Accessor looking a single document up by flattened path.
/// e.g. "BlogPost" -> "find_blog_post"
pub fn find_method_name(type_name: &str) -> String {
    format!("find_{}", type_name.to_snake_case())
}

/// Generate an enum name from type name + field name.
/// e.g. ("Post", "status") -> "PostStatus"
pub fn enum_type_name(type_name: &str, field_name: &str) -> String {
    format!(
        "{}{}",
        type_name.to_pascal_case(),
        field_name.to_pascal_case()
    )
}

/// Map a field to its Rust type as a TokenStream.
pub fn field_to_rust_type(spec: &FieldSpec, type_name: &str, field_name: &str) -> TokenStream {
    let base_type = field_base_type(spec, type_name, field_name);

    // Lists default to an empty vec, json to null
    if is_optional(spec) && !matches!(spec.kind, FieldKind::List | FieldKind::Json) {
        quote! { Option<#base_type> }
    } else {
        base_type
    }
}

/// Optional without a default: the key may be absent from a document.
pub fn is_optional(spec: &FieldSpec) -> bool {
    !spec.required && spec.default.is_none()
}

/// Get the base Rust type (without Option wrapping) for a field.
pub fn field_base_type(spec: &FieldSpec, type_name: &str, field_name: &str) -> TokenStream {
    match spec.kind {
        FieldKind::Enum => {
            let ident = format_ident!("{}", enum_type_name(type_name, field_name));
            quote! { #ident }
        }
        FieldKind::List => {
            let item = spec.of.map(scalar_type).unwrap_or_else(|| quote! { serde_json::Value });
            quote! { Vec<#item> }
        }
        kind => scalar_type(kind),
    }
}

/// Dates stay strings: documents keep them as written.
fn scalar_type(kind: FieldKind) -> TokenStream {
    match kind {
        FieldKind::String | FieldKind::Date => quote! { String },
        FieldKind::Number => quote! { f64 },
        FieldKind::Boolean => quote! { bool },
        FieldKind::List | FieldKind::Enum | FieldKind::Json => quote! { serde_json::Value },
    }
}

/// Check if a field name is a Rust keyword and needs raw identifier syntax.
pub fn safe_field_ident(name: &str) -> proc_macro2::Ident {
    match name {
        "type" | "struct" | "enum" | "fn" | "let" | "mut" | "ref" | "super" | "mod" | "use"
        | "pub" | "impl" | "trait" | "for" | "loop" | "while" | "if" | "else" | "match"
        | "return" | "break" | "continue" | "as" | "in" | "where" | "async" | "await" | "dyn"
        | "move" | "static" | "const" | "unsafe" | "extern" | "true" | "false" | "abstract"
        | "become" | "box" | "do" | "final" | "macro" | "override" | "priv" | "typeof"
        | "unsized" | "virtual" | "yield" | "try" => format_ident!("r#{}", name),
        // Cannot be raw identifiers
        "self" | "Self" | "crate" => format_ident!("{}_", name),
        _ => {
            let snake = name.to_snake_case();
            if snake.starts_with(|c: char| c.is_ascii_digit()) {
                format_ident!("_{}", snake)
            } else {
                format_ident!("{}", snake)
            }
        }
    }
}

/// Enum variant for an option value. Options are arbitrary strings, so
/// a leading digit gets a `V` prefix.
pub fn enum_variant_ident(value: &str) -> proc_macro2::Ident {
    let pascal = value.to_pascal_case();
    if pascal.is_empty() || pascal.starts_with(|c: char| c.is_ascii_digit()) {
        format_ident!("V{}", pascal)
    } else {
        format_ident!("{}", pascal)
    }
}
