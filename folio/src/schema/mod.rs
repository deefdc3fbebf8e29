pub mod functions;
pub mod parser;
pub mod registry;
pub mod types;

pub use functions::FunctionTable;
pub use parser::{
    parse_schema, parse_schema_str, parse_type_defs, parse_type_defs_str, ComputedFieldDef, TypeDef,
};
pub use registry::{check_type_def, SchemaRegistry, SealedRegistry, TypeHandle, RESERVED_FIELDS};
pub use types::{
    collection_name, pluralize, ComputedField, DocumentType, FieldKind, FieldSpec, ResolveFn,
};
