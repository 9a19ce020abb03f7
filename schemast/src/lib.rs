//! Structural editing of schema declarations in Rust sources.
//!
//! Schema types declare their fields as chained constructor calls inside a
//! `fields` method:
//!
//! ```ignore
//! impl Schema for User {
//!     fn fields() -> Vec<Field> {
//!         vec![
//!             field::string("name").optional(),
//!             field::r#enum("status").values("active", "banned"),
//!         ]
//!     }
//! }
//! ```
//!
//! This crate turns a [`FieldDescriptor`] into such a call chain, appends it to
//! or removes it from the list of an existing type, and scaffolds new types.
//!
//! # Example
//!
//! ```ignore
//! let mut ctx = schemast::Context::load(Path::new("src/schema"))?;
//! ctx.add_type("Pet")?;
//! ctx.append_field("Pet", &FieldDescriptor::string("name").unique())?;
//! ctx.remove_field("User", "nickname")?;
//! ctx.print(Path::new("src/schema"))?;
//! ```

mod builder;
mod config;
mod context;
mod descriptor;
mod errors;
mod field;
mod naming;
mod scaffold;
mod splice;

pub use builder::BuilderCall;
pub use config::{SchemaSettings, SchemastConfig};
pub use context::{Context, DEFAULT_RUNTIME, FIELD_NAMESPACE, SchemaFile};
pub use descriptor::{EnumPair, FieldBatch, FieldDescriptor, FieldType};
pub use errors::{Result, SchemastError, UnsupportedFeature};
pub use field::{extract_field_name, field, field_expr};
pub use scaffold::unit_name;
