//! Skeleton files for new schema types.

use log::debug;
use proc_macro2::Span;
use syn::Ident;

use crate::context::{Context, declared_types};
use crate::errors::{Result, SchemastError};
use crate::naming::to_snake_case;

impl Context {
    /// Create a new schema type with empty `fields` and `edges` lists.
    ///
    /// The skeleton is registered under `<snake_case(type_name)>.rs` and can be
    /// edited with [`Context::append_field`] right away.
    pub fn add_type(&mut self, type_name: &str) -> Result<()> {
        let unit = unit_name(type_name);
        if self.declares_type(type_name) || self.is_new_type(type_name) {
            return Err(SchemastError::NameCollision {
                name: type_name.to_string(),
            });
        }
        if self.file(&unit).is_some() {
            return Err(SchemastError::NameCollision { name: unit });
        }

        let body = skeleton(type_name, &self.runtime, &self.namespace);
        let syntax = syn::parse_file(&body)?;
        if !declared_types(&syntax).contains(type_name) {
            return Err(SchemastError::ParseFailure(syn::Error::new(
                Span::call_site(),
                format!("skeleton for {type_name:?} does not declare the type"),
            )));
        }

        let idx = self.push_file(unit.clone(), body, syntax, true);
        self.register_new_type(type_name, idx);
        debug!("scaffolded type {type_name} as {unit}");
        Ok(())
    }
}

/// Source unit name of a scaffolded type (`GroupInfo` -> `group_info.rs`).
pub fn unit_name(type_name: &str) -> String {
    format!("{}.rs", to_snake_case(type_name))
}

fn skeleton(type_name: &str, runtime: &str, namespace: &Ident) -> String {
    format!(
        r#"use {runtime}::schema::{namespace};
use {runtime}::{{Edge, Field, Schema}};

pub struct {type_name};

impl Schema for {type_name} {{
    fn fields() -> Vec<Field> {{
        Vec::new()
    }}

    fn edges() -> Vec<Edge> {{
        Vec::new()
    }}
}}
"#
    )
}
