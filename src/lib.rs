//! GraphQL schema assembly library.
//!
//! `graphql-assembly` turns plain data declarations (types, inputs,
//! enums, interfaces, scalars, unions, operations and fragments,
//! typically scattered across modules) into fully linked, executable
//! schema variants.
//!
//! Declarations are loose records carrying a `graphql` kind
//! discriminator. The assembler classifies them once, resolves every
//! type reference, merges interface fields along `extends` chains,
//! synthesizes relay connection types, expands `$default` argument
//! placeholders, filters each named schema variant, and hands every
//! variant to the execution engine as an
//! [`ExecutableSchema`](schema::model::ExecutableSchema).
//!
//! ```rust
//! use graphql_assembly::{Declaration, Resolvers, SchemaOptions, Value, make_schemas};
//!
//! let entries = vec![
//!     Declaration::query("hello").returns("String").into(),
//! ];
//! let resolvers =
//!     Resolvers::new().field("Query", "hello", |_| Ok(Some(Value::from("world"))));
//!
//! let schemas = make_schemas(entries, resolvers, SchemaOptions::default())?;
//! let schema = &schemas["default"];
//! assert!(schema.query_type().field_by_name("hello").is_some());
//! # Ok::<(), graphql_assembly::SchemaError>(())
//! ```
//!
//! Malformed declarations abort the build with a [`SchemaError`]; an
//! incomplete type graph never reaches the engine.

pub mod ast;
pub mod declare;
mod defaults;
pub mod error;
pub mod resolve;
pub mod schema;
pub mod value;

#[cfg(test)]
mod tests;

pub use crate::{
    ast::TypeRef,
    declare::{
        Declaration, DefaultValue, EnumValueDefinition, EnumValueEntry, FieldDefinition,
        FieldEntry, RelayConnection, SchemaEntry, SelectionField, SelectionNode, TypeExpr,
    },
    error::SchemaError,
    resolve::{
        Arguments, FieldError, FieldResolver, FieldResult, ResolveParams, Resolvers, Subscription,
    },
    schema::{
        Fragment, ResolverValidationOptions, Schema, SchemaOptions, make_schemas,
        model::ExecutableSchema,
    },
    value::Value,
};
