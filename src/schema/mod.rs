//! Schema assembly: registries, the multi-pass assembler and the
//! resulting schema model.

pub mod meta;
pub mod model;

mod args;
mod assembler;
mod connection;
mod fragment;
mod interfaces;
mod registry;
mod visibility;

pub use self::{
    assembler::{ResolverValidationOptions, Schema, SchemaOptions, make_schemas},
    fragment::Fragment,
};
