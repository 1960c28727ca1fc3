//! The assembled schema model handed to the query-execution engine.

use arcstr::ArcStr;
use fnv::FnvHashMap;
use indexmap::IndexMap;
use std::sync::Arc;

use super::{
    fragment::Fragment,
    meta::{InterfaceMeta, MetaType, ObjectMeta, UnionMeta},
};
use crate::{ast::TypeRef, value::Value};

/// A fully linked schema variant.
///
/// Immutable once built: a name → type registry, the three root type
/// slots, the variant's fragments and per-enum value tables. This is the
/// object the execution engine's `execute(schema, document, …)` consumes.
pub struct ExecutableSchema {
    pub(crate) variant: ArcStr,
    pub(crate) types: FnvHashMap<ArcStr, Arc<MetaType>>,
    pub(crate) query_type_name: ArcStr,
    pub(crate) mutation_type_name: ArcStr,
    pub(crate) subscription_type_name: ArcStr,
    pub(crate) fragments: IndexMap<ArcStr, Fragment>,
    pub(crate) enum_values: IndexMap<ArcStr, IndexMap<ArcStr, Value>>,
}

/// A type wrapped the way a reference position sees it.
#[derive(Clone)]
pub enum TypeType<'a> {
    /// A concrete named type.
    Concrete(&'a MetaType),
    /// A non-null wrapper.
    NonNull(Box<TypeType<'a>>),
    /// A list wrapper.
    List(Box<TypeType<'a>>),
}

impl<'a> TypeType<'a> {
    /// Unwraps to the innermost concrete type.
    pub fn innermost_concrete(&self) -> &'a MetaType {
        match self {
            Self::Concrete(t) => *t,
            Self::NonNull(inner) | Self::List(inner) => inner.innermost_concrete(),
        }
    }
}

impl ExecutableSchema {
    /// The variant this schema was assembled for.
    pub fn variant_name(&self) -> &ArcStr {
        &self.variant
    }

    /// Looks up a named type.
    pub fn type_by_name(&self, name: &str) -> Option<TypeType<'_>> {
        self.types.get(name).map(|t| TypeType::Concrete(t))
    }

    /// Looks up a named type's metadata.
    pub fn concrete_type_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name).map(AsRef::as_ref)
    }

    /// The query root type.
    pub fn query_type(&self) -> &MetaType {
        self.types
            .get(&self.query_type_name)
            .expect("Query type does not exist in schema")
    }

    /// The mutation root type.
    pub fn mutation_type(&self) -> &MetaType {
        self.types
            .get(&self.mutation_type_name)
            .expect("Mutation type does not exist in schema")
    }

    /// The subscription root type.
    pub fn subscription_type(&self) -> &MetaType {
        self.types
            .get(&self.subscription_type_name)
            .expect("Subscription type does not exist in schema")
    }

    /// Materializes a [`TypeRef`] against this schema's registry.
    ///
    /// # Panics
    ///
    /// Panics if the innermost name is not registered; the assembler
    /// guarantees that for every reference it emits.
    pub fn make_type(&self, ty: &TypeRef) -> TypeType<'_> {
        match ty {
            TypeRef::Named(n) => self.type_by_name(n).expect("Type not found in schema"),
            TypeRef::NonNullNamed(n) => TypeType::NonNull(Box::new(
                self.type_by_name(n).expect("Type not found in schema"),
            )),
            TypeRef::List(inner) => TypeType::List(Box::new(self.make_type(inner))),
            TypeRef::NonNullList(inner) => {
                TypeType::NonNull(Box::new(TypeType::List(Box::new(self.make_type(inner)))))
            }
        }
    }

    /// Every registered type.
    pub fn concrete_type_list(&self) -> Vec<&MetaType> {
        self.types.values().map(AsRef::as_ref).collect()
    }

    /// The concrete types an abstract type can resolve to.
    ///
    /// For a union these are its declared members; for an interface,
    /// every object type conforming to it. Empty for concrete types.
    pub fn possible_types(&self, ty: &MetaType) -> Vec<&MetaType> {
        match ty {
            MetaType::Union(UnionMeta { of_type_names, .. }) => of_type_names
                .iter()
                .filter_map(|n| self.concrete_type_by_name(n))
                .collect(),
            MetaType::Interface(InterfaceMeta { name, .. }) => self
                .types
                .values()
                .filter_map(|t| match t.as_ref() {
                    object @ MetaType::Object(ObjectMeta {
                        interface_names, ..
                    }) if interface_names.contains(name) => Some(object),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `possible` is one of `abstract_type`'s possible types.
    pub fn is_possible_type(&self, abstract_type: &MetaType, possible: &MetaType) -> bool {
        self.possible_types(abstract_type)
            .into_iter()
            .any(|t| std::ptr::eq(t, possible))
    }

    /// Looks up a fragment by name.
    pub fn fragment_by_name(&self, name: &str) -> Option<&Fragment> {
        self.fragments.get(name)
    }

    /// Every fragment assembled into this variant.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.values()
    }

    /// The name → value table of an assembled enum.
    pub fn enum_values(&self, enum_name: &str) -> Option<&IndexMap<ArcStr, Value>> {
        self.enum_values.get(enum_name)
    }

    /// Per-enum value tables, keyed by enum name.
    pub fn enum_data(&self) -> &IndexMap<ArcStr, IndexMap<ArcStr, Value>> {
        &self.enum_values
    }
}

impl std::fmt::Debug for ExecutableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableSchema")
            .field("variant", &self.variant)
            .field("types", &self.types.len())
            .field("fragments", &self.fragments.len())
            .finish_non_exhaustive()
    }
}
