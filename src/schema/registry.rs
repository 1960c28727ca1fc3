//! Declaration registries: the arena every declaration is filed into,
//! and the per-variant views collected out of it.

use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::{
    declare::{
        EnumDecl, FragmentDecl, InputDecl, InterfaceDecl, OperationKind, ScalarDecl, TypeDecl,
        UnionDecl,
    },
    defaults,
};

/// The owned declaration arena.
///
/// Classification files every declaration in here exactly once,
/// regardless of which variants it targets; the arena then freezes into
/// the `default` variant, and other variants are collected from it by
/// the visibility filter.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    pub types: IndexMap<ArcStr, TypeDecl>,
    pub input_types: IndexMap<ArcStr, InputDecl>,
    pub enums: IndexMap<ArcStr, EnumDecl>,
    pub interfaces: IndexMap<ArcStr, InterfaceDecl>,
    pub scalars: IndexMap<ArcStr, ScalarDecl>,
    pub unions: IndexMap<ArcStr, UnionDecl>,
    pub fragments: IndexMap<ArcStr, FragmentDecl>,
}

impl Arena {
    /// Creates an arena pre-seeded with empty `Query`/`Mutation`/
    /// `Subscription` root types, members of every known variant.
    pub fn with_root_types(variant_names: &[ArcStr]) -> Self {
        let mut arena = Self::default();
        for (kind, description) in [
            (
                OperationKind::Query,
                "The query root of this GraphQL interface.",
            ),
            (
                OperationKind::Mutation,
                "The mutation root of this GraphQL interface.",
            ),
            (
                OperationKind::Subscription,
                "The subscription root of this GraphQL interface.",
            ),
        ] {
            let name = kind.root_type_name();
            arena.types.insert(
                name.clone(),
                TypeDecl {
                    name,
                    description: Some(description.into()),
                    schemas: Some(variant_names.to_vec()),
                    fields: IndexMap::new(),
                    implements: Vec::new(),
                    relay_connection: None,
                    is_type_of: None,
                },
            );
        }
        arena
    }

    /// The root type an operation declaration is filed onto.
    pub fn root_mut(&mut self, kind: OperationKind) -> &mut TypeDecl {
        self.types
            .get_mut(&kind.root_type_name())
            .expect("root types are seeded at construction")
    }

    /// Freezes the arena into the shared default-variant registry.
    pub fn freeze(self, default_name: ArcStr) -> SchemaVariant {
        SchemaVariant {
            name: default_name,
            types: share(self.types),
            input_types: share(self.input_types),
            enums: share(self.enums),
            interfaces: share(self.interfaces),
            scalars: share(self.scalars),
            unions: share(self.unions),
            fragments: share(self.fragments),
        }
    }
}

fn share<T>(bucket: IndexMap<ArcStr, T>) -> IndexMap<ArcStr, Arc<T>> {
    bucket.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()
}

/// A named variant's view of the declaration arena.
///
/// Declarations are `Arc`-shared with the arena; only synthesized relay
/// connection types are variant-local.
#[derive(Clone, Debug)]
pub(crate) struct SchemaVariant {
    pub name: ArcStr,
    pub types: IndexMap<ArcStr, Arc<TypeDecl>>,
    pub input_types: IndexMap<ArcStr, Arc<InputDecl>>,
    pub enums: IndexMap<ArcStr, Arc<EnumDecl>>,
    pub interfaces: IndexMap<ArcStr, Arc<InterfaceDecl>>,
    pub scalars: IndexMap<ArcStr, Arc<ScalarDecl>>,
    pub unions: IndexMap<ArcStr, Arc<UnionDecl>>,
    pub fragments: IndexMap<ArcStr, Arc<FragmentDecl>>,
}

impl SchemaVariant {
    pub fn empty(name: ArcStr) -> Self {
        Self {
            name,
            types: IndexMap::new(),
            input_types: IndexMap::new(),
            enums: IndexMap::new(),
            interfaces: IndexMap::new(),
            scalars: IndexMap::new(),
            unions: IndexMap::new(),
            fragments: IndexMap::new(),
        }
    }

    /// Whether `name` resolves to anything visible from this variant:
    /// a built-in, or an entry in any declaration bucket.
    pub fn has_type_name(&self, name: &str) -> bool {
        defaults::builtin_scalar(name).is_some()
            || defaults::builtin_type(name).is_some()
            || self.scalars.contains_key(name)
            || self.enums.contains_key(name)
            || self.interfaces.contains_key(name)
            || self.input_types.contains_key(name)
            || self.types.contains_key(name)
            || self.unions.contains_key(name)
    }

    /// Resolves a bare type name to its canonical registered name.
    ///
    /// Built-in scalars win first (their lookup is case-insensitive, so
    /// the canonical spelling may differ from the reference); then the
    /// variant's own buckets; built-in object types come last.
    pub fn canonical_type_name(&self, name: &str) -> Option<ArcStr> {
        if let Some(scalar) = defaults::builtin_scalar(name) {
            return Some(scalar.name().clone());
        }

        let own = self
            .scalars
            .get_key_value(name)
            .map(|(k, _)| k)
            .or_else(|| self.enums.get_key_value(name).map(|(k, _)| k))
            .or_else(|| self.interfaces.get_key_value(name).map(|(k, _)| k))
            .or_else(|| self.input_types.get_key_value(name).map(|(k, _)| k))
            .or_else(|| self.types.get_key_value(name).map(|(k, _)| k))
            .or_else(|| self.unions.get_key_value(name).map(|(k, _)| k));
        if let Some(key) = own {
            return Some(key.clone());
        }

        defaults::builtin_type(name).map(|t| t.name().clone())
    }
}
