//! The visibility filter: decides which declarations a variant contains.

use arcstr::ArcStr;

use super::registry::SchemaVariant;
use crate::ast;

/// A type reference consulted by the orphan-reference guard.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Dependency<'a> {
    /// A raw reference string (or a bare type name).
    Raw(&'a str),
    /// A pre-resolved reference; passes unconditionally.
    Resolved,
}

/// Visibility decisions for one variant.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Visibility<'a> {
    pub variant: &'a SchemaVariant,
    pub default_name: &'a ArcStr,
}

impl Visibility<'_> {
    /// Whether a declaration with the given variant `membership` and type
    /// `dependencies` belongs in this variant.
    ///
    /// The default variant contains everything. Elsewhere, a declaration
    /// without a membership list is included iff `include_by_default`
    /// (fields and enum values opt out, top-level declarations opt in);
    /// with one, the variant must be listed and every dependency must
    /// resolve in this variant, so a declaration can never reference a
    /// type that is absent from the variant it appears in.
    pub fn should_contain(
        &self,
        membership: Option<&[ArcStr]>,
        dependencies: &[Dependency<'_>],
        include_by_default: bool,
    ) -> bool {
        if self.variant.name == *self.default_name {
            return true;
        }

        let Some(membership) = membership else {
            return include_by_default;
        };

        if !membership.contains(&self.variant.name) {
            return false;
        }

        dependencies.iter().all(|dep| self.resolves(dep))
    }

    fn resolves(&self, dependency: &Dependency<'_>) -> bool {
        match dependency {
            Dependency::Resolved => true,
            Dependency::Raw(raw) => match ast::type_name(raw) {
                Some(name) => self.variant.has_type_name(&name),
                None => false,
            },
        }
    }
}
