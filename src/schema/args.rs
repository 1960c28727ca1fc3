//! `$default` argument expansion.
//!
//! An args map may carry a `$default` token list. `$paging`, `$order` and
//! `$sort` expand to fixed argument sets; any other token names a field
//! to inherit from the owning type. Inherited arguments lose their
//! required marker unless the token itself carries a trailing `!`.

use arcstr::ArcStr;
use compact_str::CompactString;
use indexmap::IndexMap;

use super::{interfaces, registry::SchemaVariant};
use crate::{
    declare::{FieldEntry, TypeDecl},
    defaults,
    error::SchemaError,
};

/// Expands the `$default` tokens of an args map.
///
/// `owner_type_name` is the bare name of the field's declared type; when
/// it names `<X>Connection`, fields not found on the connection itself
/// are looked up on the underlying `<X>` type. Tokens naming fields the
/// owner doesn't have are skipped silently; `$default` lists are applied
/// generically across field groups of varying shape.
pub(crate) fn expand_args(
    args: Option<&IndexMap<ArcStr, FieldEntry>>,
    tokens: &[CompactString],
    owner_type_name: Option<&str>,
    variant: &SchemaVariant,
    arena: &SchemaVariant,
) -> Result<IndexMap<ArcStr, FieldEntry>, SchemaError> {
    let mut args = args.cloned().unwrap_or_default();
    if tokens.is_empty() {
        return Ok(args);
    }

    let owner = OwnerFields::resolve(owner_type_name, variant, arena)?;

    for token in tokens {
        match token.as_str() {
            "$paging" => apply_template(&mut args, defaults::paging_args()),
            "$order" => apply_template(&mut args, defaults::order_args()),
            "$sort" => apply_template(&mut args, defaults::sort_args()),
            token => {
                let (name, enforce_required) = match token.strip_suffix('!') {
                    Some(base) => (base, true),
                    None => (token, false),
                };
                if args.contains_key(name) {
                    continue;
                }
                let Some(entry) = owner.get(name) else {
                    continue;
                };
                let inherited = if enforce_required {
                    entry.clone().enforce_required()
                } else {
                    entry.clone().strip_required()
                };
                args.insert(ArcStr::from(name), inherited);
            }
        }
    }

    Ok(args)
}

/// Template arguments only fill keys that aren't already present.
fn apply_template(args: &mut IndexMap<ArcStr, FieldEntry>, template: IndexMap<ArcStr, FieldEntry>) {
    for (name, entry) in template {
        args.entry(name).or_insert(entry);
    }
}

/// The owner type's merged fields, plus the connection's node-type
/// fallback.
struct OwnerFields {
    primary: IndexMap<ArcStr, FieldEntry>,
    fallback: IndexMap<ArcStr, FieldEntry>,
}

impl OwnerFields {
    fn resolve(
        owner_type_name: Option<&str>,
        variant: &SchemaVariant,
        arena: &SchemaVariant,
    ) -> Result<Self, SchemaError> {
        let mut owner = Self {
            primary: IndexMap::new(),
            fallback: IndexMap::new(),
        };
        let Some(name) = owner_type_name else {
            return Ok(owner);
        };

        if let Some(decl) = variant.types.get(name) {
            owner.primary = type_merged_fields(decl, arena)?;
        }
        if let Some(node_name) = name.strip_suffix("Connection") {
            if let Some(decl) = variant.types.get(node_name) {
                owner.fallback = type_merged_fields(decl, arena)?;
            }
        }

        Ok(owner)
    }

    fn get(&self, name: &str) -> Option<&FieldEntry> {
        self.primary.get(name).or_else(|| self.fallback.get(name))
    }
}

fn type_merged_fields(
    decl: &TypeDecl,
    arena: &SchemaVariant,
) -> Result<IndexMap<ArcStr, FieldEntry>, SchemaError> {
    let chain = interfaces::implementation_chain(&decl.implements, &arena.interfaces)?;
    Ok(interfaces::merged_fields(&decl.fields, &chain, &arena.interfaces))
}
