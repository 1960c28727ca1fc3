//! Interface extension chains and field merging.

use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::{
    declare::{FieldEntry, InterfaceDecl},
    error::SchemaError,
};

/// Resolves the full extension chain of an interface: itself first, then
/// its ancestors in depth-first order, each listed once.
///
/// `processing` is the currently-visiting set of the depth-first walk;
/// revisiting a member means the `extends` graph has a cycle.
pub(crate) fn extension_chain(
    name: &ArcStr,
    interfaces: &IndexMap<ArcStr, Arc<InterfaceDecl>>,
    processing: &mut Vec<ArcStr>,
) -> Result<Vec<ArcStr>, SchemaError> {
    if processing.contains(name) {
        return Err(SchemaError::CyclicInterfaceExtension { name: name.clone() });
    }
    let Some(decl) = interfaces.get(name) else {
        return Err(SchemaError::UndefinedInterface { name: name.clone() });
    };

    processing.push(name.clone());
    let mut chain = vec![name.clone()];
    for parent in &decl.extends {
        for ancestor in extension_chain(parent, interfaces, processing)? {
            if !chain.contains(&ancestor) {
                chain.push(ancestor);
            }
        }
    }
    processing.pop();

    Ok(chain)
}

/// Concatenated, deduplicated chains of every interface a type
/// implements, preserving first-seen order.
pub(crate) fn implementation_chain(
    implements: &[ArcStr],
    interfaces: &IndexMap<ArcStr, Arc<InterfaceDecl>>,
) -> Result<Vec<ArcStr>, SchemaError> {
    let mut chain = Vec::new();
    for name in implements {
        let mut processing = Vec::new();
        for member in extension_chain(name, interfaces, &mut processing)? {
            if !chain.contains(&member) {
                chain.push(member);
            }
        }
    }
    Ok(chain)
}

/// Merges `own_fields` over the fields inherited along `chain`.
///
/// The chain is walked in reverse, so ancestor fields land first and each
/// more specific interface overwrites same-named ones; the owner's own
/// fields win over everything inherited.
pub(crate) fn merged_fields(
    own_fields: &IndexMap<ArcStr, FieldEntry>,
    chain: &[ArcStr],
    interfaces: &IndexMap<ArcStr, Arc<InterfaceDecl>>,
) -> IndexMap<ArcStr, FieldEntry> {
    let mut merged = IndexMap::new();

    for name in chain.iter().rev() {
        if let Some(decl) = interfaces.get(name) {
            for (field_name, entry) in &decl.fields {
                merge_entry(&mut merged, field_name, entry.clone());
            }
        }
    }
    for (field_name, entry) in own_fields {
        merge_entry(&mut merged, field_name, entry.clone());
    }

    merged
}

fn merge_entry(merged: &mut IndexMap<ArcStr, FieldEntry>, name: &ArcStr, entry: FieldEntry) {
    let entry = match merged.get(name) {
        Some(base) => entry.merged_over(base.clone()),
        None => entry,
    };
    merged.insert(name.clone(), entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{ClassifiedItem, Declaration};

    fn interface_bucket(decls: Vec<Declaration>) -> IndexMap<ArcStr, Arc<InterfaceDecl>> {
        decls
            .into_iter()
            .map(|decl| {
                let ClassifiedItem::Interface(i) = decl.classify(None).unwrap() else {
                    panic!("expected an interface");
                };
                (i.name.clone(), Arc::new(i))
            })
            .collect()
    }

    #[test]
    fn chain_lists_self_then_ancestors_once() {
        let interfaces = interface_bucket(vec![
            Declaration::interface("Node").field("id", "ID!"),
            Declaration::interface("Timestamped")
                .extends(["Node"])
                .field("createdAt", "DateTime"),
            Declaration::interface("Content")
                .extends(["Timestamped", "Node"])
                .field("body", "String"),
        ]);

        let mut processing = Vec::new();
        let chain =
            extension_chain(&arcstr::literal!("Content"), &interfaces, &mut processing).unwrap();
        assert_eq!(chain, ["Content", "Timestamped", "Node"]);
        assert!(processing.is_empty());
    }

    #[test]
    fn cyclic_extension_is_rejected() {
        let interfaces = interface_bucket(vec![
            Declaration::interface("A").extends(["B"]),
            Declaration::interface("B").extends(["A"]),
        ]);

        let mut processing = Vec::new();
        assert_eq!(
            extension_chain(&arcstr::literal!("A"), &interfaces, &mut processing).unwrap_err(),
            SchemaError::CyclicInterfaceExtension {
                name: arcstr::literal!("A")
            },
        );
    }

    #[test]
    fn undeclared_interface_is_rejected() {
        let interfaces = interface_bucket(vec![Declaration::interface("A").extends(["Ghost"])]);

        let mut processing = Vec::new();
        assert_eq!(
            extension_chain(&arcstr::literal!("A"), &interfaces, &mut processing).unwrap_err(),
            SchemaError::UndefinedInterface {
                name: arcstr::literal!("Ghost")
            },
        );
    }

    #[test]
    fn most_specific_field_wins() {
        // Three interfaces each contribute a field; `label` collides all
        // the way down and the owner's own declaration must win.
        let interfaces = interface_bucket(vec![
            Declaration::interface("A")
                .field("a", "Int")
                .field("label", "Int"),
            Declaration::interface("B")
                .extends(["A"])
                .field("b", "Int")
                .field("label", "Float"),
            Declaration::interface("C")
                .extends(["B"])
                .field("c", "Int")
                .field("label", "Boolean"),
        ]);

        let own = IndexMap::from([(arcstr::literal!("label"), FieldEntry::from("String!"))]);
        let chain = implementation_chain(&[arcstr::literal!("C")], &interfaces).unwrap();
        let merged = merged_fields(&own, &chain, &interfaces);

        for field in ["a", "b", "c", "label"] {
            assert!(merged.contains_key(field), "missing `{field}`");
        }
        assert!(matches!(merged.get("label"), Some(FieldEntry::Ref(s)) if s == "String!"));
    }
}
