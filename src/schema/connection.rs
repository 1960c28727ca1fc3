//! Relay connection synthesis.
//!
//! A type or interface flagged `relayConnection` gets `<Type>Edge` and
//! `<Type>Connection` companions injected into the variant being
//! collected, unless declarations with those names are already present:
//! manual declarations are authoritative.

use std::sync::Arc;

use arcstr::{ArcStr, literal};
use indexmap::IndexMap;

use super::registry::SchemaVariant;
use crate::declare::{FieldEntry, RelayConnection, TypeDecl};

pub(crate) fn ensure_connection_types(
    variant: &mut SchemaVariant,
    type_name: &ArcStr,
    connection: &RelayConnection,
) {
    let edge_name = ArcStr::from(format!("{type_name}Edge"));
    let connection_name = ArcStr::from(format!("{type_name}Connection"));

    if !variant.types.contains_key(&edge_name) {
        let mut fields = IndexMap::from([
            (literal!("cursor"), FieldEntry::from("String!")),
            (literal!("node"), FieldEntry::Ref(type_name.as_str().into())),
        ]);
        merge_caller_fields(&mut fields, &connection.edge_fields);

        variant.types.insert(
            edge_name.clone(),
            Arc::new(TypeDecl {
                name: edge_name.clone(),
                description: Some(literal!("An edge in a connection")),
                schemas: None,
                fields,
                implements: Vec::new(),
                relay_connection: None,
                is_type_of: None,
            }),
        );
    }

    if !variant.types.contains_key(&connection_name) {
        let mut fields = IndexMap::from([
            (literal!("edges"), FieldEntry::from(format!("[{edge_name}]"))),
            (literal!("nodes"), FieldEntry::from(format!("[{type_name}]"))),
            (literal!("pageInfo"), FieldEntry::from("PageInfo!")),
            (literal!("totalCount"), FieldEntry::from("Int!")),
        ]);
        merge_caller_fields(&mut fields, &connection.fields);

        variant.types.insert(
            connection_name.clone(),
            Arc::new(TypeDecl {
                name: connection_name,
                description: Some(format!("A list of {type_name}").into()),
                schemas: None,
                fields,
                implements: Vec::new(),
                relay_connection: None,
                is_type_of: None,
            }),
        );
    }
}

/// Caller-supplied fields win over the defaults on name conflicts.
fn merge_caller_fields(
    fields: &mut IndexMap<ArcStr, FieldEntry>,
    caller: &IndexMap<ArcStr, FieldEntry>,
) {
    for (name, entry) in caller {
        fields.insert(name.clone(), entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::FieldDefinition;

    fn synthesize(connection: &RelayConnection) -> SchemaVariant {
        let mut variant = SchemaVariant::empty(literal!("default"));
        ensure_connection_types(&mut variant, &literal!("Widget"), connection);
        variant
    }

    #[test]
    fn synthesizes_default_shapes() {
        let variant = synthesize(&RelayConnection::new());

        let edge = variant.types.get("WidgetEdge").unwrap();
        assert!(matches!(edge.fields.get("cursor"), Some(FieldEntry::Ref(s)) if s == "String!"));
        assert!(matches!(edge.fields.get("node"), Some(FieldEntry::Ref(s)) if s == "Widget"));

        let connection = variant.types.get("WidgetConnection").unwrap();
        assert!(
            matches!(connection.fields.get("edges"), Some(FieldEntry::Ref(s)) if s == "[WidgetEdge]"),
        );
        assert!(
            matches!(connection.fields.get("nodes"), Some(FieldEntry::Ref(s)) if s == "[Widget]"),
        );
        assert!(
            matches!(connection.fields.get("pageInfo"), Some(FieldEntry::Ref(s)) if s == "PageInfo!"),
        );
        assert!(
            matches!(connection.fields.get("totalCount"), Some(FieldEntry::Ref(s)) if s == "Int!"),
        );
    }

    #[test]
    fn caller_fields_merge_over_defaults() {
        let connection = RelayConnection::new()
            .edge_field("title", "String!")
            .edge_field("cursor", "ID!")
            .field("timeTaken", FieldDefinition::new("Int!"));
        let variant = synthesize(&connection);

        let edge = variant.types.get("WidgetEdge").unwrap();
        assert!(matches!(edge.fields.get("title"), Some(FieldEntry::Ref(s)) if s == "String!"));
        assert!(matches!(edge.fields.get("cursor"), Some(FieldEntry::Ref(s)) if s == "ID!"));

        let connection = variant.types.get("WidgetConnection").unwrap();
        assert!(connection.fields.contains_key("timeTaken"));
        assert!(connection.fields.contains_key("totalCount"));
    }

    #[test]
    fn manual_declarations_are_left_untouched() {
        let mut variant = SchemaVariant::empty(literal!("default"));
        variant.types.insert(
            literal!("WidgetEdge"),
            Arc::new(TypeDecl {
                name: literal!("WidgetEdge"),
                description: Some(literal!("hand written")),
                schemas: None,
                fields: IndexMap::from([(literal!("weight"), FieldEntry::from("Float"))]),
                implements: Vec::new(),
                relay_connection: None,
                is_type_of: None,
            }),
        );

        ensure_connection_types(&mut variant, &literal!("Widget"), &RelayConnection::new());

        let edge = variant.types.get("WidgetEdge").unwrap();
        assert_eq!(edge.description.as_deref(), Some("hand written"));
        assert!(edge.fields.contains_key("weight"));
        assert!(!edge.fields.contains_key("cursor"));
        // The connection half is still synthesized.
        assert!(variant.types.contains_key("WidgetConnection"));
    }
}
