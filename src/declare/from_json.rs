//! Loose ingestion of data-only declarations from JSON.
//!
//! Everything a declaration can say in data (kinds, fields, argument
//! shapes, enum values, variant membership, relay connection payloads)
//! can ride JSON; callbacks obviously cannot, and fall back to their
//! defaults (identity scalar hooks, resolver-registry lookups).

use arcstr::ArcStr;
use serde_json::Value as Json;

use super::{
    Declaration, EnumValueDefinition, EnumValueEntry, FieldDefinition, FieldEntry, RelayConnection,
    SelectionField, SelectionNode,
};
use crate::{error::SchemaError, value::Value};

impl Declaration {
    /// Decodes a declaration from a JSON record.
    ///
    /// Fails with [`SchemaError::MalformedDeclaration`] when `value` is
    /// not a keyed record, or when a nested shape (a field without a
    /// `type`, a selection without a `name`) cannot be decoded.
    pub fn from_json(value: &Json) -> Result<Self, SchemaError> {
        let Some(obj) = value.as_object() else {
            return Err(malformed(value));
        };

        let mut decl = Self::default();
        decl.graphql = obj
            .get("graphql")
            .and_then(Json::as_str)
            .map(Into::into);
        decl.name = opt_name(obj.get("name"));

        if let Some(description) = obj.get("description").and_then(Json::as_str) {
            decl = decl.description(description);
        }
        if let Some(schemas) = string_list(obj.get("schemas").or_else(|| obj.get("schema"))) {
            decl = decl.schemas(schemas);
        }

        let is_fragment = decl.graphql.as_deref() == Some("fragment");
        if let Some(fields) = obj.get("fields") {
            if is_fragment {
                for node in selection_from_json(fields)? {
                    decl = decl.select(node);
                }
            } else {
                for (name, entry) in fields_from_json(fields)? {
                    decl = decl.field(name, entry);
                }
            }
        }

        if let Some(args) = obj.get("args") {
            let (entries, default_args) = args_from_json(args)?;
            for (name, entry) in entries {
                decl = decl.arg(name, entry);
            }
            if let Some(tokens) = default_args {
                decl = decl.default_args(tokens);
            }
        }

        if let Some(values) = obj.get("values") {
            let Some(values) = values.as_object() else {
                return Err(malformed(values));
            };
            for (name, value) in values {
                decl = decl.value(name.as_str(), enum_value_from_json(value)?);
            }
        }

        if let Some(types) = string_list(obj.get("types")) {
            decl = decl.types(types.iter().map(|s| s.as_str()));
        }
        if let Some(implements) = string_list(
            obj.get("interfaces")
                .or_else(|| obj.get("interface"))
                .or_else(|| obj.get("implements")),
        ) {
            decl = decl.implements(implements);
        }
        if let Some(extends) = string_list(obj.get("extends")) {
            decl = decl.extends(extends);
        }

        match obj.get("relayConnection") {
            Some(Json::Bool(enabled)) => decl = decl.relay_connection(*enabled),
            Some(Json::Object(merge)) => {
                let mut connection = RelayConnection::new();
                if let Some(edge_fields) = merge.get("edgeFields") {
                    for (name, entry) in fields_from_json(edge_fields)? {
                        connection = connection.edge_field(name, entry);
                    }
                }
                if let Some(fields) = merge.get("fields") {
                    for (name, entry) in fields_from_json(fields)? {
                        connection = connection.field(name, entry);
                    }
                }
                decl = decl.relay_connection_fields(connection);
            }
            Some(other) => return Err(malformed(other)),
            None => {}
        }

        if let Some(type_expr) = obj.get("type").and_then(Json::as_str) {
            decl = decl.returns(type_expr);
        }
        if let Some(reason) = obj.get("deprecationReason").and_then(Json::as_str) {
            decl = decl.deprecated(reason);
        }

        Ok(decl)
    }
}

/// The error for a JSON entry that is not a keyed record where one was
/// required.
pub(crate) fn malformed(value: &Json) -> SchemaError {
    let entry = match value {
        Json::Null => "null".into(),
        Json::Bool(b) => format!("`{b}` where a keyed record was required").into(),
        Json::Number(n) => format!("`{n}` where a keyed record was required").into(),
        Json::String(s) => format!("`\"{s}\"` where a keyed record was required").into(),
        Json::Array(_) => "an array where a keyed record was required".into(),
        Json::Object(_) => "an unrecognized record shape".into(),
    };
    SchemaError::MalformedDeclaration { entry }
}

fn opt_name(value: Option<&Json>) -> Option<ArcStr> {
    value.and_then(Json::as_str).map(ArcStr::from)
}

/// `"schema"` accepts a single name or a list of names.
fn string_list(value: Option<&Json>) -> Option<Vec<ArcStr>> {
    match value? {
        Json::String(s) => Some(vec![ArcStr::from(s.as_str())]),
        Json::Array(items) => Some(
            items
                .iter()
                .filter_map(Json::as_str)
                .map(ArcStr::from)
                .collect(),
        ),
        _ => None,
    }
}

fn fields_from_json(value: &Json) -> Result<Vec<(ArcStr, FieldEntry)>, SchemaError> {
    let Some(obj) = value.as_object() else {
        return Err(malformed(value));
    };

    obj.iter()
        .map(|(name, field)| Ok((ArcStr::from(name.as_str()), field_from_json(name, field)?)))
        .collect()
}

fn field_from_json(name: &str, value: &Json) -> Result<FieldEntry, SchemaError> {
    match value {
        Json::String(type_expr) => Ok(FieldEntry::Ref(type_expr.as_str().into())),
        Json::Object(obj) => {
            let Some(type_expr) = obj.get("type").and_then(Json::as_str) else {
                return Err(SchemaError::MalformedDeclaration {
                    entry: format!("field `{name}` missing its `type`").into(),
                });
            };

            let mut def = FieldDefinition::new(type_expr);
            if let Some(n) = obj.get("name").and_then(Json::as_str) {
                def = def.name(n);
            }
            if let Some(description) = obj.get("description").and_then(Json::as_str) {
                def = def.description(description);
            }
            if let Some(default) = obj.get("default") {
                def = def.default(Value::from(default.clone()));
            }
            if let Some(reason) = obj.get("deprecationReason").and_then(Json::as_str) {
                def = def.deprecated(reason);
            }
            if let Some(schemas) = string_list(obj.get("schemas").or_else(|| obj.get("schema"))) {
                def = def.schemas(schemas);
            }
            if let Some(args) = obj.get("args") {
                let (entries, default_args) = args_from_json(args)?;
                for (arg_name, entry) in entries {
                    def = def.arg(arg_name, entry);
                }
                if let Some(tokens) = default_args {
                    def = def.default_args(tokens);
                }
            }

            Ok(FieldEntry::Def(def))
        }
        other => Err(malformed(other)),
    }
}

/// Argument maps are field maps plus the reserved `$default` token list.
#[expect(clippy::type_complexity, reason = "local helper")]
fn args_from_json(
    value: &Json,
) -> Result<(Vec<(ArcStr, FieldEntry)>, Option<Vec<String>>), SchemaError> {
    let Some(obj) = value.as_object() else {
        return Err(malformed(value));
    };

    let mut entries = Vec::new();
    let mut default_args = None;

    for (name, arg) in obj {
        if name == "$default" {
            let Some(tokens) = arg.as_array() else {
                return Err(malformed(arg));
            };
            default_args = Some(
                tokens
                    .iter()
                    .filter_map(Json::as_str)
                    .map(str::to_owned)
                    .collect(),
            );
            continue;
        }
        entries.push((ArcStr::from(name.as_str()), field_from_json(name, arg)?));
    }

    Ok((entries, default_args))
}

fn enum_value_from_json(value: &Json) -> Result<EnumValueEntry, SchemaError> {
    match value {
        Json::Object(obj) => {
            let mut def = EnumValueDefinition::new();
            if let Some(name) = obj.get("name").and_then(Json::as_str) {
                def = def.name(name);
            }
            if let Some(v) = obj.get("value") {
                def = def.value(Value::from(v.clone()));
            }
            if let Some(description) = obj.get("description").and_then(Json::as_str) {
                def = def.description(description);
            }
            if let Some(reason) = obj.get("deprecationReason").and_then(Json::as_str) {
                def = def.deprecated(reason);
            }
            if let Some(schemas) = string_list(obj.get("schemas").or_else(|| obj.get("schema"))) {
                def = def.schemas(schemas);
            }
            Ok(EnumValueEntry::Def(def))
        }
        Json::Array(_) => Err(malformed(value)),
        literal => Ok(EnumValueEntry::Literal(Value::from(literal.clone()))),
    }
}

fn selection_from_json(value: &Json) -> Result<Vec<SelectionNode>, SchemaError> {
    let Some(items) = value.as_array() else {
        return Err(malformed(value));
    };

    items
        .iter()
        .map(|item| match item {
            Json::String(name) => Ok(SelectionNode::Field(name.as_str().into())),
            Json::Object(obj) => {
                let Some(name) = obj.get("name").and_then(Json::as_str) else {
                    return Err(SchemaError::MalformedDeclaration {
                        entry: "fragment selection missing its `name`".into(),
                    });
                };

                let mut field = SelectionField::new(name);
                if let Some(alias) = obj.get("alias").and_then(Json::as_str) {
                    field = field.alias(alias);
                }
                if let Some(args) = item.get("args").and_then(Json::as_object) {
                    for (arg_name, arg) in args {
                        field = field.arg(arg_name.as_str(), Value::from(arg.clone()));
                    }
                }
                if let Some(nested) = obj.get("fields") {
                    for node in selection_from_json(nested)? {
                        field = field.field(node);
                    }
                }
                Ok(SelectionNode::Nested(field))
            }
            other => Err(malformed(other)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::declare::{ClassifiedItem, TypeExpr};

    #[test]
    fn decodes_a_type_declaration() {
        let decl = Declaration::from_json(&json!({
            "graphql": "type",
            "name": "Team",
            "schema": ["admin"],
            "relayConnection": true,
            "fields": {
                "id": "ID!",
                "memberCount": {"type": "Int", "description": "Active members"},
            },
        }))
        .unwrap();

        let ClassifiedItem::Type(team) = decl.classify(None).unwrap() else {
            panic!("expected a type");
        };
        assert_eq!(team.name, "Team");
        assert_eq!(team.schemas.as_deref(), Some(&[ArcStr::from("admin")][..]));
        assert!(team.relay_connection.is_some());
        assert!(matches!(team.fields.get("id"), Some(FieldEntry::Ref(s)) if s == "ID!"));
    }

    #[test]
    fn decodes_query_args_with_default_tokens() {
        let decl = Declaration::from_json(&json!({
            "graphql": "query",
            "name": "teams",
            "type": "TeamConnection",
            "args": {
                "search": "String",
                "$default": ["$paging", "name"],
            },
        }))
        .unwrap();

        let ClassifiedItem::Operation(_, op) = decl.classify(None).unwrap() else {
            panic!("expected an operation");
        };
        assert_eq!(op.field.type_expr, TypeExpr::Raw("TeamConnection".into()));
        assert_eq!(op.field.default_args, ["$paging", "name"]);
        assert!(op.field.args.as_ref().unwrap().contains_key("search"));
    }

    #[test]
    fn rejects_non_record_entries() {
        assert!(matches!(
            Declaration::from_json(&json!(42)),
            Err(SchemaError::MalformedDeclaration { .. }),
        ));
        assert!(matches!(
            Declaration::from_json(&json!({"graphql": "type", "name": "X", "fields": {"y": 1}})),
            Err(SchemaError::MalformedDeclaration { .. }),
        ));
    }
}
