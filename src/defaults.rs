//! The built-in registry: default scalars, default object types and
//! default argument sets.
//!
//! Every schema variant can reference these without declaring them.
//! Scalar lookup is by lowercased name, so `"string"`, `"String"` and
//! `"STRING"` all hit the same entry.

use std::sync::{Arc, LazyLock};

use arcstr::{ArcStr, literal};
use chrono::DateTime;
use fnv::FnvHashMap;
use indexmap::IndexMap;
use regex::Regex;
use url::Url;
use uuid::Uuid;

use crate::{
    ast::TypeRef,
    declare::{FieldDefinition, FieldEntry},
    resolve::{FieldError, ParseLiteralFn, ParseValueFn},
    schema::meta::{EnumMeta, EnumValue, Field, MetaType, ObjectMeta, ScalarMeta},
    value::Value,
};

fn parse_value_fn<F>(f: F) -> ParseValueFn
where
    F: Fn(&Value) -> Result<Value, FieldError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn parse_literal_fn<F>(f: F) -> ParseLiteralFn
where
    F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn string_scalar(
    name: ArcStr,
    description: &str,
    valid: impl Fn(&str) -> bool + Copy + Send + Sync + 'static,
) -> ScalarMeta {
    let type_name = name.clone();
    ScalarMeta::new(name)
        .description(description)
        .parse_value(parse_value_fn(move |v| match v.as_str() {
            Some(s) if valid(s) => Ok(v.clone()),
            _ => Err(FieldError::from(format!(
                "{type_name} cannot represent value {v}",
            ))),
        }))
        .parse_literal(parse_literal_fn(move |v| match v.as_str() {
            Some(s) if valid(s) => Some(v.clone()),
            _ => None,
        }))
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*$")
        .expect("email pattern is valid")
});

fn id_scalar() -> ScalarMeta {
    ScalarMeta::new(literal!("ID"))
        .parse_value(parse_value_fn(|v| match v {
            Value::String(_) => Ok(v.clone()),
            Value::Int(i) => Ok(Value::String(i.to_string())),
            other => Err(FieldError::from(format!("ID cannot represent value {other}"))),
        }))
        .parse_literal(parse_literal_fn(|v| match v {
            Value::String(_) => Some(v.clone()),
            Value::Int(i) => Some(Value::String(i.to_string())),
            _ => None,
        }))
}

fn int_scalar() -> ScalarMeta {
    ScalarMeta::new(literal!("Int"))
        .parse_value(parse_value_fn(|v| match v {
            Value::Int(_) => Ok(v.clone()),
            other => Err(FieldError::from(format!(
                "Int cannot represent non-integer value {other}",
            ))),
        }))
        .parse_literal(parse_literal_fn(|v| matches!(v, Value::Int(_)).then(|| v.clone())))
}

fn float_scalar() -> ScalarMeta {
    ScalarMeta::new(literal!("Float"))
        .parse_value(parse_value_fn(|v| match v {
            Value::Int(i) => Ok(Value::Float(f64::from(*i))),
            Value::Float(_) => Ok(v.clone()),
            other => Err(FieldError::from(format!(
                "Float cannot represent non-numeric value {other}",
            ))),
        }))
        .parse_literal(parse_literal_fn(|v| match v {
            Value::Int(i) => Some(Value::Float(f64::from(*i))),
            Value::Float(_) => Some(v.clone()),
            _ => None,
        }))
}

fn boolean_scalar() -> ScalarMeta {
    ScalarMeta::new(literal!("Boolean"))
        .parse_value(parse_value_fn(|v| match v {
            Value::Boolean(_) => Ok(v.clone()),
            other => Err(FieldError::from(format!(
                "Boolean cannot represent value {other}",
            ))),
        }))
        .parse_literal(parse_literal_fn(|v| matches!(v, Value::Boolean(_)).then(|| v.clone())))
}

/// The default `String`: literals are automatically trimmed.
fn trimmed_string_scalar() -> ScalarMeta {
    ScalarMeta::new(literal!("String"))
        .description("Value should be a string, it will be automatically trimmed")
        .parse_literal(parse_literal_fn(|v| {
            v.as_str().map(|s| Value::String(s.trim().into()))
        }))
}

fn string_or_int_scalar() -> ScalarMeta {
    ScalarMeta::new(literal!("StringOrInt"))
        .description("Value can be either an integer or a string")
        .parse_value(parse_value_fn(|v| match v {
            Value::Int(_) | Value::String(_) => Ok(v.clone()),
            other => Err(FieldError::from(format!(
                "StringOrInt cannot represent value {other}",
            ))),
        }))
        .parse_literal(parse_literal_fn(|v| {
            matches!(v, Value::Int(_) | Value::String(_)).then(|| v.clone())
        }))
}

fn json_scalar() -> ScalarMeta {
    ScalarMeta::new(literal!("JSON")).description("Arbitrary JSON value")
}

static SCALARS: LazyLock<FnvHashMap<&'static str, Arc<MetaType>>> = LazyLock::new(|| {
    let boolean = Arc::new(boolean_scalar().into_meta());

    let mut scalars = FnvHashMap::default();
    scalars.insert("id", Arc::new(id_scalar().into_meta()));
    scalars.insert("int", Arc::new(int_scalar().into_meta()));
    scalars.insert("float", Arc::new(float_scalar().into_meta()));
    scalars.insert("string", Arc::new(trimmed_string_scalar().into_meta()));
    scalars.insert(
        "stringoriginal",
        Arc::new(
            string_scalar(literal!("StringOriginal"), "An untrimmed string", |_| true).into_meta(),
        ),
    );
    scalars.insert("stringorint", Arc::new(string_or_int_scalar().into_meta()));
    scalars.insert("bool", boolean.clone());
    scalars.insert("boolean", boolean);
    scalars.insert(
        "email",
        Arc::new(
            string_scalar(literal!("Email"), "A valid email address", |s| {
                EMAIL_RE.is_match(s)
            })
            .into_meta(),
        ),
    );
    scalars.insert(
        "url",
        Arc::new(
            string_scalar(literal!("URL"), "A valid absolute URL", |s| {
                Url::parse(s).is_ok()
            })
            .into_meta(),
        ),
    );
    scalars.insert(
        "uuid",
        Arc::new(
            string_scalar(literal!("UUID"), "A valid UUID", |s| {
                Uuid::parse_str(s).is_ok()
            })
            .into_meta(),
        ),
    );
    scalars.insert(
        "datetime",
        Arc::new(
            string_scalar(literal!("DateTime"), "An RFC 3339 date-time", |s| {
                DateTime::parse_from_rfc3339(s).is_ok()
            })
            .into_meta(),
        ),
    );
    scalars.insert("json", Arc::new(json_scalar().into_meta()));
    scalars
});

static TYPES: LazyLock<FnvHashMap<&'static str, Arc<MetaType>>> = LazyLock::new(|| {
    let page_info = ObjectMeta::new(
        literal!("PageInfo"),
        vec![
            Field::new(literal!("startCursor"), TypeRef::Named(literal!("String"))),
            Field::new(literal!("endCursor"), TypeRef::Named(literal!("String"))),
            Field::new(
                literal!("hasNextPage"),
                TypeRef::NonNullNamed(literal!("Boolean")),
            ),
            Field::new(
                literal!("hasPreviousPage"),
                TypeRef::NonNullNamed(literal!("Boolean")),
            ),
            Field::new(literal!("edgeCount"), TypeRef::NonNullNamed(literal!("Int"))),
        ],
    )
    .description("Information about pagination in a connection");

    let deleted_item = ObjectMeta::new(
        literal!("DeletedItem"),
        vec![Field::new(literal!("id"), TypeRef::NonNullNamed(literal!("ID")))],
    )
    .description("Deleted item. Only contains id of the item");

    let order_direction = EnumMeta::new(
        literal!("OrderDirection"),
        vec![
            EnumValue::new(literal!("ASC")).description("Specifies an ascending order"),
            EnumValue::new(literal!("DESC")).description("Specifies a descending order"),
        ],
        IndexMap::from([
            (literal!("ASC"), Value::from("ASC")),
            (literal!("DESC"), Value::from("DESC")),
        ]),
    )
    .description(
        "Possible directions in which to order a list of items when provided an orderBy argument.",
    );

    let mut types = FnvHashMap::default();
    types.insert("PageInfo", Arc::new(page_info.into_meta()));
    types.insert("DeletedItem", Arc::new(deleted_item.into_meta()));
    types.insert("OrderDirection", Arc::new(order_direction.into_meta()));
    types
});

/// Looks up a built-in scalar; the lookup is case-insensitive.
pub(crate) fn builtin_scalar(name: &str) -> Option<Arc<MetaType>> {
    SCALARS.get(name.to_ascii_lowercase().as_str()).cloned()
}

/// Looks up a built-in object type or enum; the lookup is exact.
pub(crate) fn builtin_type(name: &str) -> Option<Arc<MetaType>> {
    TYPES.get(name).cloned()
}

/// Whether `name` resolves to anything in the built-in registry.
pub(crate) fn is_builtin_name(name: &str) -> bool {
    SCALARS.contains_key(name.to_ascii_lowercase().as_str()) || TYPES.contains_key(name)
}

/// Every built-in, keyed by canonical name; used to pre-seed the type
/// registry of each assembled variant.
pub(crate) fn all_builtins() -> impl Iterator<Item = (ArcStr, Arc<MetaType>)> {
    SCALARS
        .values()
        .chain(TYPES.values())
        .map(|meta| (meta.name().clone(), meta.clone()))
}

/// The `$paging` argument set.
pub(crate) fn paging_args() -> IndexMap<ArcStr, FieldEntry> {
    IndexMap::from([
        (
            literal!("first"),
            FieldDefinition::new("Int")
                .description("Returns the first n elements from the list.")
                .into(),
        ),
        (
            literal!("after"),
            FieldDefinition::new("StringOrInt")
                .description(
                    "Returns the elements in the list that come after the specified cursor or offset.",
                )
                .into(),
        ),
        (
            literal!("last"),
            FieldDefinition::new("Int")
                .description("Returns the last n elements from the list.")
                .into(),
        ),
        (
            literal!("before"),
            FieldDefinition::new("StringOrInt")
                .description(
                    "Returns the elements in the list that come before the specified cursor or offset",
                )
                .into(),
        ),
    ])
}

/// The `$order` argument set.
pub(crate) fn order_args() -> IndexMap<ArcStr, FieldEntry> {
    IndexMap::from([
        (
            literal!("orderBy"),
            FieldDefinition::new("String")
                .description("Property by which the list should be ordered.")
                .into(),
        ),
        (
            literal!("orderDirection"),
            FieldDefinition::new("OrderDirection")
                .description(
                    "Which direction the list should be ordered by (ascending or descending)",
                )
                .default("ASC")
                .into(),
        ),
    ])
}

/// The `$sort` argument set: the string-typed ordering convention.
pub(crate) fn sort_args() -> IndexMap<ArcStr, FieldEntry> {
    IndexMap::from([
        (
            literal!("sort"),
            FieldDefinition::new("String")
                .description("Property by which the list should be sorted")
                .into(),
        ),
        (
            literal!("order"),
            FieldDefinition::new("String")
                .description("Which direction the list should be ordered by (ASC or DESC)")
                .into(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_lookup_is_case_insensitive() {
        for name in ["string", "String", "STRING"] {
            assert_eq!(builtin_scalar(name).unwrap().name(), "String");
        }
        assert_eq!(builtin_scalar("stringorint").unwrap().name(), "StringOrInt");
        assert!(builtin_scalar("Widget").is_none());
    }

    #[test]
    fn trimmed_string_trims_literals() {
        let meta = builtin_scalar("string").unwrap();
        let MetaType::Scalar(scalar) = &*meta else {
            panic!("String is a scalar");
        };
        assert_eq!(
            scalar.parse_literal_value(&Value::from("  hi  ")),
            Some(Value::from("hi")),
        );
        assert_eq!(scalar.parse_literal_value(&Value::Int(3)), None);
    }

    #[test]
    fn string_or_int_accepts_both() {
        let meta = builtin_scalar("stringorint").unwrap();
        let MetaType::Scalar(scalar) = &*meta else {
            panic!("StringOrInt is a scalar");
        };
        assert!(scalar.parse_input(&Value::Int(7)).is_ok());
        assert!(scalar.parse_input(&Value::from("cursor")).is_ok());
        assert!(scalar.parse_input(&Value::Boolean(true)).is_err());
    }

    #[test]
    fn validating_scalars_reject_bad_input() {
        let email = builtin_scalar("email").unwrap();
        let MetaType::Scalar(email) = &*email else {
            panic!("Email is a scalar");
        };
        assert!(email.parse_input(&Value::from("a@b.co")).is_ok());
        assert!(email.parse_input(&Value::from("not-an-email")).is_err());

        let datetime = builtin_scalar("datetime").unwrap();
        let MetaType::Scalar(datetime) = &*datetime else {
            panic!("DateTime is a scalar");
        };
        assert!(datetime.parse_input(&Value::from("2024-02-29T12:00:00Z")).is_ok());
        assert!(datetime.parse_input(&Value::from("yesterday")).is_err());
    }

    #[test]
    fn builtin_types_have_the_documented_shapes() {
        let page_info = builtin_type("PageInfo").unwrap();
        assert_eq!(
            page_info.field_by_name("edgeCount").unwrap().field_type,
            TypeRef::NonNullNamed(literal!("Int")),
        );
        assert!(page_info.field_by_name("hasNextPage").is_some());

        let deleted = builtin_type("DeletedItem").unwrap();
        assert_eq!(
            deleted.field_by_name("id").unwrap().field_type,
            TypeRef::NonNullNamed(literal!("ID")),
        );

        let MetaType::Enum(direction) = &*builtin_type("OrderDirection").unwrap() else {
            panic!("OrderDirection is an enum");
        };
        assert_eq!(direction.value_lookup.get("ASC"), Some(&Value::from("ASC")));
        assert_eq!(direction.values.len(), 2);
    }
}
