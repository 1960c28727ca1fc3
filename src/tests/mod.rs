//! End-to-end assembly tests.

use futures::StreamExt as _;
use indexmap::IndexMap;
use itertools::Itertools as _;
use pretty_assertions::assert_eq;

use crate::{
    Arguments, Declaration, ExecutableSchema, FieldDefinition, RelayConnection, ResolveParams,
    Resolvers, ResolverValidationOptions, SchemaEntry, SchemaError, SchemaOptions, Subscription,
    TypeRef, Value, make_schemas,
    schema::meta::MetaType,
};

fn admin_public() -> SchemaOptions {
    SchemaOptions {
        schemas: vec![arcstr::literal!("admin"), arcstr::literal!("public")],
        ..SchemaOptions::default()
    }
}

/// A small multi-variant schema exercising most declaration kinds.
fn fixture_entries() -> Vec<SchemaEntry> {
    vec![
        Declaration::interface("Node")
            .schemas(["admin", "public"])
            .field("id", "ID!")
            .into(),
        Declaration::interface("Timestamped")
            .schemas(["admin", "public"])
            .extends(["Node"])
            .field("createdAt", "DateTime")
            .into(),
        Declaration::object("Team")
            .schemas(["admin", "public"])
            .implements(["Timestamped"])
            .relay_connection(true)
            .field("name", "String!")
            .field("memberCount", "Int")
            .field(
                "auditLog",
                FieldDefinition::new("[String]").schemas(["admin"]),
            )
            .into(),
        Declaration::object("SecretReport")
            .schemas(["admin"])
            .field("id", "ID!")
            .field("body", "String!")
            .into(),
        Declaration::enumeration("TeamRole")
            .schemas(["admin", "public"])
            .value("OWNER", "owner")
            .value("MEMBER", "member")
            .value(
                "SUPER",
                crate::EnumValueDefinition::new()
                    .value("super")
                    .schemas(["admin"]),
            )
            .into(),
        Declaration::query("teams")
            .schemas(["admin", "public"])
            .returns("TeamConnection")
            .default_args(["$paging", "name"])
            .into(),
        Declaration::query("secretReports")
            .schemas(["admin"])
            .returns("[SecretReport]")
            .into(),
        Declaration::mutation("createTeam")
            .schemas(["admin"])
            .returns("Team")
            .arg("name", "String!")
            .into(),
        Declaration::subscription_field("teamUpdated")
            .schemas(["admin", "public"])
            .returns("Team")
            .arg("minMembers", "Int")
            .into(),
        Declaration::fragment("TeamSummary")
            .schemas(["admin", "public"])
            .on("Team")
            .select("name")
            .select("memberCount")
            .into(),
    ]
}

fn fixture_resolvers() -> Resolvers {
    Resolvers::new()
        .field("Query", "teams", |_| Ok(Some(Value::Null)))
        .field("Query", "secretReports", |_| Ok(Some(Value::List(vec![]))))
        .field("Mutation", "createTeam", |_| Ok(Some(Value::Null)))
        .subscription(
            "Subscription",
            "teamUpdated",
            Subscription::new(|_| {
                futures::stream::iter(
                    (1..=4).map(|n| {
                        Value::Object(IndexMap::from([("members".to_owned(), Value::Int(n))]))
                    }),
                )
                .boxed()
            })
            .filter(|event, args| {
                let min = args.get("minMembers").and_then(Value::as_int).unwrap_or(0);
                event.get("members").and_then(Value::as_int).unwrap_or(0) >= min
            }),
        )
}

fn fixture_schemas() -> IndexMap<arcstr::ArcStr, ExecutableSchema> {
    make_schemas(fixture_entries(), fixture_resolvers(), admin_public()).unwrap()
}

fn field_names(meta: &MetaType) -> Vec<String> {
    match meta {
        MetaType::Object(o) => o.fields.iter().map(|f| f.name.to_string()).collect(),
        other => panic!("expected an object, got {other:?}"),
    }
}

#[test]
fn hello_world_round_trip() {
    let schemas = make_schemas(
        vec![Declaration::query("hello").returns("String").into()],
        Resolvers::new().field("Query", "hello", |_| Ok(Some(Value::from("world")))),
        SchemaOptions::default(),
    )
    .unwrap();

    let schema = &schemas["default"];
    let query = schema.query_type();
    assert_eq!(field_names(query), ["hello"]);

    let field = query.field_by_name("hello").unwrap();
    assert_eq!(field.field_type, TypeRef::Named(arcstr::literal!("String")));
    assert!(matches!(
        schema.concrete_type_by_name("String"),
        Some(MetaType::Scalar(_)),
    ));

    let resolve = field.field_resolver().unwrap().as_resolve().unwrap();
    let (source, args) = (Value::Null, Arguments::new());
    let resolved = resolve(ResolveParams {
        source: &source,
        args: &args,
    })
    .unwrap();
    assert_eq!(resolved, Some(Value::from("world")));
}

#[test]
fn no_declarations_is_a_configuration_error() {
    assert_eq!(
        make_schemas(vec![], Resolvers::new(), SchemaOptions::default()).unwrap_err(),
        SchemaError::NoDeclarations,
    );
}

#[test]
fn variants_are_built_in_declaration_order_with_default_last() {
    let schemas = fixture_schemas();
    let names: Vec<_> = schemas.keys().map(ToString::to_string).collect();
    assert_eq!(names, ["admin", "public", "default"]);
}

#[test]
fn visibility_scopes_types_and_fields_per_variant() {
    let schemas = fixture_schemas();

    // Top-level: SecretReport is admin-only, absent from public, always
    // in default.
    assert!(schemas["admin"].concrete_type_by_name("SecretReport").is_some());
    assert!(schemas["public"].concrete_type_by_name("SecretReport").is_none());
    assert!(schemas["default"].concrete_type_by_name("SecretReport").is_some());

    // Root fields follow the same membership lists.
    assert_eq!(field_names(schemas["admin"].query_type()), ["teams", "secretReports"]);
    assert_eq!(field_names(schemas["public"].query_type()), ["teams"]);

    // Field-level: auditLog is scoped to admin.
    let team = |schema: &ExecutableSchema| {
        field_names(schema.concrete_type_by_name("Team").unwrap())
    };
    assert!(team(&schemas["admin"]).contains(&"auditLog".to_owned()));
    assert!(!team(&schemas["public"]).contains(&"auditLog".to_owned()));
    assert!(team(&schemas["default"]).contains(&"auditLog".to_owned()));
}

#[test]
fn unscoped_top_level_declarations_only_reach_the_default_variant() {
    let schemas = make_schemas(
        vec![
            Declaration::object("Gadget").field("id", "ID!").into(),
            Declaration::query("gadgets")
                .schemas(["public"])
                .returns("[Gadget]")
                .into(),
        ],
        Resolvers::new(),
        SchemaOptions {
            schemas: vec![arcstr::literal!("public")],
            ..SchemaOptions::default()
        },
    )
    .unwrap();

    assert!(schemas["default"].concrete_type_by_name("Gadget").is_some());
    assert!(schemas["public"].concrete_type_by_name("Gadget").is_none());
    // The gadgets query names a type absent from public, so the
    // orphan-reference guard drops the field there too.
    assert_eq!(field_names(schemas["public"].query_type()), ["noop"]);
}

#[test]
fn relay_connection_synthesis_produces_the_documented_shapes() {
    let schemas = fixture_schemas();

    for variant in ["admin", "public", "default"] {
        let schema = &schemas[variant];

        let edge = schema.concrete_type_by_name("TeamEdge").unwrap();
        assert_eq!(
            edge.field_by_name("cursor").unwrap().field_type.to_string(),
            "String!",
        );
        assert_eq!(
            edge.field_by_name("node").unwrap().field_type.to_string(),
            "Team",
        );

        let connection = schema.concrete_type_by_name("TeamConnection").unwrap();
        for (field, ty) in [
            ("edges", "[TeamEdge]"),
            ("nodes", "[Team]"),
            ("pageInfo", "PageInfo!"),
            ("totalCount", "Int!"),
        ] {
            assert_eq!(
                connection.field_by_name(field).unwrap().field_type.to_string(),
                ty,
                "unexpected type for {field}",
            );
        }
    }
}

#[test]
fn manual_connection_declarations_are_authoritative() {
    let schemas = make_schemas(
        vec![
            Declaration::object("Widget")
                .relay_connection(true)
                .field("title", "String")
                .into(),
            Declaration::object("WidgetEdge")
                .field("weight", "Float")
                .into(),
        ],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap();

    let edge = schemas["default"].concrete_type_by_name("WidgetEdge").unwrap();
    assert!(edge.field_by_name("weight").is_some());
    assert!(edge.field_by_name("cursor").is_none());
    // The untouched half is still synthesized.
    assert!(schemas["default"].concrete_type_by_name("WidgetConnection").is_some());
}

#[test]
fn relay_synthesis_merges_caller_fields() {
    let schemas = make_schemas(
        vec![
            Declaration::object("Job")
                .relay_connection_fields(
                    RelayConnection::new()
                        .edge_field("title", "String!")
                        .field("timeTaken", "Int!"),
                )
                .field("id", "ID!")
                .into(),
        ],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap();

    let edge = schemas["default"].concrete_type_by_name("JobEdge").unwrap();
    assert!(edge.field_by_name("cursor").is_some());
    assert_eq!(edge.field_by_name("title").unwrap().field_type.to_string(), "String!");

    let connection = schemas["default"].concrete_type_by_name("JobConnection").unwrap();
    assert_eq!(
        connection.field_by_name("timeTaken").unwrap().field_type.to_string(),
        "Int!",
    );
}

#[test]
fn default_args_expand_with_paging_and_inherited_fields() {
    let schemas = fixture_schemas();
    let teams = schemas["default"].query_type().field_by_name("teams").unwrap();
    let arguments = teams.arguments.as_ref().unwrap();

    let names: Vec<_> = arguments.iter().map(|a| a.name.to_string()).collect();
    assert_eq!(names, ["first", "after", "last", "before", "name"]);

    // `name` is inherited from Team (via the TeamConnection fallback)
    // with its required marker stripped.
    let name = teams.argument_by_name("name").unwrap();
    assert_eq!(name.arg_type.to_string(), "String");
    let after = teams.argument_by_name("after").unwrap();
    assert_eq!(after.arg_type.to_string(), "StringOrInt");
}

#[test]
fn interface_chain_fields_merge_into_types() {
    let schemas = fixture_schemas();
    let team = schemas["default"].concrete_type_by_name("Team").unwrap();

    // Own fields plus createdAt (Timestamped) plus id (Node).
    for field in ["id", "createdAt", "name", "memberCount"] {
        assert!(team.field_by_name(field).is_some(), "missing `{field}`");
    }

    let MetaType::Object(team) = team else {
        panic!("Team is an object");
    };
    assert_eq!(team.interface_names, ["Timestamped", "Node"]);

    // The interface itself carries its chain's fields too.
    let timestamped = schemas["default"].concrete_type_by_name("Timestamped").unwrap();
    assert!(timestamped.field_by_name("id").is_some());

    // And abstract dispatch sees Team behind both interfaces.
    let node = schemas["default"].concrete_type_by_name("Node").unwrap();
    let possible: Vec<_> = schemas["default"]
        .possible_types(node)
        .into_iter()
        .map(|t| t.name().to_string())
        .collect();
    assert!(possible.contains(&"Team".to_owned()));
}

#[test]
fn cyclic_interface_extension_fails_the_build() {
    let err = make_schemas(
        vec![
            Declaration::interface("A").extends(["B"]).field("a", "Int").into(),
            Declaration::interface("B").extends(["A"]).field("b", "Int").into(),
        ],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::CyclicInterfaceExtension { .. }));
}

#[test]
fn unknown_type_reference_fails_the_build() {
    let err = make_schemas(
        vec![Declaration::query("ghosts").returns("[Ghost]").into()],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnknownType {
            name: arcstr::literal!("Ghost")
        },
    );
}

#[test]
fn enum_value_tables_follow_variant_visibility() {
    let schemas = fixture_schemas();

    let default_roles = schemas["default"].enum_values("TeamRole").unwrap();
    assert_eq!(default_roles.get("OWNER"), Some(&Value::from("owner")));
    assert_eq!(default_roles.get("SUPER"), Some(&Value::from("super")));

    let public_roles = schemas["public"].enum_values("TeamRole").unwrap();
    assert!(public_roles.get("SUPER").is_none());
    assert_eq!(public_roles.len(), 2);

    let MetaType::Enum(meta) = schemas["public"].concrete_type_by_name("TeamRole").unwrap()
    else {
        panic!("TeamRole is an enum");
    };
    assert_eq!(meta.values.len(), 2);
}

#[test]
fn fragments_materialize_into_query_text() {
    let schemas = fixture_schemas();
    let fragment = schemas["default"].fragment_by_name("TeamSummary").unwrap();
    assert_eq!(
        fragment.to_string(),
        "fragment TeamSummary on Team { name memberCount }",
    );
    assert_eq!(fragment.spread(), "... TeamSummary");
}

#[test]
fn fragment_target_must_exist() {
    let err = make_schemas(
        vec![
            Declaration::fragment("GhostFields")
                .on("Ghost")
                .select("id")
                .into(),
        ],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SchemaError::FragmentTargetMissing {
            fragment: arcstr::literal!("GhostFields"),
            on: arcstr::literal!("Ghost"),
        },
    );
}

#[tokio::test]
async fn subscription_filters_compose_into_the_stream() {
    let schemas = fixture_schemas();
    let field = schemas["default"]
        .subscription_type()
        .field_by_name("teamUpdated")
        .unwrap();
    let subscribe = field.field_resolver().unwrap().as_subscribe().unwrap();

    let source = Value::Null;
    let mut args = Arguments::new();
    args.insert(arcstr::literal!("minMembers"), Value::Int(3));

    let events: Vec<_> = subscribe(ResolveParams {
        source: &source,
        args: &args,
    })
    .collect()
    .await;

    let members: Vec<_> = events
        .iter()
        .map(|e| e.get("members").and_then(Value::as_int).unwrap())
        .collect();
    assert_eq!(members, [3, 4]);
}

#[test]
fn undefined_resolver_results_are_caught_by_default() {
    let entries = || vec![Declaration::query("me").returns("String").into()];
    let resolvers = || Resolvers::new().field("Query", "me", |_| Ok(None));

    let schemas = make_schemas(entries(), resolvers(), SchemaOptions::default()).unwrap();
    let field = schemas["default"].query_type().field_by_name("me").unwrap();
    let resolve = field.field_resolver().unwrap().as_resolve().unwrap();
    let (source, args) = (Value::Null, Arguments::new());
    let err = resolve(ResolveParams {
        source: &source,
        args: &args,
    })
    .unwrap_err();
    assert_eq!(err.message(), "resolver for `Query.me` returned undefined");

    // Opting out passes the missing value through untouched.
    let schemas = make_schemas(
        entries(),
        resolvers(),
        SchemaOptions {
            allow_undefined_in_resolve: true,
            ..SchemaOptions::default()
        },
    )
    .unwrap();
    let field = schemas["default"].query_type().field_by_name("me").unwrap();
    let resolve = field.field_resolver().unwrap().as_resolve().unwrap();
    let resolved = resolve(ResolveParams {
        source: &source,
        args: &args,
    })
    .unwrap();
    assert_eq!(resolved, None);
}

#[test]
fn resolver_validation_requires_resolvers_for_fields_with_args() {
    let entries = vec![
        Declaration::query("search")
            .returns("String")
            .arg("q", "String!")
            .into(),
    ];
    let options = SchemaOptions {
        resolver_validation: ResolverValidationOptions {
            require_resolvers_for_args: true,
            ..ResolverValidationOptions::default()
        },
        ..SchemaOptions::default()
    };

    let err = make_schemas(entries.clone(), Resolvers::new(), options.clone()).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingResolver {
            type_name: arcstr::literal!("Query"),
            field: arcstr::literal!("search"),
        },
    );

    let resolvers = Resolvers::new().field("Query", "search", |_| Ok(Some(Value::Null)));
    assert!(make_schemas(entries, resolvers, options).is_ok());
}

#[test]
fn json_entries_assemble_like_built_declarations() {
    let entries = vec![SchemaEntry::Json(serde_json::json!([
        {
            "graphql": "type",
            "name": "Report",
            "relayConnection": true,
            "fields": {
                "id": "ID!",
                "title": {"type": "String!", "description": "Display title"},
            },
        },
        {
            "reports": {
                "graphql": "query",
                "type": "ReportConnection",
                "args": {"$default": ["$paging", "title"]},
            },
        },
    ]))];

    let schemas = make_schemas(entries, Resolvers::new(), SchemaOptions::default()).unwrap();
    let schema = &schemas["default"];

    assert!(schema.concrete_type_by_name("ReportConnection").is_some());
    let reports = schema.query_type().field_by_name("reports").unwrap();
    assert_eq!(
        reports.argument_by_name("title").unwrap().arg_type.to_string(),
        "String",
    );
    assert!(reports.argument_by_name("first").is_some());
}

#[test]
fn malformed_json_entries_are_rejected() {
    let err = make_schemas(
        vec![SchemaEntry::Json(serde_json::json!("not a record"))],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::MalformedDeclaration { .. }));
}

#[test]
fn assembly_is_structurally_idempotent() {
    let digest = |schema: &ExecutableSchema| {
        schema
            .concrete_type_list()
            .into_iter()
            .map(|t| match t {
                MetaType::Object(o) => format!(
                    "{} {{ {} }}",
                    o.name,
                    o.fields
                        .iter()
                        .map(|f| format!("{}: {}", f.name, f.field_type))
                        .join(" "),
                ),
                other => format!("{} ({:?})", other.name(), other.type_kind()),
            })
            .sorted()
            .collect::<Vec<_>>()
    };

    let first = fixture_schemas();
    let second = fixture_schemas();
    for variant in ["admin", "public", "default"] {
        assert_eq!(digest(&first[variant]), digest(&second[variant]), "variant {variant}");
    }
}

#[test]
fn empty_objects_get_a_placeholder_field() {
    let schemas = fixture_schemas();

    // createTeam is admin-only, so the public Mutation root is empty and
    // gets the no-op placeholder.
    let mutation = schemas["public"].mutation_type();
    assert_eq!(field_names(mutation), ["noop"]);

    let noop = mutation.field_by_name("noop").unwrap();
    assert_eq!(noop.description.as_deref(), Some("Placeholder Field"));
    let resolve = noop.field_resolver().unwrap().as_resolve().unwrap();
    let (source, args) = (Value::Null, Arguments::new());
    assert_eq!(
        resolve(ResolveParams {
            source: &source,
            args: &args,
        })
        .unwrap(),
        Some(Value::from("noop")),
    );
}

#[test]
fn input_types_materialize_with_defaults() {
    let schemas = make_schemas(
        vec![
            Declaration::input("TeamFilter")
                .field("nameLike", "String")
                .field(
                    "limit",
                    FieldDefinition::new("Int").default(crate::DefaultValue::thunk(|| Value::Int(20))),
                )
                .field("active", FieldDefinition::new("Boolean").default(true))
                .into(),
            Declaration::query("teams")
                .returns("[String]")
                .arg("filter", "TeamFilter")
                .into(),
        ],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap();

    let filter = schemas["default"].concrete_type_by_name("TeamFilter").unwrap();
    let limit = filter.input_field_by_name("limit").unwrap();
    assert_eq!(limit.default_value, Some(Value::Int(20)));
    let active = filter.input_field_by_name("active").unwrap();
    assert_eq!(active.default_value, Some(Value::Boolean(true)));
    assert!(filter.input_field_by_name("nameLike").unwrap().default_value.is_none());

    let arg = schemas["default"]
        .query_type()
        .field_by_name("teams")
        .unwrap()
        .argument_by_name("filter")
        .unwrap();
    assert_eq!(arg.arg_type.to_string(), "TeamFilter");
}

#[test]
fn custom_scalars_keep_their_hooks_and_are_shared_across_variants() {
    let entries = vec![
        Declaration::scalar("Slug")
            .description("Lowercase identifier")
            .parse_value(|v| match v.as_str() {
                Some(s) if s.chars().all(|c| c.is_ascii_lowercase() || c == '-') => Ok(v.clone()),
                _ => Err(crate::FieldError::from("not a slug")),
            })
            .schemas(["admin", "public"])
            .into(),
        Declaration::query("bySlug")
            .schemas(["admin", "public"])
            .returns("String")
            .arg("slug", "Slug!")
            .into(),
    ];

    let schemas = make_schemas(entries, Resolvers::new(), admin_public()).unwrap();

    let MetaType::Scalar(slug) = schemas["admin"].concrete_type_by_name("Slug").unwrap() else {
        panic!("Slug is a scalar");
    };
    assert!(slug.parse_input(&Value::from("my-team")).is_ok());
    assert!(slug.parse_input(&Value::from("My Team")).is_err());

    // Materialized once; every variant shares the same scalar.
    let admin = schemas["admin"].concrete_type_by_name("Slug").unwrap() as *const MetaType;
    let public = schemas["public"].concrete_type_by_name("Slug").unwrap() as *const MetaType;
    assert_eq!(admin, public);
}

#[test]
fn declared_resolve_type_is_used_when_the_registry_has_none() {
    let schemas = make_schemas(
        vec![
            Declaration::interface("Pet")
                .field("name", "String!")
                .resolve_type(|value| {
                    value.get("meows").is_some().then(|| arcstr::literal!("Cat"))
                })
                .into(),
            Declaration::object("Cat")
                .implements(["Pet"])
                .field("meows", "Boolean!")
                .into(),
        ],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap();

    let MetaType::Interface(pet) = schemas["default"].concrete_type_by_name("Pet").unwrap()
    else {
        panic!("Pet is an interface");
    };
    let cat = Value::Object(IndexMap::from([("meows".to_owned(), Value::Boolean(true))]));
    assert_eq!(pet.dispatch(&cat), Some(arcstr::literal!("Cat")));
}

#[test]
fn implementing_an_undeclared_interface_fails_the_build() {
    let err = make_schemas(
        vec![
            Declaration::object("Team")
                .implements(["Node"])
                .field("id", "ID!")
                .into(),
        ],
        Resolvers::new(),
        SchemaOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UndefinedInterface {
            name: arcstr::literal!("Node")
        },
    );
}

#[test]
fn unions_dispatch_through_the_resolver_registry() {
    let schemas = make_schemas(
        vec![
            Declaration::object("Team").field("name", "String").into(),
            Declaration::object("User").field("email", "String").into(),
            Declaration::union("SearchResult").types(["Team", "User"]).into(),
        ],
        Resolvers::new().resolve_type("SearchResult", |value| {
            value.get("email").is_some().then(|| arcstr::literal!("User"))
        }),
        SchemaOptions::default(),
    )
    .unwrap();

    let MetaType::Union(union) = schemas["default"].concrete_type_by_name("SearchResult").unwrap()
    else {
        panic!("SearchResult is a union");
    };
    assert_eq!(union.of_type_names, ["Team", "User"]);

    let user = Value::Object(IndexMap::from([("email".to_owned(), Value::from("a@b.co"))]));
    assert_eq!(union.dispatch(&user), Some(arcstr::literal!("User")));
}
