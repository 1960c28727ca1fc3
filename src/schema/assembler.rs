//! The schema assembler.
//!
//! [`Schema`] takes loose declarations, files them into the declaration
//! arena, and builds one [`ExecutableSchema`] per named variant:
//!
//! 1. collect the variant's visible declarations (synthesizing relay
//!    connections as types and interfaces land),
//! 2. materialize scalars (shared across variants), enums, interfaces,
//!    input types, object types, unions and fragments, in that order,
//!    since later kinds reference earlier ones by name,
//! 3. validate resolvers and wrap them with the configured middleware.
//!
//! Any failure aborts the whole build; a partially linked schema never
//! reaches the execution engine.

use std::sync::Arc;

use arcstr::{ArcStr, literal};
use fnv::FnvHashMap;
use indexmap::IndexMap;

use super::{
    args, connection,
    fragment::Fragment,
    interfaces,
    meta::{
        Argument, DeprecationStatus, EnumMeta, EnumValue, Field, InputObjectMeta, InterfaceMeta,
        MetaType, ObjectMeta, ScalarMeta, UnionMeta,
    },
    model::ExecutableSchema,
    registry::{Arena, SchemaVariant},
    visibility::{Dependency, Visibility},
};
use crate::{
    ast,
    ast::TypeRef,
    declare::{
        ClassifiedItem, Declaration, EnumDecl, EnumValueEntry, FieldEntry, ScalarDecl, SchemaEntry,
        TypeExpr, malformed_json_entry,
    },
    defaults,
    error::SchemaError,
    resolve::{self, FieldResolver, Resolvers},
    value::Value,
};

/// Options for resolver validation after materialization.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolverValidationOptions {
    /// Every field that accepts arguments must have a resolver.
    pub require_resolvers_for_args: bool,
    /// Every field must have a resolver.
    pub require_resolvers_for_all_fields: bool,
}

/// Options accepted by [`Schema::new`].
#[derive(Clone, Debug)]
pub struct SchemaOptions {
    /// Name of the implicit variant containing every declaration.
    pub default_schema_name: ArcStr,
    /// The named variants to assemble, in order. The default variant is
    /// always appended when absent.
    pub schemas: Vec<ArcStr>,
    /// Report resolver failures through `tracing` before propagating.
    pub log_errors: bool,
    /// Let resolvers produce no value without raising an error.
    pub allow_undefined_in_resolve: bool,
    /// Resolver validation run on every assembled variant.
    pub resolver_validation: ResolverValidationOptions,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            default_schema_name: literal!("default"),
            schemas: Vec::new(),
            log_errors: false,
            allow_undefined_in_resolve: false,
            resolver_validation: ResolverValidationOptions::default(),
        }
    }
}

/// The schema assembler.
///
/// Construction classifies every declaration; [`build`](Schema::build)
/// then materializes each variant. Building the same declarations twice
/// (two independent assemblers) yields structurally equivalent schemas.
pub struct Schema {
    options: SchemaOptions,
    resolvers: Resolvers,
    variant_names: Vec<ArcStr>,
    arena: SchemaVariant,
    materialized_scalars: FnvHashMap<ArcStr, Arc<MetaType>>,
}

/// Assembles executable schemas from `entries`, one per variant.
///
/// Shorthand for [`Schema::new`] followed by [`Schema::build`].
pub fn make_schemas(
    entries: Vec<SchemaEntry>,
    resolvers: Resolvers,
    options: SchemaOptions,
) -> Result<IndexMap<ArcStr, ExecutableSchema>, SchemaError> {
    Schema::new(entries, resolvers, options)?.build()
}

impl Schema {
    /// Files every declaration into the arena, ready to build.
    pub fn new(
        entries: Vec<SchemaEntry>,
        resolvers: Resolvers,
        options: SchemaOptions,
    ) -> Result<Self, SchemaError> {
        if entries.is_empty() {
            return Err(SchemaError::NoDeclarations);
        }

        let mut variant_names = options.schemas.clone();
        if !variant_names.contains(&options.default_schema_name) {
            variant_names.push(options.default_schema_name.clone());
        }

        let mut arena = Arena::with_root_types(&variant_names);
        for entry in entries {
            classify_entry(&mut arena, entry)?;
        }

        Ok(Self {
            arena: arena.freeze(options.default_schema_name.clone()),
            variant_names,
            options,
            resolvers,
            materialized_scalars: FnvHashMap::default(),
        })
    }

    /// Builds every variant, keyed by variant name.
    pub fn build(mut self) -> Result<IndexMap<ArcStr, ExecutableSchema>, SchemaError> {
        let mut schemas = IndexMap::new();
        for name in self.variant_names.clone() {
            let schema = self.build_variant(&name)?;
            schemas.insert(name, schema);
        }
        Ok(schemas)
    }

    /// Builds a single variant.
    pub fn build_variant(&mut self, name: &str) -> Result<ExecutableSchema, SchemaError> {
        let variant = self.collect_variant(name);

        let mut built: IndexMap<ArcStr, Arc<MetaType>> = defaults::all_builtins().collect();

        for decl in variant.scalars.values() {
            let meta = self.materialize_scalar(decl);
            insert_user_meta(&mut built, meta);
        }

        let mut enum_values = IndexMap::new();
        for decl in variant.enums.values() {
            let (meta, table) = self.materialize_enum(&variant, decl);
            enum_values.insert(decl.name.clone(), table);
            insert_user_meta(&mut built, Arc::new(meta));
        }

        for decl in variant.interfaces.values() {
            let meta = self.materialize_interface(&variant, decl)?;
            insert_user_meta(&mut built, Arc::new(meta));
        }

        for decl in variant.input_types.values() {
            let meta = self.materialize_input(&variant, decl)?;
            insert_user_meta(&mut built, Arc::new(meta));
        }

        let mut objects = Vec::new();
        for decl in variant.types.values() {
            objects.push(self.materialize_object(&variant, decl)?);
        }

        for decl in variant.unions.values() {
            let meta = self.materialize_union(&variant, decl)?;
            insert_user_meta(&mut built, Arc::new(meta));
        }

        let mut fragments = IndexMap::new();
        for decl in variant.fragments.values() {
            if !variant.types.contains_key(&decl.on)
                && !variant.interfaces.contains_key(&decl.on)
                && !variant.unions.contains_key(&decl.on)
                && defaults::builtin_type(&decl.on).is_none()
            {
                return Err(SchemaError::FragmentTargetMissing {
                    fragment: decl.name.clone(),
                    on: decl.on.clone(),
                });
            }
            fragments.insert(decl.name.clone(), Fragment::new(decl));
        }

        for mut object in objects {
            self.validate_object_resolvers(&object)?;
            self.decorate_object(&mut object);
            insert_user_meta(&mut built, Arc::new(object.into_meta()));
        }

        Ok(ExecutableSchema {
            variant: ArcStr::from(name),
            types: built.into_iter().collect(),
            query_type_name: literal!("Query"),
            mutation_type_name: literal!("Mutation"),
            subscription_type_name: literal!("Subscription"),
            fragments,
            enum_values,
        })
    }

    /// Collects the variant's view of the arena, bucket by bucket in
    /// materialization order, synthesizing relay connections for the
    /// types and interfaces that request them.
    fn collect_variant(&self, name: &str) -> SchemaVariant {
        let mut variant = SchemaVariant::empty(ArcStr::from(name));

        for (n, decl) in &self.arena.scalars {
            if self.contains_top_level(&variant, decl.schemas.as_deref(), &[]) {
                variant.scalars.insert(n.clone(), decl.clone());
            }
        }

        for (n, decl) in &self.arena.enums {
            if self.contains_top_level(&variant, decl.schemas.as_deref(), &[]) {
                variant.enums.insert(n.clone(), decl.clone());
            }
        }

        for (n, decl) in &self.arena.interfaces {
            if self.contains_top_level(&variant, decl.schemas.as_deref(), &[]) {
                variant.interfaces.insert(n.clone(), decl.clone());
                if let Some(rc) = &decl.relay_connection {
                    connection::ensure_connection_types(&mut variant, n, rc);
                }
            }
        }

        for (n, decl) in &self.arena.input_types {
            if self.contains_top_level(&variant, decl.schemas.as_deref(), &[]) {
                variant.input_types.insert(n.clone(), decl.clone());
            }
        }

        for (n, decl) in &self.arena.types {
            let deps: Vec<Dependency<'_>> =
                decl.implements.iter().map(|i| Dependency::Raw(i)).collect();
            if self.contains_top_level(&variant, decl.schemas.as_deref(), &deps) {
                variant.types.insert(n.clone(), decl.clone());
                if let Some(rc) = &decl.relay_connection {
                    connection::ensure_connection_types(&mut variant, n, rc);
                }
            }
        }

        for (n, decl) in &self.arena.unions {
            if self.contains_top_level(&variant, decl.schemas.as_deref(), &[]) {
                variant.unions.insert(n.clone(), decl.clone());
            }
        }

        for (n, decl) in &self.arena.fragments {
            if self.contains_top_level(&variant, decl.schemas.as_deref(), &[Dependency::Raw(&decl.on)])
            {
                variant.fragments.insert(n.clone(), decl.clone());
            }
        }

        variant
    }

    fn contains_top_level(
        &self,
        variant: &SchemaVariant,
        membership: Option<&[ArcStr]>,
        deps: &[Dependency<'_>],
    ) -> bool {
        Visibility {
            variant,
            default_name: &self.options.default_schema_name,
        }
        .should_contain(membership, deps, false)
    }

    /// Materializes a scalar exactly once; variants share the result
    /// through the assembler's side table.
    fn materialize_scalar(&mut self, decl: &ScalarDecl) -> Arc<MetaType> {
        if let Some(existing) = self.materialized_scalars.get(&decl.name) {
            return existing.clone();
        }

        let meta = match &decl.delegate {
            Some(delegate) => delegate.clone(),
            None => {
                let mut scalar = ScalarMeta::new(decl.name.clone());
                scalar.description = decl.description.clone();
                scalar.serialize_fn = decl.serialize.clone();
                scalar.parse_value_fn = decl.parse_value.clone();
                scalar.parse_literal_fn = decl.parse_literal.clone();
                Arc::new(scalar.into_meta())
            }
        };

        self.materialized_scalars.insert(decl.name.clone(), meta.clone());
        meta
    }

    fn materialize_enum(
        &self,
        variant: &SchemaVariant,
        decl: &EnumDecl,
    ) -> (MetaType, IndexMap<ArcStr, Value>) {
        let visibility = Visibility {
            variant,
            default_name: &self.options.default_schema_name,
        };

        let mut values = Vec::new();
        let mut table = IndexMap::new();
        for (key, entry) in &decl.values {
            match entry {
                EnumValueEntry::Literal(value) => {
                    values.push(EnumValue::new(key.clone()));
                    table.insert(key.clone(), value.clone());
                }
                EnumValueEntry::Def(def) => {
                    if !visibility.should_contain(def.schemas.as_deref(), &[], true) {
                        continue;
                    }
                    let name = def.name.clone().unwrap_or_else(|| key.clone());
                    let mut value = EnumValue::new(name.clone());
                    value.description = def.description.clone();
                    if let Some(reason) = &def.deprecation_reason {
                        value.deprecation_status =
                            DeprecationStatus::Deprecated(Some(reason.clone()));
                    }
                    values.push(value);
                    table.insert(
                        name.clone(),
                        def.value
                            .clone()
                            .unwrap_or_else(|| Value::String(name.to_string())),
                    );
                }
            }
        }

        let mut meta = EnumMeta::new(decl.name.clone(), values, table.clone());
        meta.description = decl.description.clone();
        (meta.into_meta(), table)
    }

    fn materialize_interface(
        &self,
        variant: &SchemaVariant,
        decl: &crate::declare::InterfaceDecl,
    ) -> Result<MetaType, SchemaError> {
        let mut processing = Vec::new();
        let chain = interfaces::extension_chain(&decl.name, &self.arena.interfaces, &mut processing)?;
        let merged = interfaces::merged_fields(&decl.fields, &chain[1..], &self.arena.interfaces);
        let fields = self.parse_fields(variant, &merged, Some(&decl.name))?;

        let mut meta = InterfaceMeta::new(decl.name.clone(), fields);
        meta.description = decl.description.clone();
        meta.interface_names = chain[1..]
            .iter()
            .filter(|n| variant.interfaces.contains_key(*n))
            .cloned()
            .collect();
        meta.resolve_type = self
            .resolvers
            .resolve_type_fn(&decl.name)
            .cloned()
            .or_else(|| decl.resolve_type.clone());

        Ok(meta.into_meta())
    }

    fn materialize_input(
        &self,
        variant: &SchemaVariant,
        decl: &crate::declare::InputDecl,
    ) -> Result<MetaType, SchemaError> {
        let mut input_fields = Vec::new();
        for (name, entry) in &decl.fields {
            if let Some(argument) = self.parse_argument(variant, name, entry)? {
                input_fields.push(argument);
            }
        }

        let mut meta = InputObjectMeta::new(decl.name.clone(), input_fields);
        meta.description = decl.description.clone();
        Ok(meta.into_meta())
    }

    fn materialize_object(
        &self,
        variant: &SchemaVariant,
        decl: &crate::declare::TypeDecl,
    ) -> Result<ObjectMeta, SchemaError> {
        let chain = interfaces::implementation_chain(&decl.implements, &self.arena.interfaces)?;
        let merged = interfaces::merged_fields(&decl.fields, &chain, &self.arena.interfaces);
        let mut fields = self.parse_fields(variant, &merged, Some(&decl.name))?;

        // A structurally valid object needs at least one field; roots in
        // particular are often empty in a given variant.
        if fields.is_empty() {
            fields.push(
                Field::new(literal!("noop"), TypeRef::Named(literal!("String")))
                    .description("Placeholder Field")
                    .resolver(FieldResolver::Resolve(Arc::new(|_| {
                        Ok(Some(Value::from("noop")))
                    }))),
            );
        }

        let mut meta = ObjectMeta::new(decl.name.clone(), fields);
        meta.description = decl.description.clone();
        meta.interface_names = chain
            .iter()
            .filter(|n| variant.interfaces.contains_key(*n))
            .cloned()
            .collect();
        meta.is_type_of = self
            .resolvers
            .is_type_of_fn(&decl.name)
            .cloned()
            .or_else(|| decl.is_type_of.clone());

        Ok(meta)
    }

    fn materialize_union(
        &self,
        variant: &SchemaVariant,
        decl: &crate::declare::UnionDecl,
    ) -> Result<MetaType, SchemaError> {
        let mut of_type_names = Vec::new();
        for member in &decl.member_types {
            let ty = self.parse_type(variant, member)?;
            of_type_names.push(ArcStr::from(ty.innermost_name()));
        }

        let mut meta = UnionMeta::new(decl.name.clone(), of_type_names);
        meta.description = decl.description.clone();
        meta.resolve_type = self
            .resolvers
            .resolve_type_fn(&decl.name)
            .cloned()
            .or_else(|| decl.resolve_type.clone());

        Ok(meta.into_meta())
    }

    fn parse_fields(
        &self,
        variant: &SchemaVariant,
        fields: &IndexMap<ArcStr, FieldEntry>,
        parent_name: Option<&ArcStr>,
    ) -> Result<Vec<Field>, SchemaError> {
        let mut parsed = Vec::new();
        for (name, entry) in fields {
            let resolver =
                parent_name.and_then(|parent| self.resolvers.field_resolver(parent, name));
            if let Some(field) = self.parse_field(variant, name, entry, resolver)? {
                parsed.push(field);
            }
        }
        Ok(parsed)
    }

    /// Parses one field; `None` means the field is not visible in this
    /// variant.
    fn parse_field(
        &self,
        variant: &SchemaVariant,
        name: &ArcStr,
        entry: &FieldEntry,
        resolver: Option<&FieldResolver>,
    ) -> Result<Option<Field>, SchemaError> {
        let visibility = Visibility {
            variant,
            default_name: &self.options.default_schema_name,
        };
        let dep = entry
            .type_dependency()
            .map_or(Dependency::Resolved, Dependency::Raw);
        if !visibility.should_contain(entry.schemas(), &[dep], true) {
            return Ok(None);
        }

        match entry {
            FieldEntry::Ref(raw) => {
                let mut field = Field::new(name.clone(), self.parse_type(variant, raw)?);
                field.resolver = resolver.cloned();
                Ok(Some(field))
            }
            FieldEntry::Def(def) => {
                let field_type = self.parse_type_expr(variant, &def.type_expr)?;
                let field_name = def.name.clone().unwrap_or_else(|| name.clone());
                let mut field = Field::new(field_name, field_type);
                field.description = def.description.clone();
                if let Some(reason) = &def.deprecation_reason {
                    field.deprecation_status = DeprecationStatus::Deprecated(Some(reason.clone()));
                }

                field.resolver = match resolver {
                    Some(resolver) => Some(resolver.clone()),
                    None => def
                        .subscription
                        .clone()
                        .map(|s| FieldResolver::Subscribe(s.into_subscribe()))
                        .or_else(|| def.resolve.clone().map(FieldResolver::Resolve)),
                };

                if def.args.is_some() || !def.default_args.is_empty() {
                    let owner = match &def.type_expr {
                        TypeExpr::Raw(raw) => ast::type_name(raw),
                        TypeExpr::Resolved(ty) => Some(ty.innermost_name().into()),
                    };
                    let expanded = args::expand_args(
                        def.args.as_ref(),
                        &def.default_args,
                        owner.as_deref(),
                        variant,
                        &self.arena,
                    )?;
                    let mut arguments = Vec::new();
                    for (arg_name, arg_entry) in &expanded {
                        if let Some(argument) = self.parse_argument(variant, arg_name, arg_entry)? {
                            arguments.push(argument);
                        }
                    }
                    field.arguments = Some(arguments);
                }

                Ok(Some(field))
            }
        }
    }

    /// Parses one argument or input field; `None` means it is not
    /// visible in this variant.
    fn parse_argument(
        &self,
        variant: &SchemaVariant,
        name: &ArcStr,
        entry: &FieldEntry,
    ) -> Result<Option<Argument>, SchemaError> {
        let visibility = Visibility {
            variant,
            default_name: &self.options.default_schema_name,
        };
        let dep = entry
            .type_dependency()
            .map_or(Dependency::Resolved, Dependency::Raw);
        if !visibility.should_contain(entry.schemas(), &[dep], true) {
            return Ok(None);
        }

        match entry {
            FieldEntry::Ref(raw) => Ok(Some(Argument::new(
                name.clone(),
                self.parse_type(variant, raw)?,
            ))),
            FieldEntry::Def(def) => {
                let arg_type = self.parse_type_expr(variant, &def.type_expr)?;
                let arg_name = def.name.clone().unwrap_or_else(|| name.clone());
                let mut argument = Argument::new(arg_name, arg_type);
                argument.description = def.description.clone();
                argument.default_value = def.default.as_ref().map(|d| d.evaluate());
                Ok(Some(argument))
            }
        }
    }

    fn parse_type_expr(
        &self,
        variant: &SchemaVariant,
        expr: &TypeExpr,
    ) -> Result<TypeRef, SchemaError> {
        match expr {
            TypeExpr::Resolved(ty) => Ok(ty.clone()),
            TypeExpr::Raw(raw) => self.parse_type(variant, raw),
        }
    }

    /// Parses a type-reference string against the variant's registry.
    fn parse_type(&self, variant: &SchemaVariant, raw: &str) -> Result<TypeRef, SchemaError> {
        let modifiers = ast::parse_type_reference(raw)?;
        let canonical = variant
            .canonical_type_name(&modifiers.type_name)
            .ok_or_else(|| SchemaError::UnknownType {
                name: ArcStr::from(modifiers.type_name.as_str()),
            })?;
        Ok(modifiers.apply(canonical))
    }

    fn validate_object_resolvers(&self, meta: &ObjectMeta) -> Result<(), SchemaError> {
        let validation = self.options.resolver_validation;
        if !validation.require_resolvers_for_args && !validation.require_resolvers_for_all_fields {
            return Ok(());
        }

        for field in &meta.fields {
            let required = validation.require_resolvers_for_all_fields
                || (validation.require_resolvers_for_args
                    && field.arguments.as_ref().is_some_and(|a| !a.is_empty()));
            if required && field.resolver.is_none() {
                return Err(SchemaError::MissingResolver {
                    type_name: meta.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Wraps field resolvers with the configured middleware. Applied to
    /// object types only; subscription resolvers pass through untouched.
    fn decorate_object(&self, meta: &mut ObjectMeta) {
        for field in &mut meta.fields {
            let Some(FieldResolver::Resolve(mut resolve)) = field.resolver.clone() else {
                continue;
            };

            if self.options.log_errors {
                resolve = resolve::with_error_logging(resolve, meta.name.clone(), field.name.clone());
            }
            if !self.options.allow_undefined_in_resolve {
                resolve =
                    resolve::with_catch_undefined(resolve, meta.name.clone(), field.name.clone());
            }
            field.resolver = Some(FieldResolver::Resolve(resolve));
        }
    }
}

/// Inserts a materialized user type, unless a built-in scalar claims the
/// name. Built-in scalars take precedence in every name lookup, so the
/// user type would be unreachable.
fn insert_user_meta(types: &mut IndexMap<ArcStr, Arc<MetaType>>, meta: Arc<MetaType>) {
    if defaults::builtin_scalar(meta.name()).is_some() {
        return;
    }
    types.insert(meta.name().clone(), meta);
}

fn classify_entry(arena: &mut Arena, entry: SchemaEntry) -> Result<(), SchemaError> {
    match entry {
        SchemaEntry::Item(decl) => classify_item(arena, decl, None),
        SchemaEntry::Map(map) => {
            for (key, decl) in map {
                classify_item(arena, decl, Some(&key))?;
            }
            Ok(())
        }
        SchemaEntry::List(entries) => {
            for entry in entries {
                classify_entry(arena, entry)?;
            }
            Ok(())
        }
        SchemaEntry::Json(value) => classify_json(arena, &value),
    }
}

fn classify_json(arena: &mut Arena, value: &serde_json::Value) -> Result<(), SchemaError> {
    match value {
        serde_json::Value::Object(obj) => {
            if obj.contains_key("graphql") {
                classify_item(arena, Declaration::from_json(value)?, None)
            } else {
                for (key, item) in obj {
                    classify_item(arena, Declaration::from_json(item)?, Some(key))?;
                }
                Ok(())
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                classify_json(arena, item)?;
            }
            Ok(())
        }
        other => Err(malformed_json_entry(other)),
    }
}

fn classify_item(
    arena: &mut Arena,
    decl: Declaration,
    fallback_name: Option<&str>,
) -> Result<(), SchemaError> {
    match decl.classify(fallback_name)? {
        ClassifiedItem::Type(t) => {
            arena.types.insert(t.name.clone(), t);
        }
        ClassifiedItem::Input(i) => {
            arena.input_types.insert(i.name.clone(), i);
        }
        ClassifiedItem::Enum(e) => {
            arena.enums.insert(e.name.clone(), e);
        }
        ClassifiedItem::Interface(i) => {
            arena.interfaces.insert(i.name.clone(), i);
        }
        ClassifiedItem::Scalar(s) => {
            arena.scalars.insert(s.name.clone(), s);
        }
        ClassifiedItem::Union(u) => {
            arena.unions.insert(u.name.clone(), u);
        }
        ClassifiedItem::Fragment(f) => {
            arena.fragments.insert(f.name.clone(), f);
        }
        ClassifiedItem::Operation(kind, op) => {
            arena
                .root_mut(kind)
                .fields
                .insert(op.name.clone(), FieldEntry::Def(op.field));
        }
    }
    Ok(())
}
