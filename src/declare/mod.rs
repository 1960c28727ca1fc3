//! Schema declarations: the raw records the assembler links together.
//!
//! A [`Declaration`] is a loose, caller-authored record: a `graphql` kind
//! discriminator plus whatever payload that kind needs. Declarations are
//! classified exactly once, at assembler construction, into strongly
//! typed per-kind records; everything downstream of the classifier works
//! on those.

mod from_json;

pub(crate) use from_json::malformed as malformed_json_entry;

use std::sync::Arc;

use arcstr::ArcStr;
use compact_str::CompactString;
use derive_more::with_trait::Debug;
use indexmap::IndexMap;

use crate::{
    ast::TypeRef,
    error::SchemaError,
    resolve::{
        IsTypeOfFn, ParseLiteralFn, ParseValueFn, ResolveFn, ResolveParams, ResolveTypeFn,
        SerializeFn, Subscription,
    },
    schema::meta::MetaType,
    value::Value,
};

/// One top-level input handed to the assembler.
///
/// Mirrors the three accepted declaration shapes: a single declaration,
/// a map of name → declaration (the name is taken from the key when the
/// declaration doesn't carry its own), or a list of further entries.
/// [`SchemaEntry::Json`] additionally accepts data-only declarations as
/// plain JSON.
#[derive(Clone, Debug)]
pub enum SchemaEntry {
    /// A single declaration.
    Item(Declaration),
    /// Named declarations; map keys act as fallback names.
    Map(IndexMap<String, Declaration>),
    /// A list of further entries.
    List(Vec<SchemaEntry>),
    /// A loose JSON entry (single declaration, map, or list).
    Json(serde_json::Value),
}

impl From<Declaration> for SchemaEntry {
    fn from(decl: Declaration) -> Self {
        Self::Item(decl)
    }
}

impl From<IndexMap<String, Declaration>> for SchemaEntry {
    fn from(map: IndexMap<String, Declaration>) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<Declaration>> for SchemaEntry {
    fn from(list: Vec<Declaration>) -> Self {
        Self::List(list.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for SchemaEntry {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// A type expression on a field, argument or operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeExpr {
    /// An unparsed reference string, e.g. `"[User!]!"`.
    Raw(CompactString),
    /// A pre-resolved reference that flows through the pipeline as-is.
    Resolved(TypeRef),
}

impl TypeExpr {
    /// Strips a trailing non-null marker (used when inheriting argument
    /// definitions, where required-ness is dropped by default).
    #[must_use]
    pub(crate) fn strip_required(self) -> Self {
        match self {
            Self::Raw(s) => Self::Raw(s.strip_suffix('!').map(Into::into).unwrap_or(s)),
            Self::Resolved(ty) => Self::Resolved(ty.nullable()),
        }
    }

    /// Enforces a trailing non-null marker (the `name!` token convention).
    #[must_use]
    pub(crate) fn enforce_required(self) -> Self {
        match self {
            Self::Raw(mut s) => {
                if !s.ends_with('!') {
                    s.push('!');
                }
                Self::Raw(s)
            }
            Self::Resolved(ty) => Self::Resolved(ty.non_null()),
        }
    }

    pub(crate) fn as_raw(&self) -> Option<&str> {
        match self {
            Self::Raw(s) => Some(s),
            Self::Resolved(_) => None,
        }
    }
}

impl From<&str> for TypeExpr {
    fn from(s: &str) -> Self {
        Self::Raw(s.into())
    }
}

impl From<String> for TypeExpr {
    fn from(s: String) -> Self {
        Self::Raw(s.into())
    }
}

impl From<TypeRef> for TypeExpr {
    fn from(ty: TypeRef) -> Self {
        Self::Resolved(ty)
    }
}

/// A default value for an argument or input field: either a literal or a
/// zero-argument callback evaluated at materialization time.
#[derive(Clone, Debug)]
pub enum DefaultValue {
    /// A literal value.
    Literal(Value),
    /// A callback producing the value.
    Thunk(#[debug(skip)] Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Creates a thunk default.
    pub fn thunk<F: Fn() -> Value + Send + Sync + 'static>(f: F) -> Self {
        Self::Thunk(Arc::new(f))
    }

    pub(crate) fn evaluate(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Thunk(f) => f(),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::Literal(value.into())
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Literal(value.into())
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Literal(value.into())
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Literal(value.into())
    }
}

/// A field as declared: either a bare type-reference string or a full
/// definition.
#[derive(Clone, Debug)]
pub enum FieldEntry {
    /// Bare reference, e.g. `"String!"`.
    Ref(CompactString),
    /// Full field definition.
    Def(FieldDefinition),
}

impl FieldEntry {
    /// Normalizes to a full definition (`Ref` becomes `{type}`).
    pub(crate) fn into_definition(self) -> FieldDefinition {
        match self {
            Self::Ref(s) => FieldDefinition::new(TypeExpr::Raw(s)),
            Self::Def(def) => def,
        }
    }

    pub(crate) fn schemas(&self) -> Option<&[ArcStr]> {
        match self {
            Self::Ref(_) => None,
            Self::Def(def) => def.schemas.as_deref(),
        }
    }

    pub(crate) fn type_dependency(&self) -> Option<&str> {
        match self {
            Self::Ref(s) => Some(s),
            Self::Def(def) => def.type_expr.as_raw(),
        }
    }

    #[must_use]
    pub(crate) fn strip_required(self) -> Self {
        match self {
            Self::Ref(s) => Self::Ref(s.strip_suffix('!').map(Into::into).unwrap_or(s)),
            Self::Def(mut def) => {
                def.type_expr = def.type_expr.strip_required();
                Self::Def(def)
            }
        }
    }

    #[must_use]
    pub(crate) fn enforce_required(self) -> Self {
        match self {
            Self::Ref(mut s) => {
                if !s.ends_with('!') {
                    s.push('!');
                }
                Self::Ref(s)
            }
            Self::Def(mut def) => {
                def.type_expr = def.type_expr.enforce_required();
                Self::Def(def)
            }
        }
    }

    /// Merges this (more specific) entry over `base`.
    ///
    /// Two bare references: the specific one wins outright. Otherwise both
    /// sides are normalized to definitions and shallow-combined, the
    /// specific side's set slots taking precedence.
    #[must_use]
    pub(crate) fn merged_over(self, base: Self) -> Self {
        match (self, base) {
            (specific @ Self::Ref(_), Self::Ref(_)) => specific,
            (specific, base) => Self::Def(
                specific
                    .into_definition()
                    .shallow_over(base.into_definition()),
            ),
        }
    }
}

impl From<&str> for FieldEntry {
    fn from(s: &str) -> Self {
        Self::Ref(s.into())
    }
}

impl From<String> for FieldEntry {
    fn from(s: String) -> Self {
        Self::Ref(s.into())
    }
}

impl From<FieldDefinition> for FieldEntry {
    fn from(def: FieldDefinition) -> Self {
        Self::Def(def)
    }
}

impl From<TypeRef> for FieldEntry {
    fn from(ty: TypeRef) -> Self {
        Self::Def(FieldDefinition::new(ty))
    }
}

/// A fully spelled out field declaration.
#[derive(Clone, Debug)]
pub struct FieldDefinition {
    pub(crate) name: Option<ArcStr>,
    pub(crate) type_expr: TypeExpr,
    pub(crate) description: Option<ArcStr>,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) deprecation_reason: Option<ArcStr>,
    #[debug(skip)]
    pub(crate) resolve: Option<ResolveFn>,
    pub(crate) subscription: Option<Subscription>,
    pub(crate) args: Option<IndexMap<ArcStr, FieldEntry>>,
    pub(crate) default_args: Vec<CompactString>,
    pub(crate) schemas: Option<Vec<ArcStr>>,
}

impl FieldDefinition {
    /// Creates a definition of the given type.
    pub fn new(type_expr: impl Into<TypeExpr>) -> Self {
        Self {
            name: None,
            type_expr: type_expr.into(),
            description: None,
            default: None,
            deprecation_reason: None,
            resolve: None,
            subscription: None,
            args: None,
            default_args: Vec::new(),
            schemas: None,
        }
    }

    /// Overrides the name the field is filed under.
    #[must_use]
    pub fn name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description shown in docs.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value (arguments and input fields only).
    #[must_use]
    pub fn default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the field deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<ArcStr>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    /// Attaches a resolver directly to the declaration.
    #[must_use]
    pub fn resolve<F>(mut self, resolve: F) -> Self
    where
        F: Fn(ResolveParams<'_>) -> crate::resolve::FieldResult + Send + Sync + 'static,
    {
        self.resolve = Some(Arc::new(resolve));
        self
    }

    /// Attaches a subscription resolver directly to the declaration.
    #[must_use]
    pub fn subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = Some(subscription);
        self
    }

    /// Adds an argument.
    #[must_use]
    pub fn arg(mut self, name: impl Into<ArcStr>, entry: impl Into<FieldEntry>) -> Self {
        self.args
            .get_or_insert_default()
            .insert(name.into(), entry.into());
        self
    }

    /// Sets the `$default` argument tokens (`$paging`, `$order`, `$sort`,
    /// or field names to inherit from the owning type; a trailing `!`
    /// keeps the inherited field required).
    #[must_use]
    pub fn default_args<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.default_args = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the field to the given schema variants.
    #[must_use]
    pub fn schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArcStr>,
    {
        self.schemas = Some(schemas.into_iter().map(Into::into).collect());
        self
    }

    /// Shallow-combines `self` over `base`: every slot set here wins,
    /// unset slots fall back to `base`.
    pub(crate) fn shallow_over(self, base: Self) -> Self {
        Self {
            name: self.name.or(base.name),
            type_expr: self.type_expr,
            description: self.description.or(base.description),
            default: self.default.or(base.default),
            deprecation_reason: self.deprecation_reason.or(base.deprecation_reason),
            resolve: self.resolve.or(base.resolve),
            subscription: self.subscription.or(base.subscription),
            args: self.args.or(base.args),
            default_args: if self.default_args.is_empty() {
                base.default_args
            } else {
                self.default_args
            },
            schemas: self.schemas.or(base.schemas),
        }
    }
}

/// An enum value as declared: a bare literal or a full definition.
#[derive(Clone, Debug)]
pub enum EnumValueEntry {
    /// Bare literal; the declared name doubles as the value.
    Literal(Value),
    /// Full definition.
    Def(EnumValueDefinition),
}

impl From<Value> for EnumValueEntry {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for EnumValueEntry {
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<String> for EnumValueEntry {
    fn from(value: String) -> Self {
        Self::Literal(value.into())
    }
}

impl From<i32> for EnumValueEntry {
    fn from(value: i32) -> Self {
        Self::Literal(value.into())
    }
}

impl From<bool> for EnumValueEntry {
    fn from(value: bool) -> Self {
        Self::Literal(value.into())
    }
}

impl From<EnumValueDefinition> for EnumValueEntry {
    fn from(def: EnumValueDefinition) -> Self {
        Self::Def(def)
    }
}

/// A fully spelled out enum value.
#[derive(Clone, Debug, Default)]
pub struct EnumValueDefinition {
    pub(crate) name: Option<ArcStr>,
    pub(crate) value: Option<Value>,
    pub(crate) description: Option<ArcStr>,
    pub(crate) deprecation_reason: Option<ArcStr>,
    pub(crate) schemas: Option<Vec<ArcStr>>,
}

impl EnumValueDefinition {
    /// Creates an empty definition; the underlying value defaults to the
    /// declared name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the name the value is filed under.
    #[must_use]
    pub fn name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the underlying value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the description shown in docs.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the value deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<ArcStr>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    /// Restricts the value to the given schema variants.
    #[must_use]
    pub fn schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArcStr>,
    {
        self.schemas = Some(schemas.into_iter().map(Into::into).collect());
        self
    }
}

/// Extra fields merged into a synthesized relay connection pair.
#[derive(Clone, Debug, Default)]
pub struct RelayConnection {
    pub(crate) edge_fields: IndexMap<ArcStr, FieldEntry>,
    pub(crate) fields: IndexMap<ArcStr, FieldEntry>,
}

impl RelayConnection {
    /// Plain synthesis with the default edge/connection shapes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the synthesized `<Type>Edge` (caller fields win
    /// over the defaults on name conflicts).
    #[must_use]
    pub fn edge_field(mut self, name: impl Into<ArcStr>, entry: impl Into<FieldEntry>) -> Self {
        self.edge_fields.insert(name.into(), entry.into());
        self
    }

    /// Adds a field to the synthesized `<Type>Connection`.
    #[must_use]
    pub fn field(mut self, name: impl Into<ArcStr>, entry: impl Into<FieldEntry>) -> Self {
        self.fields.insert(name.into(), entry.into());
        self
    }
}

/// One node of a fragment's selection tree.
#[derive(Clone, Debug)]
pub enum SelectionNode {
    /// A plain field name.
    Field(ArcStr),
    /// A field with alias, arguments or a nested selection.
    Nested(SelectionField),
}

impl From<&str> for SelectionNode {
    fn from(name: &str) -> Self {
        Self::Field(name.into())
    }
}

impl From<SelectionField> for SelectionNode {
    fn from(field: SelectionField) -> Self {
        Self::Nested(field)
    }
}

/// A structured selection entry.
#[derive(Clone, Debug)]
pub struct SelectionField {
    pub(crate) name: ArcStr,
    pub(crate) alias: Option<ArcStr>,
    pub(crate) args: IndexMap<ArcStr, Value>,
    pub(crate) fields: Vec<SelectionNode>,
}

impl SelectionField {
    /// Selects `name`.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            args: IndexMap::new(),
            fields: Vec::new(),
        }
    }

    /// Aliases the selection.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<ArcStr>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an argument literal.
    #[must_use]
    pub fn arg(mut self, name: impl Into<ArcStr>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Adds a nested selection node.
    #[must_use]
    pub fn field(mut self, node: impl Into<SelectionNode>) -> Self {
        self.fields.push(node.into());
        self
    }
}

/// A raw schema declaration.
///
/// The `graphql` discriminator decides which payload slots are
/// meaningful; the classifier rejects declarations whose discriminator is
/// missing or unrecognized. Built with chained setters:
///
/// ```
/// use graphql_assembly::Declaration;
///
/// let widget = Declaration::object("Widget")
///     .description("A thing")
///     .relay_connection(true)
///     .field("id", "ID!")
///     .field("title", "String");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Declaration {
    pub(crate) graphql: Option<CompactString>,
    pub(crate) name: Option<ArcStr>,
    description: Option<ArcStr>,
    schemas: Option<Vec<ArcStr>>,
    fields: IndexMap<ArcStr, FieldEntry>,
    args: Option<IndexMap<ArcStr, FieldEntry>>,
    default_args: Vec<CompactString>,
    values: IndexMap<ArcStr, EnumValueEntry>,
    member_types: Vec<CompactString>,
    implements: Vec<ArcStr>,
    extends: Vec<ArcStr>,
    relay_connection: Option<RelayConnection>,
    type_expr: Option<TypeExpr>,
    selection: Vec<SelectionNode>,
    deprecation_reason: Option<ArcStr>,
    #[debug(skip)]
    resolve: Option<ResolveFn>,
    subscription: Option<Subscription>,
    #[debug(skip)]
    resolve_type: Option<ResolveTypeFn>,
    #[debug(skip)]
    is_type_of: Option<IsTypeOfFn>,
    #[debug(skip)]
    scalar_delegate: Option<Arc<MetaType>>,
    #[debug(skip)]
    serialize: Option<SerializeFn>,
    #[debug(skip)]
    parse_value: Option<ParseValueFn>,
    #[debug(skip)]
    parse_literal: Option<ParseLiteralFn>,
}

impl Declaration {
    /// Creates a declaration with the given `graphql` kind discriminator.
    ///
    /// The recognized kinds are `type`, `input`, `enum`, `interface`,
    /// `scalar`, `union`, `query`, `mutation`, `subscription` and
    /// `fragment`; anything else is rejected at classification.
    pub fn new(kind: impl Into<CompactString>) -> Self {
        Self {
            graphql: Some(kind.into()),
            ..Self::default()
        }
    }

    fn named(kind: &str, name: impl Into<ArcStr>) -> Self {
        Self::new(kind).name(name)
    }

    /// An object type declaration.
    pub fn object(name: impl Into<ArcStr>) -> Self {
        Self::named("type", name)
    }

    /// An input type declaration.
    pub fn input(name: impl Into<ArcStr>) -> Self {
        Self::named("input", name)
    }

    /// An enum declaration.
    pub fn enumeration(name: impl Into<ArcStr>) -> Self {
        Self::named("enum", name)
    }

    /// An interface declaration.
    pub fn interface(name: impl Into<ArcStr>) -> Self {
        Self::named("interface", name)
    }

    /// A scalar declaration.
    pub fn scalar(name: impl Into<ArcStr>) -> Self {
        Self::named("scalar", name)
    }

    /// A union declaration.
    pub fn union(name: impl Into<ArcStr>) -> Self {
        Self::named("union", name)
    }

    /// A root query field declaration.
    pub fn query(name: impl Into<ArcStr>) -> Self {
        Self::named("query", name)
    }

    /// A root mutation field declaration.
    pub fn mutation(name: impl Into<ArcStr>) -> Self {
        Self::named("mutation", name)
    }

    /// A root subscription field declaration.
    pub fn subscription_field(name: impl Into<ArcStr>) -> Self {
        Self::named("subscription", name)
    }

    /// A fragment declaration.
    pub fn fragment(name: impl Into<ArcStr>) -> Self {
        Self::named("fragment", name)
    }

    /// Sets the declaration name.
    #[must_use]
    pub fn name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description shown in docs.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restricts the declaration to the given schema variants.
    ///
    /// Without this, a top-level declaration only appears in the implicit
    /// default variant.
    #[must_use]
    pub fn schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArcStr>,
    {
        self.schemas = Some(schemas.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a field (types, inputs, interfaces).
    #[must_use]
    pub fn field(mut self, name: impl Into<ArcStr>, entry: impl Into<FieldEntry>) -> Self {
        self.fields.insert(name.into(), entry.into());
        self
    }

    /// Adds an argument (queries, mutations, subscriptions).
    #[must_use]
    pub fn arg(mut self, name: impl Into<ArcStr>, entry: impl Into<FieldEntry>) -> Self {
        self.args
            .get_or_insert_default()
            .insert(name.into(), entry.into());
        self
    }

    /// Sets the `$default` argument tokens.
    #[must_use]
    pub fn default_args<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.default_args = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an enum value.
    #[must_use]
    pub fn value(mut self, name: impl Into<ArcStr>, entry: impl Into<EnumValueEntry>) -> Self {
        self.values.insert(name.into(), entry.into());
        self
    }

    /// Sets the member types of a union.
    #[must_use]
    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.member_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the interfaces an object type conforms to.
    #[must_use]
    pub fn implements<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArcStr>,
    {
        self.implements = interfaces.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the parent interfaces an interface extends.
    #[must_use]
    pub fn extends<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ArcStr>,
    {
        self.extends = interfaces.into_iter().map(Into::into).collect();
        self
    }

    /// Enables relay connection synthesis for this type or interface.
    #[must_use]
    pub fn relay_connection(mut self, enabled: bool) -> Self {
        self.relay_connection = enabled.then(RelayConnection::new);
        self
    }

    /// Enables relay connection synthesis with extra edge/connection
    /// fields merged over the defaults.
    #[must_use]
    pub fn relay_connection_fields(mut self, connection: RelayConnection) -> Self {
        self.relay_connection = Some(connection);
        self
    }

    /// Sets the type an operation returns, or the target type of a
    /// fragment.
    #[must_use]
    pub fn returns(mut self, type_expr: impl Into<TypeExpr>) -> Self {
        self.type_expr = Some(type_expr.into());
        self
    }

    /// Sets the target type of a fragment (alias of [`returns`]).
    ///
    /// [`returns`]: Declaration::returns
    #[must_use]
    pub fn on(self, type_name: impl Into<TypeExpr>) -> Self {
        self.returns(type_name)
    }

    /// Adds a selection node to a fragment.
    #[must_use]
    pub fn select(mut self, node: impl Into<SelectionNode>) -> Self {
        self.selection.push(node.into());
        self
    }

    /// Marks an operation deprecated.
    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<ArcStr>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    /// Attaches a resolver to an operation.
    #[must_use]
    pub fn resolve<F>(mut self, resolve: F) -> Self
    where
        F: Fn(ResolveParams<'_>) -> crate::resolve::FieldResult + Send + Sync + 'static,
    {
        self.resolve = Some(Arc::new(resolve));
        self
    }

    /// Attaches a subscription resolver to a subscription operation.
    #[must_use]
    pub fn subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = Some(subscription);
        self
    }

    /// Sets the polymorphic dispatch callback of an interface or union.
    #[must_use]
    pub fn resolve_type<F>(mut self, resolve_type: F) -> Self
    where
        F: Fn(&Value) -> Option<ArcStr> + Send + Sync + 'static,
    {
        self.resolve_type = Some(Arc::new(resolve_type));
        self
    }

    /// Sets the membership test of an object type.
    #[must_use]
    pub fn is_type_of<F>(mut self, is_type_of: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.is_type_of = Some(Arc::new(is_type_of));
        self
    }

    /// Delegates a scalar declaration entirely to an existing scalar.
    #[must_use]
    pub fn resolve_scalar(mut self, scalar: Arc<MetaType>) -> Self {
        self.scalar_delegate = Some(scalar);
        self
    }

    /// Sets the serialization hook of a scalar (defaults to identity).
    #[must_use]
    pub fn serialize<F: Fn(&Value) -> Value + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.serialize = Some(Arc::new(f));
        self
    }

    /// Sets the input coercion hook of a scalar (defaults to identity).
    #[must_use]
    pub fn parse_value<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, crate::resolve::FieldError> + Send + Sync + 'static,
    {
        self.parse_value = Some(Arc::new(f));
        self
    }

    /// Sets the literal coercion hook of a scalar.
    #[must_use]
    pub fn parse_literal<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.parse_literal = Some(Arc::new(f));
        self
    }

    /// Decodes this declaration into its strongly typed form.
    ///
    /// `fallback_name` is the container key when the declaration came out
    /// of a name → declaration map.
    pub(crate) fn classify(self, fallback_name: Option<&str>) -> Result<ClassifiedItem, SchemaError> {
        let name = self.name.clone().or_else(|| fallback_name.map(ArcStr::from));

        let Some(kind) = self.graphql.clone() else {
            return Err(SchemaError::MissingKind {
                name: name.unwrap_or_default(),
            });
        };
        let Some(name) = name else {
            return Err(SchemaError::MissingName);
        };

        Ok(match kind.as_str() {
            "type" => ClassifiedItem::Type(TypeDecl {
                name,
                description: self.description,
                schemas: self.schemas,
                fields: self.fields,
                implements: self.implements,
                relay_connection: self.relay_connection,
                is_type_of: self.is_type_of,
            }),
            "query" => ClassifiedItem::Operation(OperationKind::Query, self.into_operation(name)?),
            "mutation" => {
                ClassifiedItem::Operation(OperationKind::Mutation, self.into_operation(name)?)
            }
            "subscription" => {
                ClassifiedItem::Operation(OperationKind::Subscription, self.into_operation(name)?)
            }
            "input" => ClassifiedItem::Input(InputDecl {
                name,
                description: self.description,
                schemas: self.schemas,
                fields: self.fields,
            }),
            "enum" => ClassifiedItem::Enum(EnumDecl {
                name,
                description: self.description,
                schemas: self.schemas,
                values: self.values,
            }),
            "interface" => ClassifiedItem::Interface(InterfaceDecl {
                name,
                description: self.description,
                schemas: self.schemas,
                fields: self.fields,
                extends: self.extends,
                relay_connection: self.relay_connection,
                resolve_type: self.resolve_type,
            }),
            "scalar" => ClassifiedItem::Scalar(ScalarDecl {
                name,
                description: self.description,
                schemas: self.schemas,
                delegate: self.scalar_delegate,
                serialize: self.serialize,
                parse_value: self.parse_value,
                parse_literal: self.parse_literal,
            }),
            "union" => ClassifiedItem::Union(UnionDecl {
                name,
                description: self.description,
                schemas: self.schemas,
                member_types: self.member_types,
                resolve_type: self.resolve_type,
            }),
            "fragment" => {
                let Some(on) = self.type_expr.as_ref().and_then(TypeExpr::as_raw) else {
                    return Err(SchemaError::MalformedDeclaration {
                        entry: format!("fragment `{name}` missing its target `type`").into(),
                    });
                };
                ClassifiedItem::Fragment(FragmentDecl {
                    name,
                    schemas: self.schemas,
                    on: on.into(),
                    selection: self.selection,
                })
            }
            _ => return Err(SchemaError::UnknownKind { kind }),
        })
    }

    fn into_operation(self, name: ArcStr) -> Result<OperationDecl, SchemaError> {
        let Some(type_expr) = self.type_expr else {
            return Err(SchemaError::MalformedDeclaration {
                entry: format!("operation `{name}` missing its return `type`").into(),
            });
        };

        Ok(OperationDecl {
            name,
            field: FieldDefinition {
                name: None,
                type_expr,
                description: self.description,
                default: None,
                deprecation_reason: self.deprecation_reason,
                resolve: self.resolve,
                subscription: self.subscription,
                args: self.args,
                default_args: self.default_args,
                schemas: self.schemas,
            },
        })
    }
}

/// A declaration decoded into its per-kind shape.
#[derive(Clone, Debug)]
pub(crate) enum ClassifiedItem {
    Type(TypeDecl),
    Input(InputDecl),
    Enum(EnumDecl),
    Interface(InterfaceDecl),
    Scalar(ScalarDecl),
    Union(UnionDecl),
    Fragment(FragmentDecl),
    Operation(OperationKind, OperationDecl),
}

/// Which root type an operation declaration is filed onto.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub(crate) fn root_type_name(self) -> ArcStr {
        match self {
            Self::Query => arcstr::literal!("Query"),
            Self::Mutation => arcstr::literal!("Mutation"),
            Self::Subscription => arcstr::literal!("Subscription"),
        }
    }
}

/// An operation declaration, ready to be filed as a root-type field.
#[derive(Clone, Debug)]
pub(crate) struct OperationDecl {
    pub name: ArcStr,
    pub field: FieldDefinition,
}

/// An object type declaration, classified.
#[derive(Clone, Debug)]
pub(crate) struct TypeDecl {
    pub name: ArcStr,
    pub description: Option<ArcStr>,
    pub schemas: Option<Vec<ArcStr>>,
    pub fields: IndexMap<ArcStr, FieldEntry>,
    pub implements: Vec<ArcStr>,
    pub relay_connection: Option<RelayConnection>,
    #[debug(skip)]
    pub is_type_of: Option<IsTypeOfFn>,
}

/// An input type declaration, classified.
#[derive(Clone, Debug)]
pub(crate) struct InputDecl {
    pub name: ArcStr,
    pub description: Option<ArcStr>,
    pub schemas: Option<Vec<ArcStr>>,
    pub fields: IndexMap<ArcStr, FieldEntry>,
}

/// An enum declaration, classified.
#[derive(Clone, Debug)]
pub(crate) struct EnumDecl {
    pub name: ArcStr,
    pub description: Option<ArcStr>,
    pub schemas: Option<Vec<ArcStr>>,
    pub values: IndexMap<ArcStr, EnumValueEntry>,
}

/// An interface declaration, classified.
#[derive(Clone, Debug)]
pub(crate) struct InterfaceDecl {
    pub name: ArcStr,
    pub description: Option<ArcStr>,
    pub schemas: Option<Vec<ArcStr>>,
    pub fields: IndexMap<ArcStr, FieldEntry>,
    pub extends: Vec<ArcStr>,
    pub relay_connection: Option<RelayConnection>,
    #[debug(skip)]
    pub resolve_type: Option<ResolveTypeFn>,
}

/// A scalar declaration, classified.
#[derive(Clone, Debug)]
pub(crate) struct ScalarDecl {
    pub name: ArcStr,
    pub description: Option<ArcStr>,
    pub schemas: Option<Vec<ArcStr>>,
    #[debug(skip)]
    pub delegate: Option<Arc<MetaType>>,
    #[debug(skip)]
    pub serialize: Option<SerializeFn>,
    #[debug(skip)]
    pub parse_value: Option<ParseValueFn>,
    #[debug(skip)]
    pub parse_literal: Option<ParseLiteralFn>,
}

/// A union declaration, classified.
#[derive(Clone, Debug)]
pub(crate) struct UnionDecl {
    pub name: ArcStr,
    pub description: Option<ArcStr>,
    pub schemas: Option<Vec<ArcStr>>,
    pub member_types: Vec<CompactString>,
    #[debug(skip)]
    pub resolve_type: Option<ResolveTypeFn>,
}

/// A fragment declaration, classified.
#[derive(Clone, Debug)]
pub(crate) struct FragmentDecl {
    pub name: ArcStr,
    pub schemas: Option<Vec<ArcStr>>,
    pub on: ArcStr,
    pub selection: Vec<SelectionNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_discriminator() {
        let decl = Declaration::object("User").field("id", "ID!");
        match decl.classify(None).unwrap() {
            ClassifiedItem::Type(t) => {
                assert_eq!(t.name, "User");
                assert!(t.fields.contains_key("id"));
            }
            other => panic!("expected a type, got {other:?}"),
        }
    }

    #[test]
    fn takes_name_from_container_key() {
        let decl = Declaration::new("enum").value("A", "A");
        match decl.classify(Some("Color")).unwrap() {
            ClassifiedItem::Enum(e) => assert_eq!(e.name, "Color"),
            other => panic!("expected an enum, got {other:?}"),
        }
    }

    #[test]
    fn own_name_wins_over_container_key() {
        let decl = Declaration::input("Address");
        match decl.classify(Some("Location")).unwrap() {
            ClassifiedItem::Input(i) => assert_eq!(i.name, "Address"),
            other => panic!("expected an input, got {other:?}"),
        }
    }

    #[test]
    fn missing_kind_is_rejected() {
        let decl = Declaration::default().name("User");
        assert_eq!(
            decl.classify(None).unwrap_err(),
            SchemaError::MissingKind {
                name: arcstr::literal!("User")
            },
        );
    }

    #[test]
    fn missing_name_is_rejected() {
        let decl = Declaration::new("type");
        assert_eq!(decl.classify(None).unwrap_err(), SchemaError::MissingName);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let decl = Declaration::new("typo").name("User");
        assert_eq!(
            decl.classify(None).unwrap_err(),
            SchemaError::UnknownKind { kind: "typo".into() },
        );
    }

    #[test]
    fn merged_over_prefers_the_specific_side() {
        let base = FieldEntry::Def(
            FieldDefinition::new("String!")
                .description("from the interface")
                .deprecated("old"),
        );
        let specific = FieldEntry::Def(FieldDefinition::new("ID!").description("from the type"));

        match specific.merged_over(base) {
            FieldEntry::Def(def) => {
                assert_eq!(def.type_expr, TypeExpr::Raw("ID!".into()));
                assert_eq!(def.description.as_deref(), Some("from the type"));
                assert_eq!(def.deprecation_reason.as_deref(), Some("old"));
            }
            entry => panic!("expected a definition, got {entry:?}"),
        }
    }

    #[test]
    fn bare_refs_replace_outright() {
        let merged = FieldEntry::from("ID!").merged_over(FieldEntry::from("String"));
        match merged {
            FieldEntry::Ref(s) => assert_eq!(s, "ID!"),
            entry => panic!("expected a bare ref, got {entry:?}"),
        }
    }

    #[test]
    fn required_suffix_toggles() {
        assert!(matches!(
            FieldEntry::from("String!").strip_required(),
            FieldEntry::Ref(s) if s == "String",
        ));
        assert!(matches!(
            FieldEntry::from("String").enforce_required(),
            FieldEntry::Ref(s) if s == "String!",
        ));
        assert!(matches!(
            FieldEntry::from("[Tag]").enforce_required(),
            FieldEntry::Ref(s) if s == "[Tag]!",
        ));
    }
}
