//! Types used to describe an assembled GraphQL schema.
//!
//! This is the engine-native representation the assembler produces:
//! a fully cross-referenced graph of [`MetaType`]s in which every type
//! reference is by name. The query-execution engine consumes these
//! through [`ExecutableSchema`](crate::schema::model::ExecutableSchema).

use arcstr::ArcStr;
use derive_more::with_trait::Debug;
use indexmap::IndexMap;

use crate::{
    ast::TypeRef,
    resolve::{
        FieldError, FieldResolver, IsTypeOfFn, ParseLiteralFn, ParseValueFn, ResolveTypeFn,
        SerializeFn,
    },
    value::Value,
};

/// Whether an item is deprecated, with context.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DeprecationStatus {
    /// The field/value is not deprecated.
    Current,
    /// The field/value is deprecated, with an optional reason.
    Deprecated(Option<ArcStr>),
}

impl DeprecationStatus {
    /// If this deprecation status indicates the item is deprecated.
    pub fn is_deprecated(&self) -> bool {
        match self {
            Self::Current => false,
            Self::Deprecated(_) => true,
        }
    }

    /// An optional reason for the deprecation, or none if `Current`.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Deprecated(rsn) => rsn.as_deref(),
        }
    }
}

/// Kind of a materialized type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeKind {
    /// Scalar.
    Scalar,
    /// Object.
    Object,
    /// Interface.
    Interface,
    /// Union.
    Union,
    /// Enum.
    Enum,
    /// Input object.
    InputObject,
}

/// Scalar type metadata.
#[derive(Clone, Debug)]
pub struct ScalarMeta {
    /// The name of the scalar.
    pub name: ArcStr,
    /// The description of the scalar.
    pub description: Option<ArcStr>,
    #[debug(skip)]
    pub(crate) serialize_fn: Option<SerializeFn>,
    #[debug(skip)]
    pub(crate) parse_value_fn: Option<ParseValueFn>,
    #[debug(skip)]
    pub(crate) parse_literal_fn: Option<ParseLiteralFn>,
}

impl ScalarMeta {
    /// Builds a new [`ScalarMeta`] with the specified `name` and identity
    /// serialization/coercion hooks.
    pub fn new(name: ArcStr) -> Self {
        Self {
            name,
            description: None,
            serialize_fn: None,
            parse_value_fn: None,
            parse_literal_fn: None,
        }
    }

    /// Sets the `description` of this [`ScalarMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the serialization hook.
    #[must_use]
    pub fn serialize(mut self, f: SerializeFn) -> Self {
        self.serialize_fn = Some(f);
        self
    }

    /// Sets the input coercion hook.
    #[must_use]
    pub fn parse_value(mut self, f: ParseValueFn) -> Self {
        self.parse_value_fn = Some(f);
        self
    }

    /// Sets the literal coercion hook.
    #[must_use]
    pub fn parse_literal(mut self, f: ParseLiteralFn) -> Self {
        self.parse_literal_fn = Some(f);
        self
    }

    /// Serializes `value` for a response (identity by default).
    pub fn serialize_value(&self, value: &Value) -> Value {
        match &self.serialize_fn {
            Some(f) => f(value),
            None => value.clone(),
        }
    }

    /// Coerces an input `value` (identity by default).
    pub fn parse_input(&self, value: &Value) -> Result<Value, FieldError> {
        match &self.parse_value_fn {
            Some(f) => f(value),
            None => Ok(value.clone()),
        }
    }

    /// Coerces a literal `value`; `None` rejects it.
    pub fn parse_literal_value(&self, value: &Value) -> Option<Value> {
        match &self.parse_literal_fn {
            Some(f) => f(value),
            None => Some(value.clone()),
        }
    }

    /// Wraps this [`ScalarMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Scalar(self)
    }
}

/// Object type metadata.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// The name of the object.
    pub name: ArcStr,
    /// The description of the object.
    pub description: Option<ArcStr>,
    /// The fields of the object.
    pub fields: Vec<Field>,
    /// Names of the interfaces the object conforms to.
    pub interface_names: Vec<ArcStr>,
    #[debug(skip)]
    pub(crate) is_type_of: Option<IsTypeOfFn>,
}

impl ObjectMeta {
    /// Builds a new [`ObjectMeta`] with the specified `name` and `fields`.
    pub fn new(name: ArcStr, fields: Vec<Field>) -> Self {
        Self {
            name,
            description: None,
            fields,
            interface_names: Vec::new(),
            is_type_of: None,
        }
    }

    /// Sets the `description` of this [`ObjectMeta`] type.
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the `interfaces` this [`ObjectMeta`] type conforms to.
    #[must_use]
    pub fn interfaces(mut self, interfaces: Vec<ArcStr>) -> Self {
        self.interface_names = interfaces;
        self
    }

    /// Runs the membership test against `value`, if one is attached.
    pub fn check_is_type_of(&self, value: &Value) -> Option<bool> {
        self.is_type_of.as_ref().map(|f| f(value))
    }

    /// Wraps this [`ObjectMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Object(self)
    }
}

/// Interface type metadata.
#[derive(Clone, Debug)]
pub struct InterfaceMeta {
    /// The name of the interface.
    pub name: ArcStr,
    /// The description of the interface.
    pub description: Option<ArcStr>,
    /// The fields of the interface, extension chain merged in.
    pub fields: Vec<Field>,
    /// Names of the parent interfaces along the extension chain.
    pub interface_names: Vec<ArcStr>,
    #[debug(skip)]
    pub(crate) resolve_type: Option<ResolveTypeFn>,
}

impl InterfaceMeta {
    /// Builds a new [`InterfaceMeta`] with the specified `name` and
    /// `fields`.
    pub fn new(name: ArcStr, fields: Vec<Field>) -> Self {
        Self {
            name,
            description: None,
            fields,
            interface_names: Vec::new(),
            resolve_type: None,
        }
    }

    /// Sets the `description` of this [`InterfaceMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the parent interfaces of this [`InterfaceMeta`] interface.
    #[must_use]
    pub fn interfaces(mut self, interfaces: Vec<ArcStr>) -> Self {
        self.interface_names = interfaces;
        self
    }

    /// Dispatches `value` to a concrete type name, if a callback is
    /// attached.
    pub fn dispatch(&self, value: &Value) -> Option<ArcStr> {
        self.resolve_type.as_ref().and_then(|f| f(value))
    }

    /// Wraps this [`InterfaceMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Interface(self)
    }
}

/// Union type metadata.
#[derive(Clone, Debug)]
pub struct UnionMeta {
    /// The name of the union.
    pub name: ArcStr,
    /// The description of the union.
    pub description: Option<ArcStr>,
    /// Names of the union's member types.
    pub of_type_names: Vec<ArcStr>,
    #[debug(skip)]
    pub(crate) resolve_type: Option<ResolveTypeFn>,
}

impl UnionMeta {
    /// Builds a new [`UnionMeta`] with the specified `name` and member
    /// type names.
    pub fn new(name: ArcStr, of_type_names: Vec<ArcStr>) -> Self {
        Self {
            name,
            description: None,
            of_type_names,
            resolve_type: None,
        }
    }

    /// Sets the `description` of this [`UnionMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Dispatches `value` to a concrete type name, if a callback is
    /// attached.
    pub fn dispatch(&self, value: &Value) -> Option<ArcStr> {
        self.resolve_type.as_ref().and_then(|f| f(value))
    }

    /// Wraps this [`UnionMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Union(self)
    }
}

/// Enum type metadata.
#[derive(Clone, Debug)]
pub struct EnumMeta {
    /// The name of the enum.
    pub name: ArcStr,
    /// The description of the enum.
    pub description: Option<ArcStr>,
    /// The declared values.
    pub values: Vec<EnumValue>,
    /// Name → underlying value, for caller convenience.
    pub value_lookup: IndexMap<ArcStr, Value>,
}

impl EnumMeta {
    /// Builds a new [`EnumMeta`] with the specified `name` and `values`.
    pub fn new(name: ArcStr, values: Vec<EnumValue>, value_lookup: IndexMap<ArcStr, Value>) -> Self {
        Self {
            name,
            description: None,
            values,
            value_lookup,
        }
    }

    /// Sets the `description` of this [`EnumMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`EnumMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::Enum(self)
    }
}

/// Input object metadata.
#[derive(Clone, Debug)]
pub struct InputObjectMeta {
    /// The name of the input object.
    pub name: ArcStr,
    /// The description of the input object.
    pub description: Option<ArcStr>,
    /// The input fields.
    pub input_fields: Vec<Argument>,
}

impl InputObjectMeta {
    /// Builds a new [`InputObjectMeta`] with the specified `name` and
    /// `input_fields`.
    pub fn new(name: ArcStr, input_fields: Vec<Argument>) -> Self {
        Self {
            name,
            description: None,
            input_fields,
        }
    }

    /// Sets the `description` of this [`InputObjectMeta`] type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`InputObjectMeta`] type into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType {
        MetaType::InputObject(self)
    }
}

/// Generic type metadata.
#[derive(Clone, Debug)]
pub enum MetaType {
    /// Scalar.
    Scalar(ScalarMeta),
    /// Object.
    Object(ObjectMeta),
    /// Enum.
    Enum(EnumMeta),
    /// Interface.
    Interface(InterfaceMeta),
    /// Union.
    Union(UnionMeta),
    /// Input object.
    InputObject(InputObjectMeta),
}

/// Metadata for a field.
#[derive(Clone, Debug)]
pub struct Field {
    /// The name of the field.
    pub name: ArcStr,
    /// The description of the field.
    pub description: Option<ArcStr>,
    /// The field's arguments, if it accepts any.
    pub arguments: Option<Vec<Argument>>,
    /// The field's type.
    pub field_type: TypeRef,
    /// Whether the field is deprecated, with an optional reason.
    pub deprecation_status: DeprecationStatus,
    #[debug(skip)]
    pub(crate) resolver: Option<FieldResolver>,
}

impl Field {
    /// Builds a new [`Field`] of the given [`TypeRef`] with the given
    /// `name`.
    pub fn new(name: ArcStr, field_type: TypeRef) -> Self {
        Self {
            name,
            description: None,
            arguments: None,
            field_type,
            deprecation_status: DeprecationStatus::Current,
            resolver: None,
        }
    }

    /// Sets the `description` of this [`Field`].
    ///
    /// Overwrites any previously set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an `argument` to this [`Field`].
    ///
    /// Arguments are unordered and can't contain duplicates by name.
    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.get_or_insert_default().push(argument);
        self
    }

    /// Sets this [`Field`] as deprecated with an optional `reason`.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<ArcStr>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason);
        self
    }

    /// Sets the resolver attached to this [`Field`].
    #[must_use]
    pub fn resolver(mut self, resolver: FieldResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The resolver attached to this [`Field`], if any.
    pub fn field_resolver(&self) -> Option<&FieldResolver> {
        self.resolver.as_ref()
    }

    /// Looks up an argument by name.
    pub fn argument_by_name(&self, name: &str) -> Option<&Argument> {
        self.arguments
            .as_ref()?
            .iter()
            .find(|a| a.name == *name)
    }
}

/// Metadata for an argument to a field.
#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    /// The name of the argument.
    pub name: ArcStr,
    /// The description of the argument.
    pub description: Option<ArcStr>,
    /// The argument's type.
    pub arg_type: TypeRef,
    /// The argument's default value, if declared.
    pub default_value: Option<Value>,
}

impl Argument {
    /// Builds a new [`Argument`] of the given [`TypeRef`] with the given
    /// `name`.
    pub fn new(name: ArcStr, arg_type: TypeRef) -> Self {
        Self {
            name,
            description: None,
            arg_type,
            default_value: None,
        }
    }

    /// Sets the `description` of this [`Argument`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value of this [`Argument`].
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Metadata for a single value in an enum.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumValue {
    /// The name of the enum value.
    ///
    /// This is the string literal representation of the value in
    /// responses.
    pub name: ArcStr,
    /// The optional description of the value.
    pub description: Option<ArcStr>,
    /// Whether the value is deprecated, with an optional reason.
    pub deprecation_status: DeprecationStatus,
}

impl EnumValue {
    /// Constructs a new [`EnumValue`] with the provided `name`.
    pub fn new(name: ArcStr) -> Self {
        Self {
            name,
            description: None,
            deprecation_status: DeprecationStatus::Current,
        }
    }

    /// Sets the `description` of this [`EnumValue`].
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets this [`EnumValue`] as deprecated with an optional `reason`.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<ArcStr>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason);
        self
    }
}

impl MetaType {
    /// Access the name of the type.
    pub fn name(&self) -> &ArcStr {
        match self {
            Self::Scalar(ScalarMeta { name, .. })
            | Self::Object(ObjectMeta { name, .. })
            | Self::Enum(EnumMeta { name, .. })
            | Self::Interface(InterfaceMeta { name, .. })
            | Self::Union(UnionMeta { name, .. })
            | Self::InputObject(InputObjectMeta { name, .. }) => name,
        }
    }

    /// Access the description of the type, if any.
    pub fn description(&self) -> Option<&ArcStr> {
        match self {
            Self::Scalar(ScalarMeta { description, .. })
            | Self::Object(ObjectMeta { description, .. })
            | Self::Enum(EnumMeta { description, .. })
            | Self::Interface(InterfaceMeta { description, .. })
            | Self::Union(UnionMeta { description, .. })
            | Self::InputObject(InputObjectMeta { description, .. }) => description.as_ref(),
        }
    }

    /// Construct a [`TypeKind`] for this type.
    pub fn type_kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Object(_) => TypeKind::Object,
            Self::Enum(_) => TypeKind::Enum,
            Self::Interface(_) => TypeKind::Interface,
            Self::Union(_) => TypeKind::Union,
            Self::InputObject(_) => TypeKind::InputObject,
        }
    }

    /// Access a field's metadata given its name.
    ///
    /// Only objects and interfaces have fields. This method always
    /// returns `None` for other types.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        match self {
            Self::Object(ObjectMeta { fields, .. })
            | Self::Interface(InterfaceMeta { fields, .. }) => {
                fields.iter().find(|f| f.name == *name)
            }
            _ => None,
        }
    }

    /// Access an input field's metadata given its name.
    ///
    /// Only input objects have input fields. This method always returns
    /// `None` for other types.
    pub fn input_field_by_name(&self, name: &str) -> Option<&Argument> {
        match self {
            Self::InputObject(InputObjectMeta { input_fields, .. }) => {
                input_fields.iter().find(|f| f.name == *name)
            }
            _ => None,
        }
    }

    /// Construct a [`TypeRef`] literal naming this type.
    pub fn as_type(&self) -> TypeRef {
        TypeRef::NonNullNamed(self.name().clone())
    }

    /// Returns true if the type is a composite type.
    ///
    /// Objects, interfaces, and unions are composite.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Interface(_) | Self::Union(_))
    }

    /// Returns true if the type can occur in leaf positions in queries.
    ///
    /// Only enums and scalars are leaf types.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Enum(_) | Self::Scalar(_))
    }

    /// Returns true if the type is abstract.
    ///
    /// Only interfaces and unions are abstract types.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    /// Returns true if the type can be used in input positions, e.g.
    /// arguments or variables.
    ///
    /// Only scalars, enums, and input objects are input types.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    /// Returns true if the type belongs to the built-in registry.
    pub fn is_builtin(&self) -> bool {
        let name = self.name();
        name.starts_with("__") || crate::defaults::is_builtin_name(name)
    }
}
