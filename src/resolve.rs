//! Resolver callbacks and the per-type resolver registry.
//!
//! The assembler stores resolvers on the fields it materializes; running
//! them against a query document is the execution engine's job. A resolver
//! for a field is taken, in priority order, from the [`Resolvers`] registry
//! (`resolvers[TypeName][fieldName]`), then from the field declaration's
//! own `resolve`.

use std::{fmt, sync::Arc};

use arcstr::ArcStr;
use derive_more::with_trait::Display;
use fnv::FnvHashMap;
use futures::{StreamExt as _, future, stream::BoxStream};
use indexmap::IndexMap;

use crate::value::Value;

/// Coerced argument values a field is being resolved with.
pub type Arguments = IndexMap<ArcStr, Value>;

/// Everything a resolver gets to look at.
#[derive(Clone, Copy, Debug)]
pub struct ResolveParams<'a> {
    /// The value the enclosing type resolved to.
    pub source: &'a Value,
    /// Argument values for this field.
    pub args: &'a Arguments,
}

/// Error produced by a field resolver.
#[derive(Clone, Debug, Display, PartialEq)]
#[display("{message}")]
pub struct FieldError {
    message: String,
    extensions: Value,
}

impl FieldError {
    /// Creates a new error with additional data made available to the
    /// error formatter.
    pub fn new(message: impl Into<String>, extensions: Value) -> Self {
        Self {
            message: message.into(),
            extensions,
        }
    }

    /// The human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Additional structured error data.
    pub fn extensions(&self) -> &Value {
        &self.extensions
    }
}

impl std::error::Error for FieldError {}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        Self::new(message, Value::Null)
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self::new(message, Value::Null)
    }
}

/// Outcome of a field resolver.
///
/// `Ok(None)` means the resolver produced no value at all; unless
/// `allow_undefined_in_resolve` is set, the assembler turns that into a
/// [`FieldError`] naming the field.
pub type FieldResult = Result<Option<Value>, FieldError>;

/// A field resolver callback.
pub type ResolveFn = Arc<dyn Fn(ResolveParams<'_>) -> FieldResult + Send + Sync>;

/// A subscription callback producing a stream of events.
pub type SubscribeFn = Arc<dyn Fn(ResolveParams<'_>) -> BoxStream<'static, Value> + Send + Sync>;

/// A predicate deciding whether a subscription event is delivered.
pub type FilterFn = Arc<dyn Fn(&Value, &Arguments) -> bool + Send + Sync>;

/// Polymorphic dispatch: names the concrete type a value belongs to.
pub type ResolveTypeFn = Arc<dyn Fn(&Value) -> Option<ArcStr> + Send + Sync>;

/// Polymorphic dispatch: whether a value belongs to the carrying type.
pub type IsTypeOfFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Serialization hook of a scalar (defaults to identity).
pub type SerializeFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Input coercion hook of a scalar (defaults to identity).
pub type ParseValueFn = Arc<dyn Fn(&Value) -> Result<Value, FieldError> + Send + Sync>;

/// Literal coercion hook of a scalar; `None` rejects the literal.
pub type ParseLiteralFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// A subscription resolver: an event stream plus an optional delivery
/// predicate.
#[derive(Clone)]
pub struct Subscription {
    pub(crate) subscribe: SubscribeFn,
    pub(crate) filter: Option<FilterFn>,
}

impl Subscription {
    /// Creates a subscription resolver from a `subscribe` callback.
    pub fn new<F>(subscribe: F) -> Self
    where
        F: Fn(ResolveParams<'_>) -> BoxStream<'static, Value> + Send + Sync + 'static,
    {
        Self {
            subscribe: Arc::new(subscribe),
            filter: None,
        }
    }

    /// Sets the delivery predicate; events it rejects are dropped before
    /// they reach the client.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Value, &Arguments) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Folds the filter into the subscribe callback.
    ///
    /// The filter never reaches the engine schema; what is stored on the
    /// field is a single subscribe callback whose stream already skips
    /// rejected events.
    pub(crate) fn into_subscribe(self) -> SubscribeFn {
        let Self { subscribe, filter } = self;
        let Some(filter) = filter else {
            return subscribe;
        };

        Arc::new(move |params: ResolveParams<'_>| {
            let args = params.args.clone();
            let filter = filter.clone();
            subscribe(params)
                .filter(move |event| future::ready(filter(event, &args)))
                .boxed()
        })
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

/// A resolver attached to a materialized field.
#[derive(Clone)]
pub enum FieldResolver {
    /// An ordinary field resolver.
    Resolve(ResolveFn),
    /// A subscription stream (filter already folded in).
    Subscribe(SubscribeFn),
}

impl FieldResolver {
    /// The plain resolver callback, if this is not a subscription.
    pub fn as_resolve(&self) -> Option<&ResolveFn> {
        match self {
            Self::Resolve(f) => Some(f),
            Self::Subscribe(_) => None,
        }
    }

    /// The subscribe callback, if this is a subscription field.
    pub fn as_subscribe(&self) -> Option<&SubscribeFn> {
        match self {
            Self::Subscribe(f) => Some(f),
            Self::Resolve(_) => None,
        }
    }
}

impl fmt::Debug for FieldResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(_) => f.write_str("FieldResolver::Resolve"),
            Self::Subscribe(_) => f.write_str("FieldResolver::Subscribe"),
        }
    }
}

#[derive(Clone, Default)]
struct TypeResolvers {
    fields: FnvHashMap<ArcStr, FieldResolver>,
    resolve_type: Option<ResolveTypeFn>,
    is_type_of: Option<IsTypeOfFn>,
}

impl fmt::Debug for TypeResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeResolvers")
            .field("fields", &self.fields)
            .field("resolve_type", &self.resolve_type.is_some())
            .field("is_type_of", &self.is_type_of.is_some())
            .finish()
    }
}

/// Resolver callbacks grouped by type name.
///
/// Mirrors the `{ TypeName: { fieldName: fn } }` shape, with the reserved
/// `__resolveType`/`__isTypeOf` entries exposed as dedicated setters.
#[derive(Clone, Debug, Default)]
pub struct Resolvers {
    types: FnvHashMap<ArcStr, TypeResolvers>,
}

impl Resolvers {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a field resolver on `type_name.field`.
    #[must_use]
    pub fn field<F>(mut self, type_name: impl Into<ArcStr>, field: impl Into<ArcStr>, resolve: F) -> Self
    where
        F: Fn(ResolveParams<'_>) -> FieldResult + Send + Sync + 'static,
    {
        self.types
            .entry(type_name.into())
            .or_default()
            .fields
            .insert(field.into(), FieldResolver::Resolve(Arc::new(resolve)));
        self
    }

    /// Registers a subscription resolver on `type_name.field`.
    #[must_use]
    pub fn subscription(
        mut self,
        type_name: impl Into<ArcStr>,
        field: impl Into<ArcStr>,
        subscription: Subscription,
    ) -> Self {
        self.types
            .entry(type_name.into())
            .or_default()
            .fields
            .insert(field.into(), FieldResolver::Subscribe(subscription.into_subscribe()));
        self
    }

    /// Registers the `__resolveType` callback for an interface or union.
    #[must_use]
    pub fn resolve_type<F>(mut self, type_name: impl Into<ArcStr>, resolve_type: F) -> Self
    where
        F: Fn(&Value) -> Option<ArcStr> + Send + Sync + 'static,
    {
        self.types.entry(type_name.into()).or_default().resolve_type = Some(Arc::new(resolve_type));
        self
    }

    /// Registers the `__isTypeOf` callback for an object type.
    #[must_use]
    pub fn is_type_of<F>(mut self, type_name: impl Into<ArcStr>, is_type_of: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.types.entry(type_name.into()).or_default().is_type_of = Some(Arc::new(is_type_of));
        self
    }

    pub(crate) fn field_resolver(&self, type_name: &str, field: &str) -> Option<&FieldResolver> {
        self.types.get(type_name)?.fields.get(field)
    }

    pub(crate) fn resolve_type_fn(&self, type_name: &str) -> Option<&ResolveTypeFn> {
        self.types.get(type_name)?.resolve_type.as_ref()
    }

    pub(crate) fn is_type_of_fn(&self, type_name: &str) -> Option<&IsTypeOfFn> {
        self.types.get(type_name)?.is_type_of.as_ref()
    }
}

/// Wraps a resolver so failures are reported through `tracing` before
/// propagating.
pub(crate) fn with_error_logging(resolve: ResolveFn, type_name: ArcStr, field: ArcStr) -> ResolveFn {
    Arc::new(move |params| {
        let result = resolve(params);
        if let Err(e) = &result {
            tracing::error!(%type_name, %field, error = %e, "field resolver failed");
        }
        result
    })
}

/// Wraps a resolver so producing no value at all is a defined error
/// rather than something that silently becomes `null` downstream.
pub(crate) fn with_catch_undefined(resolve: ResolveFn, type_name: ArcStr, field: ArcStr) -> ResolveFn {
    Arc::new(move |params| match resolve(params)? {
        Some(value) => Ok(Some(value)),
        None => Err(FieldError::from(format!(
            "resolver for `{type_name}.{field}` returned undefined",
        ))),
    })
}
