//! Errors raised while assembling a schema.

use arcstr::ArcStr;
use compact_str::CompactString;
use derive_more::with_trait::{Display, Error};

/// Error raised while classifying declarations or assembling the type graph.
///
/// Assembly errors are never recovered from: any of them aborts the whole
/// build, since a partially linked schema would only defer the failure to
/// query time where it is much harder to diagnose.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum SchemaError {
    /// No declarations were supplied to the assembler at all.
    #[display("no schema declarations provided")]
    NoDeclarations,

    /// A schema entry was not shaped the way its kind requires, e.g. not
    /// a keyed record where one was expected.
    #[display("malformed schema entry: {entry}")]
    MalformedDeclaration {
        /// Short description of the offending entry.
        entry: CompactString,
    },

    /// A declaration carries no `graphql` kind discriminator.
    #[display("`graphql` kind not defined for `{name}`")]
    MissingKind {
        /// Name of the declaration, if one could be resolved.
        name: ArcStr,
    },

    /// A declaration has no name of its own and none could be inferred
    /// from its container key.
    #[display("declaration name not given")]
    MissingName,

    /// The `graphql` discriminator is none of the recognized kinds.
    #[display("unknown graphql kind `{kind}`")]
    UnknownKind {
        /// The unrecognized discriminator value.
        kind: CompactString,
    },

    /// A type reference names an identifier that is absent from the
    /// built-in registry and from every bucket of the current variant.
    #[display("unknown type `{name}`")]
    UnknownType {
        /// The unresolved type name.
        name: ArcStr,
    },

    /// A type-reference string does not match the `[[Name!]]!` grammar.
    #[display("invalid type `{reference}`")]
    InvalidTypeSyntax {
        /// The raw reference string.
        reference: CompactString,
    },

    /// An interface reaches itself through its `extends` chain.
    #[display("cyclic dependency in interfaces: `{name}`")]
    CyclicInterfaceExtension {
        /// The interface closing the cycle.
        name: ArcStr,
    },

    /// An interface is referenced but never declared.
    #[display("undefined interface `{name}`")]
    UndefinedInterface {
        /// The missing interface name.
        name: ArcStr,
    },

    /// A fragment targets a type that is absent from the variant it is
    /// being built into.
    #[display("fragment `{fragment}` targets unknown type `{on}`")]
    FragmentTargetMissing {
        /// The fragment name.
        fragment: ArcStr,
        /// The missing target type name.
        on: ArcStr,
    },

    /// Resolver validation found a field without a resolver.
    #[display("resolver missing for `{type_name}.{field}`")]
    MissingResolver {
        /// The owning type.
        type_name: ArcStr,
        /// The unresolved field.
        field: ArcStr,
    },
}
