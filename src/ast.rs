//! Type references and the compact type-reference string grammar.
//!
//! Declarations refer to types with strings such as `"User"`, `"[User!]"`
//! or `"[[Int!]]!"`. [`TypeModifiers`] is the parsed form of such a string;
//! [`TypeRef`] is the resolved wrapping structure the executable schema
//! works with.

use arcstr::ArcStr;
use compact_str::CompactString;
use derive_more::with_trait::Display;

use crate::error::SchemaError;

/// A reference to a named type, with list and non-null wrapping.
///
/// This carries no guarantee that the named type exists; references are
/// checked against the variant registry when a declaration is materialized.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub enum TypeRef {
    /// A nullable named type, e.g. `String`.
    #[display("{_0}")]
    Named(ArcStr),

    /// A non-null named type, e.g. `String!`.
    #[display("{_0}!")]
    NonNullNamed(ArcStr),

    /// A nullable list type, e.g. `[String]`.
    ///
    /// The list itself is what's nullable, the contained type might be
    /// non-null.
    #[display("[{_0}]")]
    List(Box<TypeRef>),

    /// A non-null list type, e.g. `[String]!`.
    #[display("[{_0}]!")]
    NonNullList(Box<TypeRef>),
}

impl TypeRef {
    /// Returns the name of the innermost named type.
    pub fn innermost_name(&self) -> &str {
        match self {
            Self::Named(n) | Self::NonNullNamed(n) => n,
            Self::List(l) | Self::NonNullList(l) => l.innermost_name(),
        }
    }

    /// Whether the outermost wrapper is non-null.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNullNamed(_) | Self::NonNullList(_))
    }

    /// Enforces non-null on the outermost wrapper.
    #[must_use]
    pub fn non_null(self) -> Self {
        match self {
            Self::Named(n) => Self::NonNullNamed(n),
            Self::List(l) => Self::NonNullList(l),
            other => other,
        }
    }

    /// Strips non-null from the outermost wrapper.
    #[must_use]
    pub fn nullable(self) -> Self {
        match self {
            Self::NonNullNamed(n) => Self::Named(n),
            Self::NonNullList(l) => Self::List(l),
            other => other,
        }
    }
}

/// The parsed decorations of a type-reference string.
///
/// Produced by [`parse_type_reference`]; [`apply`](TypeModifiers::apply)
/// rebuilds the concrete [`TypeRef`] around a (possibly canonicalized)
/// type name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeModifiers {
    /// The bare type name between the decorations.
    pub type_name: CompactString,
    /// One or two list wrappers are present.
    pub is_list: bool,
    /// Two list wrappers are present.
    pub is_double_list: bool,
    /// The named type itself is non-null (`Name!`).
    pub is_type_non_null: bool,
    /// The outermost list wrapper is non-null (trailing `!`).
    pub is_list_non_null: bool,
}

impl TypeModifiers {
    /// Wraps `name` according to these modifiers.
    ///
    /// Wrapping order: innermost non-null, then list (twice for a double
    /// list), then the outer non-null.
    pub fn apply(&self, name: ArcStr) -> TypeRef {
        let mut ty = if self.is_type_non_null {
            TypeRef::NonNullNamed(name)
        } else {
            TypeRef::Named(name)
        };

        if self.is_double_list {
            ty = TypeRef::List(Box::new(TypeRef::List(Box::new(ty))));
        } else if self.is_list {
            ty = TypeRef::List(Box::new(ty));
        }

        if self.is_list_non_null {
            ty = ty.non_null();
        }

        ty
    }
}

/// Parses a type-reference string.
///
/// The accepted grammar is, slot for slot,
/// `^(\[?)(\[?)([A-Za-z0-9_]+)(!?)(\]?)(\]?)(!?)$`: up to two leading list
/// brackets, a bare identifier, an optional non-null marker on the name,
/// up to two closing brackets and an optional trailing non-null marker.
pub fn parse_type_reference(raw: &str) -> Result<TypeModifiers, SchemaError> {
    scan(raw).ok_or_else(|| SchemaError::InvalidTypeSyntax {
        reference: raw.into(),
    })
}

/// Extracts the bare identifier from a type-reference string, ignoring
/// list and non-null decorations.
///
/// Used for best-effort dependency lookups, so unparsable input yields
/// `None` rather than an error.
pub fn type_name(raw: &str) -> Option<CompactString> {
    scan(raw).map(|m| m.type_name)
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn scan(raw: &str) -> Option<TypeModifiers> {
    let bytes = raw.as_bytes();
    let mut pos = 0;

    let mut opens = 0;
    while opens < 2 && bytes.get(pos) == Some(&b'[') {
        opens += 1;
        pos += 1;
    }

    let name_start = pos;
    while bytes.get(pos).copied().is_some_and(is_name_char) {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }
    let type_name = CompactString::from(&raw[name_start..pos]);

    let is_type_non_null = bytes.get(pos) == Some(&b'!');
    if is_type_non_null {
        pos += 1;
    }

    let mut closes = 0;
    while closes < 2 && bytes.get(pos) == Some(&b']') {
        closes += 1;
        pos += 1;
    }

    let is_list_non_null = bytes.get(pos) == Some(&b'!');
    if is_list_non_null {
        pos += 1;
    }

    if pos != bytes.len() {
        return None;
    }

    Some(TypeModifiers {
        type_name,
        is_list: opens > 0,
        is_double_list: opens == 2,
        is_type_non_null,
        is_list_non_null,
    })
}
