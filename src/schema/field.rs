use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::errors::{StratabaseError, StratabaseResult};
use crate::value::{Value, ValueKind};

use super::Schema;

/// The declared shape of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "details")]
pub enum FieldKind {
    /// A scalar: string, number, boolean or date.
    Primitive(ValueKind),
    /// A nested object described by its own schema; resolution recurses
    /// structurally with the parent's stratum precedence.
    Object(Schema),
    /// An ordered sequence of nested objects, merged across strata by the
    /// descriptor's identity field.
    ObjectArray(Schema),
    /// Arbitrary JSON passthrough; the top-precedence stratum wins verbatim.
    Opaque,
}

impl FieldKind {
    /// The value kind a stratum is expected to store for this field.
    pub fn stored_kind(&self) -> ValueKind {
        match self {
            FieldKind::Primitive(kind) => *kind,
            FieldKind::Object(_) => ValueKind::Object,
            FieldKind::ObjectArray(_) => ValueKind::Array,
            FieldKind::Opaque => ValueKind::Opaque,
        }
    }

    /// The nested schema, for object and object-array kinds.
    pub fn nested_schema(&self) -> Option<&Schema> {
        match self {
            FieldKind::Object(schema) | FieldKind::ObjectArray(schema) => Some(schema),
            FieldKind::Primitive(_) | FieldKind::Opaque => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Primitive(kind) => write!(f, "{kind}"),
            FieldKind::Object(_) => write!(f, "Object"),
            FieldKind::ObjectArray(_) => write!(f, "ObjectArray"),
            FieldKind::Opaque => write!(f, "Opaque"),
        }
    }
}

/// Metadata for one declared field. Immutable once registered into a
/// fragment; composition produces new descriptors rather than mutating
/// registered ones.
///
/// Built via the typed builder:
///
/// ```
/// use stratabase::schema::{FieldDescriptor, FieldKind};
/// use stratabase::value::ValueKind;
///
/// let opacity = FieldDescriptor::builder()
///     .name("opacity")
///     .kind(FieldKind::Primitive(ValueKind::Number))
///     .description("Layer opacity between 0 and 1")
///     .default_value(Some(1.0.into()))
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct FieldDescriptor {
    #[builder(setter(into))]
    pub name: String,

    pub kind: FieldKind,

    #[builder(default, setter(into))]
    pub description: String,

    #[builder(default)]
    pub default_value: Option<Value>,

    /// For object-array fields only: the sub-field used to match elements
    /// across strata during merge.
    #[builder(default, setter(strip_option, into))]
    pub identity_field: Option<String>,

    #[builder(default)]
    pub required: bool,

    /// When set, this declaration's description/default/required win over an
    /// earlier compatible declaration during composition. Without it the
    /// earliest registration keeps its metadata.
    #[builder(default)]
    pub overrides_metadata: bool,
}

impl FieldDescriptor {
    /// Shorthand for a primitive descriptor. Fails if `kind` is not one of
    /// the four primitive kinds.
    pub fn primitive(name: &str, kind: ValueKind) -> StratabaseResult<Self> {
        if !kind.is_primitive() {
            return Err(StratabaseError::NonPrimitiveKind(kind.to_string()));
        }
        Ok(Self::builder()
            .name(name)
            .kind(FieldKind::Primitive(kind))
            .build())
    }

    pub fn string(name: &str) -> Self {
        Self::builder()
            .name(name)
            .kind(FieldKind::Primitive(ValueKind::String))
            .build()
    }

    pub fn number(name: &str) -> Self {
        Self::builder()
            .name(name)
            .kind(FieldKind::Primitive(ValueKind::Number))
            .build()
    }

    pub fn boolean(name: &str) -> Self {
        Self::builder()
            .name(name)
            .kind(FieldKind::Primitive(ValueKind::Boolean))
            .build()
    }

    pub fn date(name: &str) -> Self {
        Self::builder()
            .name(name)
            .kind(FieldKind::Primitive(ValueKind::Date))
            .build()
    }

    pub fn object(name: &str, schema: Schema) -> Self {
        Self::builder()
            .name(name)
            .kind(FieldKind::Object(schema))
            .build()
    }

    pub fn object_array(name: &str, schema: Schema, identity_field: &str) -> Self {
        Self::builder()
            .name(name)
            .kind(FieldKind::ObjectArray(schema))
            .identity_field(identity_field)
            .build()
    }

    pub fn opaque(name: &str) -> Self {
        Self::builder().name(name).kind(FieldKind::Opaque).build()
    }

    /// Returns a copy with the given description. Convenience on top of the
    /// shorthand constructors.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default_value = Some(default.into());
        self
    }

    pub fn with_required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_metadata_override(mut self) -> Self {
        self.overrides_metadata = true;
        self
    }
}
