use serde::{Deserialize, Serialize};

use crate::errors::{StratabaseError, StratabaseResult};

use super::{FieldDescriptor, FieldKind, Schema};

/// A named, reusable bundle of field declarations — the unit of schema
/// composition. An entity kind's effective schema is produced by
/// [`compose`](super::compose)-ing several fragments (styling, attribution,
/// time-varying, ...), never by inheritance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitFragment {
    name: String,
    schema: Schema,
}

impl TraitFragment {
    /// Start declaring a fragment's fields.
    pub fn builder(name: impl Into<String>) -> TraitFragmentBuilder {
        TraitFragmentBuilder {
            name: name.into(),
            schema: Schema::default(),
        }
    }

    /// Wrap an already-composed schema so it can take part in further
    /// composition.
    pub fn from_schema(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// The field registry surface: declarations call [`register`] to append
/// their descriptor, keeping all bookkeeping inside the builder instance.
///
/// [`register`]: TraitFragmentBuilder::register
#[derive(Debug, Clone)]
pub struct TraitFragmentBuilder {
    name: String,
    schema: Schema,
}

impl TraitFragmentBuilder {
    /// Append a field declaration. Registering the same field name twice
    /// within one fragment is a schema-authoring bug and fails immediately.
    pub fn register(mut self, descriptor: FieldDescriptor) -> StratabaseResult<Self> {
        if let FieldKind::Primitive(kind) = descriptor.kind {
            if !kind.is_primitive() {
                return Err(StratabaseError::NonPrimitiveKind(kind.to_string()));
            }
        }
        if self.schema.contains(&descriptor.name) {
            return Err(StratabaseError::DuplicateField {
                fragment: self.name,
                field: descriptor.name,
            });
        }
        self.schema.push_field(descriptor);
        Ok(self)
    }

    /// Mark the fragment's schema as retaining unknown keys verbatim during
    /// deserialization (the opaque-passthrough contract).
    pub fn retain_unknown(mut self) -> Self {
        self.schema.set_retains_unknown(true);
        self
    }

    pub fn build(self) -> TraitFragment {
        TraitFragment {
            name: self.name,
            schema: self.schema,
        }
    }
}
