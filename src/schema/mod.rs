//! Schema declaration: field descriptors, trait fragments and their
//! composition into one effective schema per entity kind.

mod compose;
mod field;
mod fragment;

pub use compose::compose;
pub use field::{FieldDescriptor, FieldKind};
pub use fragment::{TraitFragment, TraitFragmentBuilder};

use serde::{Deserialize, Serialize};

/// An ordered set of field descriptors with unique names.
///
/// Produced by [`compose`]-ing trait fragments; field order is declaration
/// order (first fragment first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    /// When set, deserialization retains keys the schema does not declare as
    /// opaque values instead of dropping them with a warning.
    #[serde(default)]
    retains_unknown: bool,
}

impl Schema {
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn retains_unknown(&self) -> bool {
        self.retains_unknown
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub(crate) fn push_field(&mut self, field: FieldDescriptor) {
        debug_assert!(!self.contains(&field.name));
        self.fields.push(field);
    }

    pub(crate) fn replace_field(&mut self, index: usize, field: FieldDescriptor) {
        self.fields[index] = field;
    }

    pub(crate) fn set_retains_unknown(&mut self, retain: bool) {
        self.retains_unknown = retain;
    }
}
